//! Wallet signing and the per-process wallet session.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized

use std::future::Future;

use alloy::hex;
use alloy::primitives::keccak256;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;

use crate::blockchain::types::{
    BlockchainError, BlockchainResult, NetworkId, SignedEnvelope, TransactionEnvelope,
};

/// Environment variable name for the local signing key.
pub const SIGNER_KEY_ENV_VAR: &str = "PROMPTHASH_SIGNER_KEY";

/// Anything that can turn an unsigned envelope into a signed one.
///
/// Implementations may fail, e.g. when the user rejects the request.
pub trait WalletSigner: Send + Sync {
    fn sign(
        &self,
        envelope: &TransactionEnvelope,
        address: &str,
    ) -> impl Future<Output = BlockchainResult<SignedEnvelope>> + Send;
}

/// Signer backed by a secp256k1 key held in memory.
#[derive(Debug, Clone)]
pub struct LocalSigner {
    signer: PrivateKeySigner,
}

impl LocalSigner {
    /// Create a signer from a hex-encoded private key (with or without 0x).
    pub fn from_private_key(private_key_hex: &str) -> BlockchainResult<Self> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| BlockchainError::Wallet(format!("Invalid private key format: {}", e)))?;

        tracing::info!(address = %signer.address(), "Local signer initialized");
        Ok(Self { signer })
    }

    /// Load the key from `PROMPTHASH_SIGNER_KEY`.
    pub fn from_env() -> BlockchainResult<Self> {
        let private_key = std::env::var(SIGNER_KEY_ENV_VAR).map_err(|_| {
            BlockchainError::Wallet(format!("Environment variable {} not set", SIGNER_KEY_ENV_VAR))
        })?;
        Self::from_private_key(&private_key)
    }

    /// Checksummed address controlled by this key.
    pub fn address(&self) -> String {
        self.signer.address().to_checksum(None)
    }
}

impl WalletSigner for LocalSigner {
    async fn sign(
        &self,
        envelope: &TransactionEnvelope,
        address: &str,
    ) -> BlockchainResult<SignedEnvelope> {
        let own = self.address();
        if !own.eq_ignore_ascii_case(address) {
            return Err(BlockchainError::Wallet(format!(
                "Signer controls {} but was asked to sign for {}",
                own, address
            )));
        }

        let mut message = envelope.network.as_str().as_bytes().to_vec();
        message.extend_from_slice(&envelope.payload_bytes()?);
        let digest = keccak256(&message);

        let signature = self
            .signer
            .sign_hash(&digest)
            .await
            .map_err(|e| BlockchainError::Wallet(format!("Signing failed: {}", e)))?;

        Ok(SignedEnvelope {
            payload: envelope.payload.clone(),
            network: envelope.network.clone(),
            signer: own,
            signature: hex::encode(signature.as_bytes()),
        })
    }
}

/// Wallet access for one process: the connected address, the signer and
/// the network every envelope must target.
///
/// Built once at startup and passed by reference to whatever needs it.
#[derive(Debug, Clone)]
pub struct WalletSession<S> {
    address: Option<String>,
    signer: S,
    network: NetworkId,
}

impl<S: WalletSigner> WalletSession<S> {
    /// A session with no connected address yet.
    pub fn new(signer: S, network: NetworkId) -> Self {
        Self {
            address: None,
            signer,
            network,
        }
    }

    /// A session already connected to `address`.
    pub fn connected(signer: S, network: NetworkId, address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            signer,
            network,
        }
    }

    pub fn connect(&mut self, address: impl Into<String>) {
        self.address = Some(address.into());
    }

    pub fn disconnect(&mut self) {
        self.address = None;
    }

    /// Connected address; blank addresses count as not connected.
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref().filter(|a| !a.trim().is_empty())
    }

    pub fn network(&self) -> &NetworkId {
        &self.network
    }

    /// Sign `envelope` for the connected address.
    pub async fn sign(&self, envelope: &TransactionEnvelope) -> BlockchainResult<SignedEnvelope> {
        let address = self
            .address()
            .ok_or_else(|| BlockchainError::Wallet("No wallet connected".to_string()))?;

        if envelope.network != self.network {
            return Err(BlockchainError::Wallet(format!(
                "Envelope targets '{}' but the session is on '{}'",
                envelope.network, self.network
            )));
        }

        self.signer.sign(envelope, address).await
    }
}
