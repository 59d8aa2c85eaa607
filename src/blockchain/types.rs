//! Envelope, status and error definitions.

use alloy::hex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

// Re-export BlockchainConfig from config module to avoid duplication
pub use crate::config::schema::BlockchainConfig;

/// Network passphrase for strong typing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(pub String);

impl NetworkId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NetworkId {
    fn from(passphrase: &str) -> Self {
        Self(passphrase.to_string())
    }
}

impl std::fmt::Display for NetworkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The endpoint answered with a JSON-RPC error object.
    #[error("JSON-RPC error code {code}: {message}")]
    JsonRpc { code: i64, message: String },

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// The endpoint answered with something we cannot interpret.
    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),

    /// The immediate reply to a submission was not PENDING.
    #[error("Transaction rejected on submission with status {status}: {}", detail.as_deref().unwrap_or("no detail"))]
    Rejected {
        status: SendStatus,
        hash: String,
        detail: Option<String>,
    },

    /// The transaction was included but failed.
    #[error("Transaction failed: {result}")]
    TransactionFailed { hash: String, result: String },

    /// The transaction never showed up before polls ran out.
    #[error("Transaction not found or dropped by network ({hash}, {attempts} polls)")]
    NotFound { hash: String, attempts: u32 },

    /// Key loading or signer/address mismatch.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// The wallet declined to sign.
    #[error("Signing rejected: {0}")]
    SigningRejected(String),

    /// Envelope or argument encoding failed.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Blockchain client not configured.
    #[error("Blockchain not available: {0}")]
    NotAvailable(String),
}

impl From<serde_json::Error> for BlockchainError {
    fn from(e: serde_json::Error) -> Self {
        BlockchainError::Encoding(e.to_string())
    }
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Unsigned, serialized transaction data bound to a network.
///
/// Single use: it is signed once, submitted once, then dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEnvelope {
    /// Hex-encoded payload.
    pub payload: String,
    pub network: NetworkId,
}

impl TransactionEnvelope {
    /// Serialize `body` as JSON and hex-encode it.
    pub fn encode<T: Serialize>(body: &T, network: NetworkId) -> BlockchainResult<Self> {
        let bytes = serde_json::to_vec(body)?;
        Ok(Self {
            payload: hex::encode(bytes),
            network,
        })
    }

    /// Inverse of [`TransactionEnvelope::encode`].
    pub fn decode<T: DeserializeOwned>(&self) -> BlockchainResult<T> {
        let bytes = hex::decode(&self.payload)
            .map_err(|e| BlockchainError::Encoding(format!("payload is not hex: {}", e)))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Raw payload bytes (what a signer commits to).
    pub fn payload_bytes(&self) -> BlockchainResult<Vec<u8>> {
        hex::decode(&self.payload)
            .map_err(|e| BlockchainError::Encoding(format!("payload is not hex: {}", e)))
    }
}

/// An envelope plus the signer's signature over it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEnvelope {
    pub payload: String,
    pub network: NetworkId,
    /// Address the signature belongs to.
    pub signer: String,
    /// Hex-encoded signature.
    pub signature: String,
}

impl SignedEnvelope {
    /// The string sent as the `transaction` parameter.
    pub fn to_wire(&self) -> BlockchainResult<String> {
        Ok(hex::encode(serde_json::to_vec(self)?))
    }

    /// Inverse of [`SignedEnvelope::to_wire`].
    pub fn from_wire(wire: &str) -> BlockchainResult<Self> {
        let bytes = hex::decode(wire)
            .map_err(|e| BlockchainError::Encoding(format!("transaction is not hex: {}", e)))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// The unsigned envelope this signature covers.
    pub fn unsigned(&self) -> TransactionEnvelope {
        TransactionEnvelope {
            payload: self.payload.clone(),
            network: self.network.clone(),
        }
    }
}

/// Immediate reply status of `sendTransaction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SendStatus {
    Pending,
    Duplicate,
    TryAgainLater,
    Error,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for SendStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SendStatus::Pending => "PENDING",
            SendStatus::Duplicate => "DUPLICATE",
            SendStatus::TryAgainLater => "TRY_AGAIN_LATER",
            SendStatus::Error => "ERROR",
            SendStatus::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// `sendTransaction` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionReply {
    pub status: SendStatus,
    pub hash: String,
    #[serde(default)]
    pub error_result_xdr: Option<String>,
    #[serde(default)]
    pub latest_ledger: Option<u64>,
}

/// Status reported by `getTransaction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Success,
    Failed,
    NotFound,
    #[serde(other)]
    Unknown,
}

impl TransactionStatus {
    /// SUCCESS and FAILED end a poll loop early. NOT_FOUND only ends it once
    /// attempts are exhausted.
    pub fn is_settled(self) -> bool {
        matches!(self, TransactionStatus::Success | TransactionStatus::Failed)
    }
}

/// `getTransaction` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatusReply {
    pub status: TransactionStatus,
    #[serde(default)]
    pub result_xdr: Option<String>,
    /// Decoded contract return value, when the endpoint provides one.
    #[serde(default)]
    pub return_value: Option<serde_json::Value>,
    #[serde(default)]
    pub ledger: Option<u64>,
}

/// A submission that reached SUCCESS.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionResult {
    pub hash: String,
    pub result: Option<String>,
    pub return_value: Option<serde_json::Value>,
    pub ledger: Option<u64>,
    /// Status polls it took to settle.
    pub poll_attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_encoding_is_hex_json() {
        let envelope =
            TransactionEnvelope::encode(&json!({"method": "approve"}), NetworkId::from("net")).unwrap();
        assert!(envelope.payload.chars().all(|c| c.is_ascii_hexdigit()));
        let body: serde_json::Value = envelope.decode().unwrap();
        assert_eq!(body["method"], "approve");
    }

    #[test]
    fn test_decode_rejects_non_hex() {
        let envelope = TransactionEnvelope {
            payload: "zz".to_string(),
            network: NetworkId::from("net"),
        };
        assert!(matches!(
            envelope.decode::<serde_json::Value>(),
            Err(BlockchainError::Encoding(_))
        ));
    }

    #[test]
    fn test_send_reply_parses_unknown_status() {
        let reply: SendTransactionReply =
            serde_json::from_value(json!({"status": "SOMETHING_NEW", "hash": "ab"})).unwrap();
        assert_eq!(reply.status, SendStatus::Unknown);

        let reply: SendTransactionReply = serde_json::from_value(
            json!({"status": "TRY_AGAIN_LATER", "hash": "ab", "latestLedger": 12}),
        )
        .unwrap();
        assert_eq!(reply.status, SendStatus::TryAgainLater);
        assert_eq!(reply.latest_ledger, Some(12));
    }

    #[test]
    fn test_status_settlement() {
        assert!(TransactionStatus::Success.is_settled());
        assert!(TransactionStatus::Failed.is_settled());
        assert!(!TransactionStatus::NotFound.is_settled());
        assert!(!TransactionStatus::Unknown.is_settled());
    }

    #[test]
    fn test_error_display() {
        let err = BlockchainError::TransactionFailed {
            hash: "ab".into(),
            result: "AAAAxdr".into(),
        };
        assert_eq!(err.to_string(), "Transaction failed: AAAAxdr");

        let err = BlockchainError::Rejected {
            status: SendStatus::Error,
            hash: "ab".into(),
            detail: None,
        };
        assert!(err.to_string().contains("ERROR"));
    }
}
