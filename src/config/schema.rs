//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the marketplace.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the marketplace backend and listing workflow.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MarketConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub security: SecurityConfig,

    /// Prompt improvement upstream.
    pub improve: ImproveConfig,

    /// Chat completion upstream.
    pub llm: LlmConfig,

    /// User/prompt store settings.
    pub store: StoreConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Network endpoint and poll schedule for on-chain listings.
    pub blockchain: BlockchainConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 120 }
    }
}

/// Request hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Upstream prompt improvement service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ImproveConfig {
    /// Base URL; requests go to `<base_url>/api/improve-prompt`.
    pub base_url: String,

    /// Upstream request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ImproveConfig {
    fn default() -> Self {
        Self {
            base_url: "https://secret-ai-gateway.onrender.com".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Chat completion provider (OpenAI-compatible).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL; requests go to `<base_url>/chat/completions`.
    pub base_url: String,

    /// Model identifier sent with every request.
    pub model: String,

    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

/// Store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON snapshot loaded at startup and written at shutdown.
    pub persistence_path: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Testnet passphrase used when none is configured.
pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";

/// Marketplace contract the listings are minted on.
pub const DEFAULT_CONTRACT_ID: &str = "CBUOTP3OC5QQFWMEZ72G3ODJ2MFL6NBNHVHVREDOO4JL5NAS32NZ42YK";

/// Blockchain integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// JSON-RPC endpoint URL. Empty means no endpoint is configured.
    pub rpc_url: String,

    /// Network passphrase the envelopes are signed for.
    pub network_passphrase: String,

    /// Marketplace contract id; also the spender approved for transfers.
    pub contract_id: String,

    /// Per-call RPC timeout in seconds. `None` leaves calls unbounded.
    pub rpc_timeout_secs: Option<u64>,

    /// Delay between transaction status polls in milliseconds.
    pub poll_interval_ms: u64,

    /// Maximum number of status polls per submission.
    pub poll_attempts: u32,

    /// Delay between signing and submitting the create step in milliseconds.
    pub settle_delay_ms: u64,

    /// Ledger until which an approval stays live.
    pub live_until_ledger: u32,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8000/rpc".to_string(),
            network_passphrase: TESTNET_PASSPHRASE.to_string(),
            contract_id: DEFAULT_CONTRACT_ID.to_string(),
            rpc_timeout_secs: None,
            poll_interval_ms: 500,
            poll_attempts: 5,
            settle_delay_ms: 3000,
            live_until_ledger: 9999,
        }
    }
}

impl BlockchainConfig {
    /// The configured endpoint, if any.
    pub fn endpoint(&self) -> Option<&str> {
        let url = self.rpc_url.trim();
        (!url.is_empty()).then_some(url)
    }
}
