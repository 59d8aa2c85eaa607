//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → MarketConfig (validated, immutable)
//!     → cloned into the server state and the listing workflow
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Secrets (LLM key, signer key) come from the environment, never the file

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    BlockchainConfig, ImproveConfig, ListenerConfig, LlmConfig, MarketConfig,
    ObservabilityConfig, StoreConfig,
};
