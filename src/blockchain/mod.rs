//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Listing request
//!     → contract.rs (build unsigned envelope for a contract call)
//!     → wallet.rs (session signs for the connected address)
//!     → rpc.rs (send once, poll status to SUCCESS / FAILED / NOT_FOUND)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data

pub mod contract;
pub mod rpc;
pub mod types;
pub mod wallet;

pub use contract::{ApproveArgs, ContractClient, CreatePromptArgs, PromptHashContract};
pub use rpc::{PendingSubmission, RpcClient};
pub use types::{
    BlockchainConfig, BlockchainError, BlockchainResult, NetworkId, SignedEnvelope,
    SubmissionResult, TransactionEnvelope,
};
pub use wallet::{LocalSigner, WalletSession, WalletSigner};
