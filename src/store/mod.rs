//! User and prompt storage.

pub mod memory;
pub mod types;

pub use memory::{MarketStore, StoreError};
pub use types::{NewPrompt, OwnerSummary, Prompt, PromptQuery, PromptView, Registration, User};
