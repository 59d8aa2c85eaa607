//! Upstream AI services: the prompt-improvement gateway and the chat LLM.

pub mod chat;
pub mod improve;
pub mod sse;

use thiserror::Error;

pub use chat::{ChatMessage, LlmClient};
pub use improve::{ImproveClient, ImproveReply};

#[derive(Debug, Error)]
pub enum AiError {
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("could not decode upstream reply: {0}")]
    Decode(String),

    #[error("{0}")]
    Stream(String),

    #[error("API key not set (environment variable {0})")]
    MissingApiKey(String),

    #[error("invalid upstream url: {0}")]
    InvalidUrl(String),
}
