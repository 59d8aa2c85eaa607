//! Typed client for the PromptHash marketplace API.

pub mod client;

pub use client::{
    ChatReply, ChatTurn, CreatePromptRequest, CreatedPrompt, OwnerRecord, PromptHashClient,
    PromptRecord, RawResponse, Registration, SdkError, UserRecord,
};
