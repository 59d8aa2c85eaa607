//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request id assigned and echoed)
//!     → handlers: users.rs, prompts.rs, improve.rs, chat.rs
//!     → response.rs (errors mapped to JSON bodies)
//!     → Send to client
//! ```

pub mod chat;
pub mod improve;
pub mod middleware;
pub mod prompts;
pub mod request;
pub mod response;
pub mod server;
pub mod users;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::ApiError;
pub use server::{AppState, HttpServer};
