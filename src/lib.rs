//! PromptHash marketplace backend library.

pub mod ai;
pub mod blockchain;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod store;
pub mod workflow;

pub use config::schema::MarketConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use store::MarketStore;
pub use workflow::{ListingForm, ListingWorkflow, SubmitOutcome};
