//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Submitted transaction:
//!     → poll.rs (fixed interval, bounded attempts, terminal-status predicate)
//!     → settled value or the last observation once attempts run out
//! ```
//!
//! # Design Decisions
//! - Constant delay only; no backoff and no jitter
//! - No cancellation: a started loop runs to a terminal value, an error, or exhaustion
//! - The loop knows nothing about transactions; callers supply fetch and predicate

pub mod poll;

pub use poll::{poll_until, PollOutcome, PollPolicy};
