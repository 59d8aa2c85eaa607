//! Listing workflow: form validation, then create-and-approve on chain.
//!
//! # Data Flow
//! ```text
//! ListingForm ─validate─▶ ListingDraft
//!     → ListingWorkflow (create_prompt round, resolve token id, approve round)
//!     → SubmitOutcome (redirect to /browse, or failure)
//! ```

pub mod form;
pub mod listing;
pub mod saga;

pub use form::{submit_listing, FieldErrors, ListingForm, SubmitOutcome, BROWSE_ROUTE};
pub use listing::{
    ListingDraft, ListingReceipt, ListingWorkflow, TransitionObserver, WorkflowError,
    WorkflowSettings,
};
pub use saga::{CompletedStep, Compensator, NoCompensation, Phase, SagaStep};
