//! Two-step listing saga and its compensation hook.
//!
//! The create step and the approve step are independent on-chain
//! transactions. When approve fails after create confirmed, the listing
//! stays minted but unapproved; the [`Compensator`] is where an undo would
//! go. The default one only reports the gap.

use std::fmt;
use std::future::Future;

use crate::blockchain::SubmissionResult;

/// One on-chain round of the listing workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SagaStep {
    CreatePrompt,
    ApproveTransfer,
}

impl SagaStep {
    /// Metric/log label.
    pub fn label(self) -> &'static str {
        match self {
            SagaStep::CreatePrompt => "create_prompt",
            SagaStep::ApproveTransfer => "approve",
        }
    }
}

impl fmt::Display for SagaStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Phases each step moves through, in order.
///
/// `Idle → Building → Signing → Submitting → Polling → {Succeeded | Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    Building,
    Signing,
    Submitting,
    Polling,
    Succeeded,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::Building => "building",
            Phase::Signing => "signing",
            Phase::Submitting => "submitting",
            Phase::Polling => "polling",
            Phase::Succeeded => "succeeded",
            Phase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A step that reached SUCCESS.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedStep {
    pub step: SagaStep,
    pub result: SubmissionResult,
}

/// Undo hook run when a later step fails after earlier ones confirmed.
pub trait Compensator: Send + Sync {
    fn compensate(
        &self,
        failed: SagaStep,
        completed: &[CompletedStep],
    ) -> impl Future<Output = ()> + Send;
}

/// Leaves confirmed steps in place and logs what was left behind.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCompensation;

impl Compensator for NoCompensation {
    async fn compensate(&self, failed: SagaStep, completed: &[CompletedStep]) {
        if completed.is_empty() {
            return;
        }
        let hashes: Vec<&str> = completed.iter().map(|c| c.result.hash.as_str()).collect();
        tracing::warn!(
            failed_step = %failed,
            confirmed = ?hashes,
            "Listing left partially applied; no compensating action configured"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(SagaStep::CreatePrompt.to_string(), "create_prompt");
        assert_eq!(SagaStep::ApproveTransfer.to_string(), "approve");
        assert_eq!(Phase::Polling.to_string(), "polling");
    }

    #[tokio::test]
    async fn test_no_compensation_accepts_any_history() {
        let completed = vec![CompletedStep {
            step: SagaStep::CreatePrompt,
            result: SubmissionResult {
                hash: "abc".into(),
                result: None,
                return_value: None,
                ledger: None,
                poll_attempts: 1,
            },
        }];
        NoCompensation.compensate(SagaStep::ApproveTransfer, &completed).await;
        NoCompensation.compensate(SagaStep::CreatePrompt, &[]).await;
    }
}
