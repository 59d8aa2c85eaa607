//! Create-then-approve orchestration for one listing.
//!
//! Both steps run the same build → sign → submit → poll sequence, one after
//! the other, with nothing shared between them except the minted token id.
//! Any failure aborts the workflow; confirmed steps are handed to the
//! [`Compensator`] and otherwise left in place.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;

use crate::blockchain::contract::parse_token_id;
use crate::blockchain::{
    ApproveArgs, BlockchainConfig, BlockchainError, ContractClient, CreatePromptArgs, RpcClient,
    SubmissionResult, TransactionEnvelope, WalletSession, WalletSigner,
};
use crate::observability::metrics;
use crate::resilience::PollPolicy;
use crate::workflow::saga::{CompletedStep, Compensator, NoCompensation, Phase, SagaStep};

/// Validated listing input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDraft {
    pub image_url: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: u128,
}

/// Timing knobs of the workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSettings {
    pub poll: PollPolicy,
    /// Wait between signing and submitting the create step.
    pub settle_delay: Duration,
    pub live_until_ledger: u32,
}

impl WorkflowSettings {
    pub fn from_config(config: &BlockchainConfig) -> Self {
        Self {
            poll: PollPolicy::from_millis(config.poll_interval_ms, config.poll_attempts),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
            live_until_ledger: config.live_until_ledger,
        }
    }
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self::from_config(&BlockchainConfig::default())
    }
}

/// Why a listing did not complete.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("No wallet address connected")]
    MissingAddress,

    #[error("No network endpoint configured")]
    MissingEndpoint,

    #[error("{step} failed while {phase}: {source}")]
    Step {
        step: SagaStep,
        phase: Phase,
        #[source]
        source: BlockchainError,
    },

    #[error("Could not determine the minted token id: {0}")]
    TokenId(#[source] BlockchainError),
}

/// Both confirmed rounds of a completed listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingReceipt {
    pub token_id: u32,
    pub create: SubmissionResult,
    pub approve: SubmissionResult,
}

/// Callback invoked on every phase change.
pub type TransitionObserver = Arc<dyn Fn(SagaStep, Phase) + Send + Sync>;

/// The create-and-approve orchestrator.
pub struct ListingWorkflow<'s, C, S, K = NoCompensation> {
    contract: C,
    session: &'s WalletSession<S>,
    rpc: Option<Arc<RpcClient>>,
    settings: WorkflowSettings,
    compensator: K,
    observer: Option<TransitionObserver>,
}

impl<'s, C, S> ListingWorkflow<'s, C, S, NoCompensation>
where
    C: ContractClient,
    S: WalletSigner,
{
    /// `rpc` is `None` when no endpoint is configured; the workflow then
    /// fails its precondition check without touching the network.
    pub fn new(
        contract: C,
        session: &'s WalletSession<S>,
        rpc: Option<Arc<RpcClient>>,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            contract,
            session,
            rpc,
            settings,
            compensator: NoCompensation,
            observer: None,
        }
    }
}

impl<'s, C, S, K> ListingWorkflow<'s, C, S, K>
where
    C: ContractClient,
    S: WalletSigner,
    K: Compensator,
{
    /// Replace the compensation hook.
    pub fn with_compensator<K2: Compensator>(self, compensator: K2) -> ListingWorkflow<'s, C, S, K2> {
        ListingWorkflow {
            contract: self.contract,
            session: self.session,
            rpc: self.rpc,
            settings: self.settings,
            compensator,
            observer: self.observer,
        }
    }

    pub fn with_observer(mut self, observer: TransitionObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Run the workflow and flatten the outcome to success/failure.
    ///
    /// Failure detail is logged, not returned.
    pub async fn run(&self, draft: &ListingDraft) -> bool {
        match self.run_detailed(draft).await {
            Ok(receipt) => {
                tracing::info!(
                    token_id = receipt.token_id,
                    create_hash = %receipt.create.hash,
                    approve_hash = %receipt.approve.hash,
                    "Listing created and approved"
                );
                true
            }
            Err(e) => {
                tracing::error!(error = %e, title = %draft.title, "Listing workflow failed");
                false
            }
        }
    }

    /// Run the workflow and keep the structured outcome.
    pub async fn run_detailed(&self, draft: &ListingDraft) -> Result<ListingReceipt, WorkflowError> {
        let Some(address) = self.session.address() else {
            tracing::warn!("Wallet address missing; listing not attempted");
            return Err(WorkflowError::MissingAddress);
        };
        let Some(rpc) = self.rpc.as_deref() else {
            tracing::warn!("RPC endpoint missing; listing not attempted");
            return Err(WorkflowError::MissingEndpoint);
        };

        tracing::info!(
            address = %address,
            endpoint = %rpc.endpoint(),
            title = %draft.title,
            price = %draft.price,
            category = %draft.category,
            "Starting listing workflow"
        );

        let create_args = CreatePromptArgs {
            creator: address.to_string(),
            image_url: draft.image_url.clone(),
            description: draft.description.clone(),
            title: draft.title.clone(),
            category: draft.category.clone(),
            price: draft.price,
        };
        let created = self
            .run_step(
                rpc,
                SagaStep::CreatePrompt,
                self.contract.build_create_prompt(&create_args),
                Some(self.settings.settle_delay),
            )
            .await?;

        let completed = vec![CompletedStep {
            step: SagaStep::CreatePrompt,
            result: created.clone(),
        }];

        let token_id = match self.resolve_token_id(&created).await {
            Ok(id) => id,
            Err(e) => {
                self.compensator
                    .compensate(SagaStep::ApproveTransfer, &completed)
                    .await;
                return Err(e);
            }
        };

        let approve_args = ApproveArgs {
            approver: address.to_string(),
            approved: self.contract.contract_id().to_string(),
            token_id,
            live_until_ledger: self.settings.live_until_ledger,
        };
        let approved = self
            .run_step(
                rpc,
                SagaStep::ApproveTransfer,
                self.contract.build_approve(&approve_args),
                None,
            )
            .await;

        match approved {
            Ok(approve) => Ok(ListingReceipt {
                token_id,
                create: created,
                approve,
            }),
            Err(e) => {
                self.compensator
                    .compensate(SagaStep::ApproveTransfer, &completed)
                    .await;
                Err(e)
            }
        }
    }

    async fn run_step<F>(
        &self,
        rpc: &RpcClient,
        step: SagaStep,
        build: F,
        settle_delay: Option<Duration>,
    ) -> Result<SubmissionResult, WorkflowError>
    where
        F: Future<Output = Result<TransactionEnvelope, BlockchainError>>,
    {
        self.transition(step, Phase::Idle);

        self.transition(step, Phase::Building);
        let envelope = build
            .await
            .map_err(|e| self.fail(step, Phase::Building, e))?;

        self.transition(step, Phase::Signing);
        let signed = self
            .session
            .sign(&envelope)
            .await
            .map_err(|e| self.fail(step, Phase::Signing, e))?;

        if let Some(delay) = settle_delay {
            sleep(delay).await;
        }

        self.transition(step, Phase::Submitting);
        let pending = rpc
            .submit(&signed)
            .await
            .map_err(|e| self.fail(step, Phase::Submitting, e))?;

        self.transition(step, Phase::Polling);
        let result = rpc
            .confirm(&pending.hash, &self.settings.poll)
            .await
            .map_err(|e| self.fail(step, Phase::Polling, e))?;

        self.transition(step, Phase::Succeeded);
        metrics::record_submission(step.label(), "success");
        metrics::record_poll_attempts(step.label(), result.poll_attempts);
        Ok(result)
    }

    /// The id minted by `created`, read from its return value. Falls back to
    /// `get_next_token() - 1`, which assumes nothing else minted in between.
    async fn resolve_token_id(&self, created: &SubmissionResult) -> Result<u32, WorkflowError> {
        if let Some(value) = &created.return_value {
            match parse_token_id(value) {
                Ok(id) => return Ok(id),
                Err(e) => tracing::warn!(error = %e, "Create result has an unreadable token id"),
            }
        }

        tracing::warn!(
            hash = %created.hash,
            "Create result carries no token id; assuming sequential allocation"
        );
        let next = self
            .contract
            .next_token()
            .await
            .map_err(WorkflowError::TokenId)?;
        next.checked_sub(1).ok_or_else(|| {
            WorkflowError::TokenId(BlockchainError::InvalidResponse(
                "next token is 0, nothing has been minted".to_string(),
            ))
        })
    }

    fn transition(&self, step: SagaStep, phase: Phase) {
        tracing::debug!(step = %step, phase = %phase, "Listing step transition");
        if let Some(observer) = &self.observer {
            observer(step, phase);
        }
    }

    fn fail(&self, step: SagaStep, phase: Phase, source: BlockchainError) -> WorkflowError {
        tracing::error!(step = %step, phase = %phase, error = %source, "Listing step failed");
        self.transition(step, Phase::Failed);
        metrics::record_submission(step.label(), outcome_label(&source));
        WorkflowError::Step { step, phase, source }
    }
}

fn outcome_label(error: &BlockchainError) -> &'static str {
    match error {
        BlockchainError::Rejected { .. } => "rejected",
        BlockchainError::TransactionFailed { .. } => "failed",
        BlockchainError::NotFound { .. } => "not_found",
        BlockchainError::Wallet(_) | BlockchainError::SigningRejected(_) => "signing_error",
        _ => "error",
    }
}
