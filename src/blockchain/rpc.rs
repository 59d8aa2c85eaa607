//! JSON-RPC submission and confirmation client.
//!
//! # Responsibilities
//! - Send signed envelopes (`sendTransaction`)
//! - Poll transaction status (`getTransaction`) on a fixed schedule
//! - Run read-only contract calls (`simulateTransaction`)
//!
//! A submission is sent exactly once. Anything other than a PENDING reply
//! fails immediately without polling. There is no idempotency key: sending
//! the same logical operation twice produces two unrelated transactions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::blockchain::types::{
    BlockchainError, BlockchainResult, SendStatus, SendTransactionReply, SignedEnvelope,
    SubmissionResult, TransactionEnvelope, TransactionStatus, TransactionStatusReply,
};
use crate::resilience::poll::{poll_until, PollOutcome, PollPolicy};

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, T> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: T,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    message: String,
}

/// A transaction the endpoint accepted as PENDING.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    pub hash: String,
}

/// `simulateTransaction` result.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationReply {
    #[serde(default)]
    pub results: Vec<SimulationResult>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationResult {
    #[serde(default)]
    pub retval: serde_json::Value,
}

/// JSON-RPC client for one network endpoint.
#[derive(Debug)]
pub struct RpcClient {
    client: Client,
    endpoint: Url,
    timeout_secs: Option<u64>,
    request_id: AtomicU64,
}

impl RpcClient {
    /// Create a client for `endpoint`. `timeout_secs` bounds each individual
    /// call; `None` leaves calls unbounded.
    pub fn new(endpoint: &str, timeout_secs: Option<u64>) -> BlockchainResult<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", endpoint, e))
        })?;

        let mut builder = Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| BlockchainError::Rpc(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            timeout_secs,
            request_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn next_request_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::SeqCst)
    }

    async fn call<P, R>(&self, method: &str, params: P) -> BlockchainResult<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_request_id(),
            method,
            params,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(BlockchainError::Rpc(format!(
                "{} returned HTTP {}",
                method,
                response.status()
            )));
        }

        let body: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| BlockchainError::InvalidResponse(format!("{}: {}", method, e)))?;

        if let Some(error) = body.error {
            return Err(BlockchainError::JsonRpc {
                code: error.code,
                message: error.message,
            });
        }

        body.result
            .ok_or_else(|| BlockchainError::InvalidResponse(format!("{}: missing result", method)))
    }

    fn transport_error(&self, e: reqwest::Error) -> BlockchainError {
        match (e.is_timeout(), self.timeout_secs) {
            (true, Some(secs)) => BlockchainError::Timeout(secs),
            _ => BlockchainError::Rpc(e.to_string()),
        }
    }

    /// Raw `sendTransaction`.
    pub async fn send_transaction(
        &self,
        envelope: &SignedEnvelope,
    ) -> BlockchainResult<SendTransactionReply> {
        let transaction = envelope.to_wire()?;
        self.call("sendTransaction", json!({ "transaction": transaction }))
            .await
    }

    /// Raw `getTransaction`.
    pub async fn get_transaction(&self, hash: &str) -> BlockchainResult<TransactionStatusReply> {
        self.call("getTransaction", json!({ "hash": hash })).await
    }

    /// Raw `simulateTransaction` for read-only calls.
    pub async fn simulate(&self, envelope: &TransactionEnvelope) -> BlockchainResult<SimulationReply> {
        self.call("simulateTransaction", json!({ "transaction": envelope.payload }))
            .await
    }

    /// Send once and require a PENDING reply.
    pub async fn submit(&self, envelope: &SignedEnvelope) -> BlockchainResult<PendingSubmission> {
        let reply = self.send_transaction(envelope).await?;
        if reply.status != SendStatus::Pending {
            tracing::error!(
                hash = %reply.hash,
                status = %reply.status,
                "Submission not accepted"
            );
            return Err(BlockchainError::Rejected {
                status: reply.status,
                hash: reply.hash,
                detail: reply.error_result_xdr,
            });
        }

        tracing::debug!(hash = %reply.hash, "Submission pending");
        Ok(PendingSubmission { hash: reply.hash })
    }

    /// Poll `hash` until SUCCESS or FAILED, or until the policy runs out.
    pub async fn confirm(
        &self,
        hash: &str,
        policy: &PollPolicy,
    ) -> BlockchainResult<SubmissionResult> {
        let outcome = poll_until(
            policy,
            move |attempt| async move {
                let reply = self.get_transaction(hash).await?;
                tracing::debug!(hash = %hash, attempt, status = ?reply.status, "Polled transaction");
                Ok::<_, BlockchainError>(reply)
            },
            |reply| reply.status.is_settled(),
        )
        .await?;

        let attempts = outcome.attempts();
        let reply = match outcome {
            PollOutcome::Settled { value, .. } => value,
            PollOutcome::Exhausted { .. } => {
                tracing::error!(hash = %hash, attempts, "Transaction not found or dropped by network");
                return Err(BlockchainError::NotFound {
                    hash: hash.to_string(),
                    attempts,
                });
            }
        };

        match reply.status {
            TransactionStatus::Success => {
                tracing::info!(hash = %hash, attempts, "Transaction succeeded");
                Ok(SubmissionResult {
                    hash: hash.to_string(),
                    result: reply.result_xdr,
                    return_value: reply.return_value,
                    ledger: reply.ledger,
                    poll_attempts: attempts,
                })
            }
            _ => {
                let result = reply.result_xdr.unwrap_or_default();
                tracing::error!(hash = %hash, result = %result, "Transaction failed");
                Err(BlockchainError::TransactionFailed {
                    hash: hash.to_string(),
                    result,
                })
            }
        }
    }

    /// Send once, then poll to a terminal outcome.
    pub async fn submit_and_confirm(
        &self,
        envelope: &SignedEnvelope,
        policy: &PollPolicy,
    ) -> BlockchainResult<SubmissionResult> {
        let pending = self.submit(envelope).await?;
        self.confirm(&pending.hash, policy).await
    }
}
