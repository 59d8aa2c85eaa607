//! Marketplace contract calls.
//!
//! Builds unsigned envelopes for the state-changing calls (`create_prompt`,
//! `approve`) and runs `get_next_token` as a read-only simulation.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::blockchain::rpc::RpcClient;
use crate::blockchain::types::{BlockchainError, BlockchainResult, NetworkId, TransactionEnvelope};

/// A single contract method call, as carried inside an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invocation {
    pub contract_id: String,
    pub method: String,
    /// Account the call is made from.
    pub source: String,
    pub args: Value,
}

/// Arguments of `create_prompt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePromptArgs {
    pub creator: String,
    pub image_url: String,
    pub description: String,
    pub title: String,
    pub category: String,
    pub price: u128,
}

/// Arguments of `approve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveArgs {
    pub approver: String,
    pub approved: String,
    pub token_id: u32,
    pub live_until_ledger: u32,
}

/// Builds envelopes for marketplace calls and answers read-only queries.
pub trait ContractClient: Send + Sync {
    fn build_create_prompt(
        &self,
        args: &CreatePromptArgs,
    ) -> impl Future<Output = BlockchainResult<TransactionEnvelope>> + Send;

    fn build_approve(
        &self,
        args: &ApproveArgs,
    ) -> impl Future<Output = BlockchainResult<TransactionEnvelope>> + Send;

    /// Id the next mint will receive.
    fn next_token(&self) -> impl Future<Output = BlockchainResult<u32>> + Send;

    /// Contract id, used as the approved spender.
    fn contract_id(&self) -> &str;
}

impl<T: ContractClient> ContractClient for &T {
    fn build_create_prompt(
        &self,
        args: &CreatePromptArgs,
    ) -> impl Future<Output = BlockchainResult<TransactionEnvelope>> + Send {
        (**self).build_create_prompt(args)
    }

    fn build_approve(
        &self,
        args: &ApproveArgs,
    ) -> impl Future<Output = BlockchainResult<TransactionEnvelope>> + Send {
        (**self).build_approve(args)
    }

    fn next_token(&self) -> impl Future<Output = BlockchainResult<u32>> + Send {
        (**self).next_token()
    }

    fn contract_id(&self) -> &str {
        (**self).contract_id()
    }
}

/// The deployed marketplace contract, reached through one RPC endpoint.
#[derive(Debug, Clone)]
pub struct PromptHashContract {
    rpc: Arc<RpcClient>,
    contract_id: String,
    network: NetworkId,
}

impl PromptHashContract {
    pub fn new(rpc: Arc<RpcClient>, contract_id: impl Into<String>, network: NetworkId) -> Self {
        Self {
            rpc,
            contract_id: contract_id.into(),
            network,
        }
    }

    fn invocation(&self, method: &str, source: &str, args: Value) -> Invocation {
        Invocation {
            contract_id: self.contract_id.clone(),
            method: method.to_string(),
            source: source.to_string(),
            args,
        }
    }

    fn envelope(&self, invocation: &Invocation) -> BlockchainResult<TransactionEnvelope> {
        TransactionEnvelope::encode(invocation, self.network.clone())
    }
}

impl ContractClient for PromptHashContract {
    async fn build_create_prompt(
        &self,
        args: &CreatePromptArgs,
    ) -> BlockchainResult<TransactionEnvelope> {
        // u128 travels as a decimal string
        let invocation = self.invocation(
            "create_prompt",
            &args.creator,
            json!({
                "creator": args.creator,
                "image_url": args.image_url,
                "description": args.description,
                "title": args.title,
                "category": args.category,
                "price": args.price.to_string(),
            }),
        );
        self.envelope(&invocation)
    }

    async fn build_approve(&self, args: &ApproveArgs) -> BlockchainResult<TransactionEnvelope> {
        let invocation = self.invocation(
            "approve",
            &args.approver,
            json!({
                "approver": args.approver,
                "approved": args.approved,
                "token_id": args.token_id,
                "live_until_ledger": args.live_until_ledger,
            }),
        );
        self.envelope(&invocation)
    }

    async fn next_token(&self) -> BlockchainResult<u32> {
        let invocation = self.invocation("get_next_token", &self.contract_id, json!({}));
        let reply = self.rpc.simulate(&self.envelope(&invocation)?).await?;

        if let Some(error) = reply.error {
            return Err(BlockchainError::InvalidResponse(format!(
                "get_next_token simulation failed: {}",
                error
            )));
        }

        let retval = reply
            .results
            .first()
            .map(|r| &r.retval)
            .ok_or_else(|| BlockchainError::InvalidResponse("get_next_token: no results".into()))?;

        parse_token_id(retval)
    }

    fn contract_id(&self) -> &str {
        &self.contract_id
    }
}

/// Read a token id from a JSON number or decimal string.
pub fn parse_token_id(value: &Value) -> BlockchainResult<u32> {
    let wide = match value {
        Value::Number(n) => n.as_u64().map(u128::from),
        Value::String(s) => s.trim().parse::<u128>().ok(),
        _ => None,
    }
    .ok_or_else(|| BlockchainError::InvalidResponse(format!("not a token id: {}", value)))?;

    u32::try_from(wide)
        .map_err(|_| BlockchainError::InvalidResponse(format!("token id {} exceeds u32", wide)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn contract(uri: &str) -> PromptHashContract {
        let rpc = Arc::new(RpcClient::new(uri, None).unwrap());
        PromptHashContract::new(rpc, "CCONTRACT", NetworkId::from("testnet"))
    }

    #[tokio::test]
    async fn test_create_prompt_envelope() {
        let contract = contract("http://localhost:8000/rpc");
        let envelope = contract
            .build_create_prompt(&CreatePromptArgs {
                creator: "GCREATOR".into(),
                image_url: "https://img".into(),
                description: "a long description".into(),
                title: "Title".into(),
                category: "Music".into(),
                price: 340_282_366_920_938_463_463_374_607_431_768_211_455,
            })
            .await
            .unwrap();

        let invocation: Invocation = envelope.decode().unwrap();
        assert_eq!(envelope.network, NetworkId::from("testnet"));
        assert_eq!(invocation.method, "create_prompt");
        assert_eq!(invocation.source, "GCREATOR");
        assert_eq!(invocation.args["category"], "Music");
        assert_eq!(invocation.args["price"], u128::MAX.to_string());
    }

    #[tokio::test]
    async fn test_approve_envelope() {
        let contract = contract("http://localhost:8000/rpc");
        let envelope = contract
            .build_approve(&ApproveArgs {
                approver: "GOWNER".into(),
                approved: "CCONTRACT".into(),
                token_id: 4,
                live_until_ledger: 9999,
            })
            .await
            .unwrap();

        let invocation: Invocation = envelope.decode().unwrap();
        assert_eq!(invocation.method, "approve");
        assert_eq!(invocation.args["token_id"], 4);
        assert_eq!(invocation.args["live_until_ledger"], 9999);
    }

    #[tokio::test]
    async fn test_next_token_via_simulation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "simulateTransaction"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"jsonrpc": "2.0", "id": 1, "result": {"results": [{"retval": "12"}]}}),
            ))
            .mount(&server)
            .await;

        assert_eq!(contract(&server.uri()).next_token().await.unwrap(), 12);
    }

    #[tokio::test]
    async fn test_next_token_simulation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"jsonrpc": "2.0", "id": 1, "result": {"error": "HostError"}}),
            ))
            .mount(&server)
            .await;

        let err = contract(&server.uri()).next_token().await.unwrap_err();
        assert!(err.to_string().contains("HostError"));
    }

    #[test]
    fn test_parse_token_id() {
        assert_eq!(parse_token_id(&json!(3)).unwrap(), 3);
        assert_eq!(parse_token_id(&json!(" 9 ")).unwrap(), 9);
        assert!(parse_token_id(&json!(-1)).is_err());
        assert!(parse_token_id(&json!("5000000000")).is_err());
        assert!(parse_token_id(&json!(null)).is_err());
    }
}
