//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::net::TcpListener;
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use prompthash::ai::LlmClient;
use prompthash::config::MarketConfig;
use prompthash::http::{AppState, HttpServer};
use prompthash::lifecycle::Shutdown;
use prompthash::MarketStore;

/// A server bound to an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub store: MarketStore,
    pub shutdown: Shutdown,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Trigger shutdown and wait for the server task to finish.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
    }
}

/// Config pointing the improve gateway and the LLM at `upstream`.
pub fn config_with_upstream(upstream: &str) -> MarketConfig {
    let mut config = MarketConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.improve.base_url = upstream.to_string();
    config.improve.timeout_secs = 5;
    config.llm.base_url = upstream.to_string();
    config.llm.api_key_env = "PROMPTHASH_TEST_LLM_KEY_UNSET".into();
    config
}

/// Start the API server; `llm_key` is injected directly when given.
pub async fn start_server(config: MarketConfig, llm_key: Option<&str>) -> TestServer {
    let store = MarketStore::new(None);
    let mut state = AppState::new(&config, store.clone()).unwrap();
    if let Some(key) = llm_key {
        state.llm = Arc::new(LlmClient::new(&config.llm).unwrap().with_api_key(key));
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::with_state(config, state);
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });

    TestServer {
        addr,
        store,
        shutdown,
        handle,
    }
}

/// JSON-RPC success envelope.
pub fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": result,
    }))
}

/// Mount a reply for `rpc_method`, served at most `times` times.
///
/// The first mounted mock that still matches wins, so mounting in call
/// order scripts a sequence.
pub async fn mount_rpc(
    server: &MockServer,
    rpc_method: &str,
    result: Value,
    times: u64,
) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": rpc_method })))
        .respond_with(rpc_result(result))
        .up_to_n_times(times)
        .mount(server)
        .await;
}
