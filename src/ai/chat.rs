//! Streaming chat completions against an OpenAI-compatible endpoint.

use futures_util::stream::Stream;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::ai::sse::data_stream;
use crate::ai::AiError;
use crate::config::LlmConfig;

/// A message as sent by the chat page. Role `"ai"` marks model turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage>,
    stream: bool,
}

/// Map chat-page roles onto completion roles: `"ai"` is the assistant,
/// everything else is the user.
pub fn to_completion_messages(messages: &[ChatMessage]) -> Vec<CompletionMessage> {
    messages
        .iter()
        .map(|m| CompletionMessage {
            role: if m.role == "ai" { "assistant" } else { "user" },
            content: m.content.clone(),
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct LlmClient {
    client: Client,
    endpoint: Url,
    model: String,
    api_key_env: String,
    api_key: Option<String>,
}

impl LlmClient {
    /// Build a client; the API key is read from `config.api_key_env` now.
    pub fn new(config: &LlmConfig) -> Result<Self, AiError> {
        let endpoint = Url::parse(&format!(
            "{}/chat/completions",
            config.base_url.trim_end_matches('/')
        ))
        .map_err(|e| AiError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!(env = %config.api_key_env, "LLM API key not set; /api/chat will fail");
        }

        Ok(Self {
            client: Client::new(),
            endpoint,
            model: config.model.clone(),
            api_key_env: config.api_key_env.clone(),
            api_key,
        })
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Start a streamed completion and return it re-encoded as data-stream
    /// lines. Fails before streaming when the key is missing or the
    /// provider rejects the request.
    pub async fn stream_chat(
        &self,
        messages: &[ChatMessage],
    ) -> Result<impl Stream<Item = String> + Send + 'static, AiError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AiError::MissingApiKey(self.api_key_env.clone()))?;

        let request = CompletionRequest {
            model: &self.model,
            messages: to_completion_messages(messages),
            stream: true,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "LLM request rejected");
            return Err(AiError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(model = %self.model, turns = messages.len(), "LLM stream started");
        Ok(data_stream(response.bytes_stream()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(uri: &str) -> LlmConfig {
        LlmConfig {
            base_url: uri.to_string(),
            model: "gpt-4o".into(),
            api_key_env: "PROMPTHASH_TEST_UNSET_KEY".into(),
        }
    }

    fn msg(role: &str, content: &str) -> ChatMessage {
        ChatMessage {
            role: role.into(),
            content: content.into(),
        }
    }

    #[test]
    fn test_role_mapping() {
        let mapped = to_completion_messages(&[
            msg("user", "hi"),
            msg("ai", "hello"),
            msg("system", "x"),
        ]);
        let roles: Vec<&str> = mapped.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);
    }

    #[tokio::test]
    async fn test_missing_key() {
        let client = LlmClient::new(&config("http://127.0.0.1:9")).unwrap();
        let err = client.stream_chat(&[msg("user", "hi")]).await.err().unwrap();
        assert!(matches!(err, AiError::MissingApiKey(_)));
    }

    #[tokio::test]
    async fn test_streams_completion() {
        let server = MockServer::start().await;
        let sse = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o",
                "stream": true,
                "messages": [{"role": "assistant", "content": "hello"}]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse),
            )
            .mount(&server)
            .await;

        let client = LlmClient::new(&config(&server.uri()))
            .unwrap()
            .with_api_key("sk-test");
        let lines: Vec<String> = client
            .stream_chat(&[msg("ai", "hello")])
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(
            lines,
            vec!["0:\"Hi\"\n", "0:\" there\"\n", "d:{\"finishReason\":\"stop\"}\n"]
        );
    }

    #[tokio::test]
    async fn test_upstream_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let client = LlmClient::new(&config(&server.uri()))
            .unwrap()
            .with_api_key("sk-wrong");
        let err = client.stream_chat(&[]).await.err().unwrap();
        assert!(matches!(err, AiError::Upstream { status: 401, .. }));
    }
}
