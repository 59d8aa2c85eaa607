//! Client for the prompt-improvement gateway.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::ai::AiError;
use crate::config::ImproveConfig;

/// Status and body of a gateway reply.
///
/// The body is the parsed JSON when the gateway sent JSON, otherwise its
/// raw text as a JSON string.
#[derive(Debug, Clone, PartialEq)]
pub struct ImproveReply {
    pub status: u16,
    pub body: Value,
}

impl ImproveReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone)]
pub struct ImproveClient {
    client: Client,
    endpoint: Url,
}

impl ImproveClient {
    pub fn new(config: &ImproveConfig) -> Result<Self, AiError> {
        let endpoint = Url::parse(&format!(
            "{}/api/improve-prompt",
            config.base_url.trim_end_matches('/')
        ))
        .map_err(|e| AiError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Forward `text` as a plain-text body and return whatever came back.
    pub async fn improve(&self, text: String) -> Result<ImproveReply, AiError> {
        tracing::debug!(bytes = text.len(), "Forwarding improve request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "text/plain")
            .header(ACCEPT, "application/json")
            .body(text)
            .send()
            .await?;

        let status = response.status().as_u16();
        let raw = response.text().await?;
        let body = serde_json::from_str(&raw).unwrap_or(Value::String(raw));

        tracing::debug!(status, "Improve gateway replied");
        Ok(ImproveReply { status, body })
    }
}
