use std::fmt;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug)]
pub enum SdkError {
    Http(reqwest::Error),
    /// Non-2xx reply; `error` is the body's `error` field when present.
    Api { status: u16, error: String, body: Value },
    Decode(serde_json::Error),
}

impl fmt::Display for SdkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SdkError::Http(e) => write!(f, "HTTP error: {}", e),
            SdkError::Api { status, error, .. } => write!(f, "API returned {}: {}", status, error),
            SdkError::Decode(e) => write!(f, "Decode error: {}", e),
        }
    }
}

impl std::error::Error for SdkError {}

impl From<reqwest::Error> for SdkError {
    fn from(e: reqwest::Error) -> Self {
        SdkError::Http(e)
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(e: serde_json::Error) -> Self {
        SdkError::Decode(e)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub wallet_address: String,
    pub username: String,
    pub rating: u8,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub wallet_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub image: String,
    pub title: String,
    pub content: String,
    pub owner: Option<OwnerRecord>,
    pub price: f64,
    pub category: String,
    pub rating: u8,
    pub created_at: String,
    pub updated_at: String,
}

/// Outcome of `POST /api/user`.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    /// 201 for a new user, 200 for a returning one.
    pub status: u16,
    pub message: String,
    pub user: Option<UserRecord>,
}

#[derive(Debug, Deserialize)]
struct RegistrationBody {
    message: String,
    #[serde(default)]
    user: Option<UserRecord>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromptRequest {
    pub image: String,
    pub title: String,
    pub content: String,
    pub wallet_address: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedPrompt {
    pub message: String,
    pub prompt: PromptRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

/// A complete data-stream reply from `/api/chat`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub data_stream_version: Option<String>,
    pub body: String,
}

impl ChatReply {
    /// Concatenated text parts (`0:` lines).
    pub fn text(&self) -> String {
        self.body
            .lines()
            .filter_map(|line| line.strip_prefix("0:"))
            .filter_map(|part| serde_json::from_str::<String>(part).ok())
            .collect()
    }
}

/// Status and JSON body of any reply.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

pub struct PromptHashClient {
    client: Client,
    base_url: String,
}

impl PromptHashClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<(u16, T), SdkError> {
        let status = resp.status().as_u16();
        let text = resp.text().await?;

        if !(200..300).contains(&status) {
            let body: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));
            let error = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(SdkError::Api { status, error, body });
        }

        Ok((status, serde_json::from_str(&text)?))
    }

    pub async fn health(&self) -> Result<Value, SdkError> {
        let resp = self.client.get(self.url("/health")).send().await?;
        Ok(Self::decode(resp).await?.1)
    }

    /// Register a wallet, or log in when it already exists.
    pub async fn register_user(
        &self,
        wallet_address: &str,
        username: Option<&str>,
    ) -> Result<Registration, SdkError> {
        let mut body = serde_json::json!({ "walletAddress": wallet_address });
        if let Some(username) = username {
            body["username"] = Value::from(username);
        }
        let resp = self.client.post(self.url("/api/user")).json(&body).send().await?;
        let (status, body): (u16, RegistrationBody) = Self::decode(resp).await?;
        Ok(Registration {
            status,
            message: body.message,
            user: body.user,
        })
    }

    pub async fn get_user(&self, wallet_address: &str) -> Result<UserRecord, SdkError> {
        let resp = self
            .client
            .get(self.url("/api/user"))
            .query(&[("walletAddress", wallet_address)])
            .send()
            .await?;
        Ok(Self::decode(resp).await?.1)
    }

    pub async fn list_users(&self) -> Result<Vec<UserRecord>, SdkError> {
        let resp = self.client.get(self.url("/api/user")).send().await?;
        Ok(Self::decode(resp).await?.1)
    }

    pub async fn create_prompt(&self, req: &CreatePromptRequest) -> Result<CreatedPrompt, SdkError> {
        let resp = self.client.post(self.url("/api/prompts")).json(req).send().await?;
        Ok(Self::decode(resp).await?.1)
    }

    pub async fn list_prompts(
        &self,
        category: Option<&str>,
        wallet_address: Option<&str>,
    ) -> Result<Vec<PromptRecord>, SdkError> {
        let mut params = Vec::new();
        if let Some(category) = category {
            params.push(("category", category));
        }
        if let Some(wallet) = wallet_address {
            params.push(("walletAddress", wallet));
        }
        let resp = self
            .client
            .get(self.url("/api/prompts"))
            .query(&params)
            .send()
            .await?;
        Ok(Self::decode(resp).await?.1)
    }

    /// Send `text` to the improvement proxy.
    pub async fn improve(&self, text: &str) -> Result<Value, SdkError> {
        let resp = self
            .client
            .post(self.url("/api/improve-proxy"))
            .header("content-type", "text/plain")
            .body(text.to_string())
            .send()
            .await?;
        Ok(Self::decode(resp).await?.1)
    }

    /// Run a chat turn and collect the whole streamed reply.
    pub async fn chat(&self, messages: &[ChatTurn]) -> Result<ChatReply, SdkError> {
        let resp = self
            .client
            .post(self.url("/api/chat"))
            .json(&serde_json::json!({ "messages": messages }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::decode::<Value>(resp).await.err().unwrap_or(SdkError::Api {
                status: 0,
                error: String::new(),
                body: Value::Null,
            }));
        }

        let data_stream_version = resp
            .headers()
            .get("x-vercel-ai-data-stream")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.text().await?;
        Ok(ChatReply {
            data_stream_version,
            body,
        })
    }

    /// POST arbitrary JSON and return status and body without interpreting them.
    pub async fn post_raw(&self, path: &str, body: &Value) -> Result<RawResponse, SdkError> {
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        Self::raw(resp).await
    }

    /// GET `path` and return status and body without interpreting them.
    pub async fn get_raw(&self, path: &str) -> Result<RawResponse, SdkError> {
        let resp = self.client.get(self.url(path)).send().await?;
        Self::raw(resp).await
    }

    async fn raw(resp: reqwest::Response) -> Result<RawResponse, SdkError> {
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(RawResponse { status, body })
    }
}
