//! `/api/chat` handler.

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::State,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::StreamExt;
use serde::Deserialize;

use crate::ai::ChatMessage;
use crate::http::response::ApiError;
use crate::http::server::AppState;

pub const DATA_STREAM_HEADER: &str = "x-vercel-ai-data-stream";

#[derive(Debug, Default, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Stream a completion for `messages` as data-stream lines.
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatBody>,
) -> Result<Response, ApiError> {
    let lines = state.llm.stream_chat(&body.messages).await.map_err(|e| {
        tracing::error!(error = %e, "Chat request failed");
        ApiError::from(e)
    })?;

    Ok((
        [
            (CONTENT_TYPE.as_str(), "text/plain; charset=utf-8"),
            (DATA_STREAM_HEADER, "v1"),
        ],
        Body::from_stream(lines.map(Ok::<_, Infallible>)),
    )
        .into_response())
}
