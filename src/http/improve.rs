//! `/api/improve-proxy` handler.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::http::request::RequestIdExt;
use crate::http::response::ApiError;
use crate::http::server::AppState;

/// Forward the raw body to the improvement gateway.
pub async fn improve_proxy(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, ApiError> {
    let request_id = headers.request_id();
    tracing::info!(request_id = %request_id, bytes = body.len(), "Improve prompt request");

    let reply = state.improve.improve(body).await.map_err(|e| {
        tracing::error!(request_id = %request_id, error = %e, "Improve proxy failed");
        ApiError::Proxy(e.to_string())
    })?;

    tracing::info!(request_id = %request_id, status = reply.status, "Improve prompt response");

    if !reply.is_success() {
        let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
        return Err(ApiError::Upstream {
            status,
            details: reply.body,
        });
    }
    Ok(Json(reply.body).into_response())
}
