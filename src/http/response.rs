//! API error mapping.
//!
//! Every failure leaves the server as a JSON object with an `error` field;
//! the improve proxy adds `details` or `message`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::ai::AiError;
use crate::store::StoreError;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
    /// Improve gateway answered with a non-2xx status.
    Upstream { status: StatusCode, details: Value },
    /// Improve gateway could not be reached.
    Proxy(String),
    /// Chat provider failed before streaming started.
    BadGateway(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) | ApiError::Proxy(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream { status, .. } => *status,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::BadRequest(error)
            | ApiError::NotFound(error)
            | ApiError::Internal(error)
            | ApiError::BadGateway(error) => json!({ "error": error }),
            ApiError::Upstream { details, .. } => json!({ "error": "API Error", "details": details }),
            ApiError::Proxy(message) => {
                json!({ "error": "Internal Server Error", "message": message })
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        tracing::error!(error = %e, "Store failure");
        ApiError::Internal(e.to_string())
    }
}

impl From<AiError> for ApiError {
    fn from(e: AiError) -> Self {
        ApiError::BadGateway(e.to_string())
    }
}
