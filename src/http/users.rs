//! `/api/user` handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::store::Registration;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserBody {
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(default)]
    pub wallet_address: Option<String>,
}

/// Register a wallet, or acknowledge a returning one.
pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<RegisterUserBody>,
) -> Result<Response, ApiError> {
    let wallet = body
        .wallet_address
        .as_deref()
        .filter(|w| !w.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Wallet address is required".into()))?;

    match state.store.register_user(wallet, body.username.as_deref()) {
        Registration::Existing(user) => {
            tracing::debug!(user_id = %user.id, "Returning user");
            Ok((StatusCode::OK, Json(json!({ "message": "Login successful" }))).into_response())
        }
        Registration::Created(user) => Ok((
            StatusCode::CREATED,
            Json(json!({ "message": "User registered successfully", "user": user })),
        )
            .into_response()),
    }
}

/// One user by wallet, or every user.
pub async fn get_users(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Response, ApiError> {
    match query.wallet_address.as_deref().filter(|w| !w.is_empty()) {
        Some(wallet) => {
            let user = state
                .store
                .find_user(wallet)
                .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
            Ok(Json(user).into_response())
        }
        None => Ok(Json(state.store.list_users()).into_response()),
    }
}
