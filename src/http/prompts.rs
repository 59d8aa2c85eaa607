//! `/api/prompts` handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::store::{NewPrompt, PromptQuery};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromptBody {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub wallet_address: Option<String>,
    /// Number or numeric string.
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub category: Option<String>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|v| !v.is_empty())
}

/// A usable price: numeric and non-zero.
fn price_amount(price: &Option<Value>) -> Option<f64> {
    let amount = match price.as_ref()? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (amount.is_finite() && amount != 0.0).then_some(amount)
}

pub async fn create_prompt(
    State(state): State<AppState>,
    Json(body): Json<CreatePromptBody>,
) -> Result<Response, ApiError> {
    let image = present(&body.image);
    let title = present(&body.title);
    let content = present(&body.content);
    let wallet = present(&body.wallet_address);
    let price = price_amount(&body.price);

    let missing: Vec<&str> = [
        ("Image URL", image.is_none()),
        ("Title", title.is_none()),
        ("Content", content.is_none()),
        ("Wallet Address", wallet.is_none()),
        ("Price", price.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, absent)| absent.then_some(name))
    .collect();

    let (Some(image), Some(title), Some(content), Some(wallet), Some(price)) =
        (image, title, content, wallet, price)
    else {
        return Err(ApiError::BadRequest(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    };

    let owner = state.store.find_user(wallet).ok_or_else(|| {
        ApiError::NotFound("User not found. Please connect your wallet first.".into())
    })?;

    let prompt = state.store.create_prompt(
        &owner,
        NewPrompt {
            image: image.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            price,
            category: body.category.clone(),
        },
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Prompt created successfully", "prompt": prompt })),
    )
        .into_response())
}

pub async fn list_prompts(
    State(state): State<AppState>,
    Query(query): Query<PromptQuery>,
) -> Result<Response, ApiError> {
    Ok(Json(state.store.query_prompts(&query)).into_response())
}
