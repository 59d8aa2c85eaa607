//! Marketplace records and their JSON shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rating given to newly registered users.
pub const NEW_USER_RATING: u8 = 4;
/// Rating given to newly created prompts.
pub const NEW_PROMPT_RATING: u8 = 3;
/// Category used when a prompt is created without one.
pub const DEFAULT_CATEGORY: &str = "Other";

/// A registered wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// Always lower-cased.
    pub wallet_address: String,
    pub username: String,
    pub rating: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A stored prompt listing. `owner` references a [`User`] id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub image: String,
    pub title: String,
    pub content: String,
    pub owner: Uuid,
    pub price: f64,
    pub category: String,
    pub rating: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Insertion order; breaks ties between equal timestamps.
    #[serde(default)]
    pub seq: u64,
}

/// The owner fields exposed alongside a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub wallet_address: String,
}

impl From<&User> for OwnerSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            wallet_address: user.wallet_address.clone(),
        }
    }
}

/// A prompt with its owner populated, as returned by the API.
///
/// `owner` is `null` when the owning user no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub image: String,
    pub title: String,
    pub content: String,
    pub owner: Option<OwnerSummary>,
    pub price: f64,
    pub category: String,
    pub rating: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PromptView {
    pub fn new(prompt: &Prompt, owner: Option<OwnerSummary>) -> Self {
        Self {
            id: prompt.id,
            image: prompt.image.clone(),
            title: prompt.title.clone(),
            content: prompt.content.clone(),
            owner,
            price: prompt.price,
            category: prompt.category.clone(),
            rating: prompt.rating,
            created_at: prompt.created_at,
            updated_at: prompt.updated_at,
        }
    }
}

/// Fields needed to create a prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPrompt {
    pub image: String,
    pub title: String,
    pub content: String,
    pub price: f64,
    pub category: Option<String>,
}

/// Filters for listing prompts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptQuery {
    pub category: Option<String>,
    pub wallet_address: Option<String>,
}

/// Result of a registration attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    Existing(User),
    Created(User),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_json_shape() {
        let now = Utc::now();
        let user = User {
            id: Uuid::nil(),
            wallet_address: "gabc".into(),
            username: "user123456".into(),
            rating: NEW_USER_RATING,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["_id"], Uuid::nil().to_string());
        assert_eq!(json["walletAddress"], "gabc");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_prompt_view_hides_sequence() {
        let now = Utc::now();
        let prompt = Prompt {
            id: Uuid::new_v4(),
            image: "i".into(),
            title: "t".into(),
            content: "c".into(),
            owner: Uuid::new_v4(),
            price: 2.0,
            category: DEFAULT_CATEGORY.into(),
            rating: NEW_PROMPT_RATING,
            created_at: now,
            updated_at: now,
            seq: 7,
        };
        let json = serde_json::to_value(PromptView::new(&prompt, None)).unwrap();
        assert!(json.get("seq").is_none());
        assert!(json["owner"].is_null());
        assert_eq!(json["category"], "Other");
    }
}
