//! Listing form validation and submission.

use std::collections::BTreeMap;
use std::fmt;

use crate::blockchain::{ContractClient, WalletSigner};
use crate::workflow::listing::{ListingDraft, ListingWorkflow};
use crate::workflow::saga::Compensator;

/// Where a successful listing sends the user.
pub const BROWSE_ROUTE: &str = "/browse";

/// Smallest accepted listing price.
pub const MIN_PRICE: u128 = 2;

/// Raw, user-entered listing fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingForm {
    pub image_url: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: String,
}

impl Default for ListingForm {
    fn default() -> Self {
        Self {
            image_url: String::new(),
            title: String::new(),
            description: String::new(),
            category: String::new(),
            price: MIN_PRICE.to_string(),
        }
    }
}

/// Per-field validation messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    fn insert(&mut self, field: &'static str, message: &str) {
        self.0.insert(field, message.to_string());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, message)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
        }
        Ok(())
    }
}

impl ListingForm {
    /// Check every field and produce a draft, or all messages at once.
    pub fn validate(&self) -> Result<ListingDraft, FieldErrors> {
        let mut errors = FieldErrors::default();

        if self.image_url.trim().is_empty() {
            errors.insert("imageUrl", "Image URL is required");
        }

        let title = self.title.trim();
        if title.is_empty() {
            errors.insert("title", "Title is required");
        } else if title.chars().count() < 3 {
            errors.insert("title", "Title must be at least 3 characters");
        }

        let description = self.description.trim();
        if description.is_empty() {
            errors.insert("description", "Description is required");
        } else if description.chars().count() < 10 {
            errors.insert("description", "Description must be at least 10 characters");
        }

        if self.category.trim().is_empty() {
            errors.insert("category", "Category is required");
        }

        let price = match parse_price(&self.price) {
            Ok(p) => Some(p),
            Err(message) => {
                errors.insert("price", message);
                None
            }
        };

        match price {
            Some(price) if errors.is_empty() => Ok(ListingDraft {
                image_url: self.image_url.trim().to_string(),
                title: title.to_string(),
                description: description.to_string(),
                category: self.category.trim().to_string(),
                price,
            }),
            _ => Err(errors),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn parse_price(raw: &str) -> Result<u128, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("Price is required");
    }
    if let Ok(whole) = raw.parse::<u128>() {
        return if whole < MIN_PRICE {
            Err("Price must be at least 2")
        } else {
            Ok(whole)
        };
    }
    match raw.parse::<f64>() {
        Ok(n) if !n.is_finite() => Err("Price must be a number"),
        Ok(n) if n < MIN_PRICE as f64 => Err("Price must be at least 2"),
        Ok(_) => Err("Price must be a whole number"),
        Err(_) => Err("Price must be a number"),
    }
}

/// What happened to a submitted form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation failed; nothing was sent.
    Invalid(FieldErrors),
    /// The workflow ran and failed. Detail is in the logs.
    Failed,
    Listed { redirect: &'static str },
}

/// Validate `form`, run the listing workflow and clear the form on success.
pub async fn submit_listing<C, S, K>(
    form: &mut ListingForm,
    workflow: &ListingWorkflow<'_, C, S, K>,
) -> SubmitOutcome
where
    C: ContractClient,
    S: WalletSigner,
    K: Compensator,
{
    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            tracing::debug!(errors = %errors, "Listing form rejected");
            return SubmitOutcome::Invalid(errors);
        }
    };

    if workflow.run(&draft).await {
        form.reset();
        SubmitOutcome::Listed {
            redirect: BROWSE_ROUTE,
        }
    } else {
        SubmitOutcome::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::NetworkId;
    use crate::blockchain::{LocalSigner, PromptHashContract, RpcClient, WalletSession};
    use crate::workflow::listing::WorkflowSettings;
    use std::sync::Arc;

    fn valid_form() -> ListingForm {
        ListingForm {
            image_url: "https://example.com/cat.png".into(),
            title: "Cat poems".into(),
            description: "Twenty prompts for feline verse".into(),
            category: "Writing".into(),
            price: "5".into(),
        }
    }

    #[test]
    fn test_default_price() {
        assert_eq!(ListingForm::default().price, "2");
    }

    #[test]
    fn test_valid_form_produces_draft() {
        let draft = valid_form().validate().unwrap();
        assert_eq!(draft.category, "Writing");
        assert_eq!(draft.price, 5);
    }

    #[test]
    fn test_empty_form_reports_every_field() {
        let form = ListingForm {
            price: String::new(),
            ..ListingForm::default()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 5);
        assert_eq!(errors.get("imageUrl"), Some("Image URL is required"));
        assert_eq!(errors.get("title"), Some("Title is required"));
        assert_eq!(errors.get("description"), Some("Description is required"));
        assert_eq!(errors.get("category"), Some("Category is required"));
        assert_eq!(errors.get("price"), Some("Price is required"));
    }

    #[test]
    fn test_length_rules() {
        let form = ListingForm {
            title: "ab".into(),
            description: "too short".into(),
            ..valid_form()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("title"), Some("Title must be at least 3 characters"));
        assert_eq!(
            errors.get("description"),
            Some("Description must be at least 10 characters")
        );
        assert!(errors.get("price").is_none());
    }

    #[test]
    fn test_price_rules() {
        let with_price = |p: &str| ListingForm {
            price: p.into(),
            ..valid_form()
        };
        assert_eq!(
            with_price("1").validate().unwrap_err().get("price"),
            Some("Price must be at least 2")
        );
        assert_eq!(
            with_price("0.5").validate().unwrap_err().get("price"),
            Some("Price must be at least 2")
        );
        assert_eq!(
            with_price("2.5").validate().unwrap_err().get("price"),
            Some("Price must be a whole number")
        );
        assert_eq!(
            with_price("ten").validate().unwrap_err().get("price"),
            Some("Price must be a number")
        );
        assert_eq!(with_price(" 2 ").validate().unwrap().price, 2);
    }

    #[tokio::test]
    async fn test_invalid_form_is_not_submitted() {
        let signer =
            LocalSigner::from_private_key("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80")
                .unwrap();
        let network = NetworkId::from("net");
        let session = WalletSession::connected(signer.clone(), network.clone(), signer.address());
        let rpc = Arc::new(RpcClient::new("http://127.0.0.1:9/rpc", None).unwrap());
        let contract = PromptHashContract::new(rpc.clone(), "CCONTRACT", network);
        let workflow =
            ListingWorkflow::new(contract, &session, Some(rpc), WorkflowSettings::default());

        let mut form = ListingForm {
            title: "x".into(),
            ..valid_form()
        };
        let outcome = submit_listing(&mut form, &workflow).await;
        assert!(matches!(outcome, SubmitOutcome::Invalid(_)));
        assert_eq!(form.title, "x");
    }

    #[test]
    fn test_display_joins_messages() {
        let form = ListingForm {
            image_url: String::new(),
            category: String::new(),
            ..valid_form()
        };
        let text = form.validate().unwrap_err().to_string();
        assert_eq!(text, "category: Category is required; imageUrl: Image URL is required");
    }
}
