//! Concurrent in-memory store with JSON snapshot persistence.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::observability::metrics;
use crate::store::types::{
    NewPrompt, OwnerSummary, Prompt, PromptQuery, PromptView, Registration, User,
    DEFAULT_CATEGORY, NEW_PROMPT_RATING, NEW_USER_RATING,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot format error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    users: Vec<User>,
    prompts: Vec<Prompt>,
}

/// Users keyed by lower-cased wallet address, prompts keyed by id.
#[derive(Clone, Default)]
pub struct MarketStore {
    users: Arc<DashMap<String, User>>,
    prompts: Arc<DashMap<Uuid, Prompt>>,
    next_seq: Arc<AtomicU64>,
    persistence_path: Option<PathBuf>,
}

fn wallet_key(wallet_address: &str) -> String {
    wallet_address.trim().to_lowercase()
}

fn generated_username() -> String {
    format!("user{}", rand::thread_rng().gen_range(100_000..=999_999))
}

impl MarketStore {
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            persistence_path,
            ..Self::default()
        }
    }

    /// Open a store backed by `path`, loading it when the file exists.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let store = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let snapshot: Snapshot = serde_json::from_reader(reader)?;

            let mut max_seq = 0;
            for user in snapshot.users {
                store.users.insert(user.wallet_address.clone(), user);
            }
            for prompt in snapshot.prompts {
                max_seq = max_seq.max(prompt.seq + 1);
                store.prompts.insert(prompt.id, prompt);
            }
            store.next_seq.store(max_seq, Ordering::SeqCst);

            store.report_size();
            tracing::info!(
                users = store.users.len(),
                prompts = store.prompts.len(),
                path = %path.display(),
                "Loaded store snapshot"
            );
        }
        Ok(store)
    }

    /// Write a snapshot when a persistence path is configured.
    pub fn save_to_file(&self) -> Result<(), StoreError> {
        let Some(path) = &self.persistence_path else {
            return Ok(());
        };
        let snapshot = Snapshot {
            users: self.list_users(),
            prompts: self.prompts.iter().map(|r| r.value().clone()).collect(),
        };
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, &snapshot)?;
        tracing::info!(
            users = snapshot.users.len(),
            prompts = snapshot.prompts.len(),
            path = %path.display(),
            "Saved store snapshot"
        );
        Ok(())
    }

    /// Return the existing user for `wallet_address` or create one.
    ///
    /// Concurrent registrations of the same wallet create exactly one user.
    pub fn register_user(&self, wallet_address: &str, username: Option<&str>) -> Registration {
        let key = wallet_key(wallet_address);
        let registration = match self.users.entry(key.clone()) {
            Entry::Occupied(existing) => Registration::Existing(existing.get().clone()),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let username = username
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(generated_username);
                let user = User {
                    id: Uuid::new_v4(),
                    wallet_address: key,
                    username,
                    rating: NEW_USER_RATING,
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(user.clone());
                Registration::Created(user)
            }
        };

        if let Registration::Created(user) = &registration {
            tracing::info!(user_id = %user.id, wallet = %user.wallet_address, "User registered");
            self.report_size();
        }
        registration
    }

    /// Case-insensitive lookup.
    pub fn find_user(&self, wallet_address: &str) -> Option<User> {
        self.users
            .get(&wallet_key(wallet_address))
            .map(|r| r.value().clone())
    }

    /// All users, oldest first.
    pub fn list_users(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.iter().map(|r| r.value().clone()).collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        users
    }

    pub fn create_prompt(&self, owner: &User, new: NewPrompt) -> PromptView {
        let now = Utc::now();
        let category = new
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
        let prompt = Prompt {
            id: Uuid::new_v4(),
            image: new.image,
            title: new.title,
            content: new.content,
            owner: owner.id,
            price: new.price,
            category,
            rating: NEW_PROMPT_RATING,
            created_at: now,
            updated_at: now,
            seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
        };
        self.prompts.insert(prompt.id, prompt.clone());

        tracing::info!(prompt_id = %prompt.id, owner = %owner.id, "Prompt created");
        self.report_size();
        PromptView::new(&prompt, Some(OwnerSummary::from(owner)))
    }

    /// Prompts matching `query`, newest first, owners populated.
    ///
    /// A wallet filter that matches no user is ignored.
    pub fn query_prompts(&self, query: &PromptQuery) -> Vec<PromptView> {
        let category = query.category.as_deref().filter(|c| !c.is_empty());
        let owner = query
            .wallet_address
            .as_deref()
            .filter(|w| !w.is_empty())
            .and_then(|w| self.find_user(w))
            .map(|u| u.id);

        let mut prompts: Vec<Prompt> = self
            .prompts
            .iter()
            .filter(|r| category.map_or(true, |c| r.category == c))
            .filter(|r| owner.map_or(true, |o| r.owner == o))
            .map(|r| r.value().clone())
            .collect();
        prompts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.seq.cmp(&a.seq)));

        let owners: HashMap<Uuid, OwnerSummary> = self
            .users
            .iter()
            .map(|r| (r.id, OwnerSummary::from(r.value())))
            .collect();

        prompts
            .iter()
            .map(|p| PromptView::new(p, owners.get(&p.owner).cloned()))
            .collect()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.len()
    }

    fn report_size(&self) {
        metrics::record_store_size(self.users.len(), self.prompts.len());
    }
}
