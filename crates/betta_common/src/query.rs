//! Read-only batch progress lookup for display.
//!
//! Tokens without a stored record are reported as a fresh level 1 fish. They
//! are not written to the store: rendering an aquarium of a few hundred fish
//! must not create a few hundred records.

use crate::fish::{FishKey, FishProgress};
use crate::store::ProgressStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// What the UI needs to draw a progress bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub level: u32,
    pub exp: u64,
    pub exp_needed_next: u64,
    pub is_max: bool,
}

impl From<&FishProgress> for ProgressView {
    fn from(record: &FishProgress) -> Self {
        Self {
            level: record.level,
            exp: record.exp,
            exp_needed_next: record.exp_needed_next(),
            is_max: record.is_max(),
        }
    }
}

pub struct ProgressQuery {
    store: Arc<ProgressStore>,
}

impl ProgressQuery {
    pub fn new(store: Arc<ProgressStore>) -> Self {
        Self { store }
    }

    /// Progress for every key, by token id. A token listed twice is read with
    /// the rarity of its first occurrence.
    pub fn query(&self, keys: &[FishKey]) -> BTreeMap<String, ProgressView> {
        let mut views = BTreeMap::new();
        for key in keys {
            views.entry(key.token_id.clone()).or_insert_with(|| {
                ProgressView::from(&FishProgress::new(&key.token_id, key.rarity))
            });
        }

        for record in self.store.get_many(keys) {
            views.insert(record.token_id.clone(), ProgressView::from(&record));
        }

        views
    }

    pub fn query_one(&self, key: &FishKey) -> ProgressView {
        self.query(std::slice::from_ref(key))
            .remove(&key.token_id)
            .unwrap_or_else(|| ProgressView::from(&FishProgress::new(&key.token_id, key.rarity)))
    }
}
