//! Progress Store
//!
//! Durable map from token id to `FishProgress`.
//!
//! The store keeps no copy of its own. Every read goes to the backend, and
//! every write is a read-modify-write the backend performs under exclusive
//! access, touching only the record being written. Stores in other threads
//! or processes over the same file therefore never drop each other's records
//! or gate a cooldown on a stale `lastFeedAt`.
//!
//! Storage trouble is not fatal here. Reads degrade to defaults or empty
//! results and log a warning; only writes report the failure.

pub mod atomic;
pub mod file;
pub mod memory;

pub use file::{JsonFileBackend, SCHEMA_VERSION};
pub use memory::MemoryBackend;

use crate::error::{ProgressError, Result};
use crate::fish::{FishKey, FishProgress};
use crate::rarity::Rarity;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// All records, keyed by token id
pub type RecordMap = BTreeMap<String, FishProgress>;

/// Change applied by `ProgressBackend::update`; returns false when nothing changed
pub type UpdateFn<'a> = &'a mut dyn FnMut(&mut RecordMap) -> Result<bool>;

/// Where records are kept between runs
pub trait ProgressBackend: Send + Sync {
    /// Read every record. A store that does not exist yet is empty, not an error.
    fn load(&self) -> Result<RecordMap>;

    /// Read the current records, let `apply` change them, and write the result
    /// back, holding exclusive access to the store throughout.
    ///
    /// Nothing is written when the read fails, when `apply` fails, or when
    /// `apply` reports no change.
    fn update(&self, apply: UpdateFn<'_>) -> Result<()>;

    /// Short label for log lines
    fn describe(&self) -> String;
}

/// Shared progress store
pub struct ProgressStore {
    backend: Arc<dyn ProgressBackend>,
}

impl ProgressStore {
    pub fn new(backend: Arc<dyn ProgressBackend>) -> Self {
        Self { backend }
    }

    /// Store backed by a JSON file at `path`
    pub fn open_file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(JsonFileBackend::new(path)))
    }

    /// Store that forgets everything when the process exits
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub fn describe(&self) -> String {
        self.backend.describe()
    }

    fn load(&self) -> Option<RecordMap> {
        match self.backend.load() {
            Ok(records) => Some(records),
            Err(e) => {
                warn!("Progress store {} unavailable: {}", self.backend.describe(), e);
                None
            }
        }
    }

    /// Return the record for `token_id`, creating and persisting a default one
    /// if it has never been seen.
    ///
    /// The returned copy carries `rarity` even when the stored record disagrees;
    /// the correction is written by the next save.
    pub fn get_or_create(&self, token_id: &str, rarity: Rarity) -> FishProgress {
        let Some(records) = self.load() else {
            debug!("Using default record for {}", token_id);
            return FishProgress::new(token_id, rarity);
        };

        if let Some(existing) = records.get(token_id) {
            let mut record = existing.clone();
            if record.correct_rarity(rarity) {
                debug!(
                    "Rarity of {} corrected from {} to {}",
                    token_id, existing.rarity, rarity
                );
            }
            return record;
        }

        let mut record = FishProgress::new(token_id, rarity);
        let created = self.backend.update(&mut |records| match records.get(token_id) {
            // Created by another writer since the read above
            Some(existing) => {
                record = existing.clone();
                Ok(false)
            }
            None => {
                records.insert(token_id.to_string(), record.clone());
                Ok(true)
            }
        });

        match created {
            Ok(()) => {
                debug!("Progress record for {} ({}) ready", token_id, rarity);
                record.correct_rarity(rarity);
                record
            }
            Err(e) => {
                warn!(
                    "Failed to persist new record for {} to {}: {}",
                    token_id,
                    self.backend.describe(),
                    e
                );
                FishProgress::new(token_id, rarity)
            }
        }
    }

    /// Insert or overwrite the record keyed by its token id. Other records in
    /// the store are left as they are on disk.
    pub fn save(&self, record: &FishProgress) -> Result<()> {
        if record.token_id.trim().is_empty() {
            return Err(ProgressError::invalid("tokenId must not be empty"));
        }

        let mut record = record.clone();
        record.normalize();

        self.backend
            .update(&mut |records| {
                records.insert(record.token_id.clone(), record.clone());
                Ok(true)
            })
            .map_err(|e| {
                warn!(
                    "Failed to save {} to {}: {}",
                    record.token_id,
                    self.backend.describe(),
                    e
                );
                e
            })
    }

    /// Read, change and write one record as a single step.
    ///
    /// The record is read under the backend's exclusive access, created with
    /// `rarity` when missing and rarity-corrected otherwise. If `change` fails
    /// nothing is written and its error is returned. Returns the stored record
    /// and whatever `change` produced.
    pub fn modify<T>(
        &self,
        token_id: &str,
        rarity: Rarity,
        change: impl FnOnce(&mut FishProgress) -> Result<T>,
    ) -> Result<(FishProgress, T)> {
        if token_id.trim().is_empty() {
            return Err(ProgressError::invalid("tokenId must not be empty"));
        }

        let mut change = Some(change);
        let mut outcome = None;
        self.backend
            .update(&mut |records| {
                let change = change
                    .take()
                    .ok_or_else(|| ProgressError::Storage("record change applied twice".into()))?;
                let mut record = records
                    .get(token_id)
                    .cloned()
                    .unwrap_or_else(|| FishProgress::new(token_id, rarity));
                record.correct_rarity(rarity);

                let value = change(&mut record)?;
                record.normalize();
                records.insert(token_id.to_string(), record.clone());
                outcome = Some((record, value));
                Ok(true)
            })
            .map_err(|e| {
                if e.is_storage() {
                    warn!(
                        "Failed to update {} in {}: {}",
                        token_id,
                        self.backend.describe(),
                        e
                    );
                }
                e
            })?;

        outcome.ok_or_else(|| ProgressError::Storage(format!("no record written for {}", token_id)))
    }

    /// Records that already exist for `keys`. Unknown tokens are left out and
    /// nothing is created. A token listed twice is reported once, with the
    /// rarity of its first occurrence. Result order is unspecified.
    pub fn get_many(&self, keys: &[FishKey]) -> Vec<FishProgress> {
        let Some(records) = self.load() else {
            return Vec::new();
        };

        let mut seen = BTreeSet::new();
        keys.iter()
            .filter(|key| seen.insert(key.token_id.as_str()))
            .filter_map(|key| {
                records.get(&key.token_id).map(|stored| {
                    let mut record = stored.clone();
                    record.correct_rarity(key.rarity);
                    record
                })
            })
            .collect()
    }

    /// Stored record for `token_id`, if any
    pub fn get(&self, token_id: &str) -> Option<FishProgress> {
        self.load()?.remove(token_id)
    }

    /// Every stored record, ordered by token id
    pub fn all(&self) -> Vec<FishProgress> {
        self.load()
            .map(|records| records.into_values().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.all().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
