//! Feed Service
//!
//! One feed action per call: cooldown gate, fixed exp gain, level-ups up to
//! the rarity cap, then exactly one write through the progress store.
//!
//! ## Cooldown
//!
//! `lastFeedAt == 0` means the fish was never fed and the first feed is
//! always allowed. Afterwards a feed needs `cooldown_ms` to have elapsed
//! since the previous successful one. A refused feed leaves the record
//! untouched. Max-level fish still observe the cooldown; feeding them only
//! restarts the window.

use crate::error::{ProgressError, Result};
use crate::fish::{FishProgress, FishState};
use crate::rarity::Rarity;
use crate::store::ProgressStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Default exp granted per successful feed
pub const DEFAULT_EXP_PER_FEED: u64 = 20;

/// Default minimum gap between feeds (30 minutes)
pub const DEFAULT_FEED_COOLDOWN_MS: u64 = 30 * 60 * 1000;

/// Feed tuning, fixed for the lifetime of a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Exp granted per successful feed
    #[serde(default = "default_exp_per_feed")]
    pub exp_per_feed: u64,
    /// Minimum gap between two successful feeds of the same fish
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

fn default_exp_per_feed() -> u64 {
    DEFAULT_EXP_PER_FEED
}

fn default_cooldown_ms() -> u64 {
    DEFAULT_FEED_COOLDOWN_MS
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            exp_per_feed: DEFAULT_EXP_PER_FEED,
            cooldown_ms: DEFAULT_FEED_COOLDOWN_MS,
        }
    }
}

/// Result of a successful feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedOutcome {
    pub token_id: String,
    pub rarity: Rarity,
    pub level: u32,
    pub exp: u64,
    /// Exp needed for the next level, 0 at the cap
    pub exp_needed_next: u64,
    pub is_max: bool,
    /// Length of the cooldown window that just started
    pub cooldown_ms: u64,
    pub levels_gained: u32,
    pub fed_at: u64,
}

impl FeedOutcome {
    fn from_record(record: &FishProgress, levels_gained: u32, cooldown_ms: u64) -> Self {
        Self {
            token_id: record.token_id.clone(),
            rarity: record.rarity,
            level: record.level,
            exp: record.exp,
            exp_needed_next: record.exp_needed_next(),
            is_max: record.is_max(),
            cooldown_ms,
            levels_gained,
            fed_at: record.last_feed_at,
        }
    }

    pub fn leveled_up(&self) -> bool {
        self.levels_gained > 0
    }
}

/// Applies feeds against a shared progress store
pub struct FeedService {
    store: Arc<ProgressStore>,
    config: FeedConfig,
}

impl FeedService {
    pub fn new(store: Arc<ProgressStore>, config: FeedConfig) -> Self {
        Self {
            store,
            config,
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<ProgressStore> {
        &self.store
    }

    /// Feed `token_id` at `now_ms` (Unix epoch milliseconds).
    ///
    /// The cooldown is checked against the record as stored at this moment,
    /// and the fed record is written in the same store update, so concurrent
    /// feeds of one fish cannot both pass the gate. One write per feed,
    /// including the first one.
    pub fn feed(&self, token_id: &str, rarity: Rarity, now_ms: u64) -> Result<FeedOutcome> {
        let token_id = token_id.trim();
        if token_id.is_empty() {
            return Err(ProgressError::invalid("tokenId must not be empty"));
        }

        let FeedConfig {
            exp_per_feed,
            cooldown_ms,
        } = self.config;

        let (record, levels_gained) = self.store.modify(token_id, rarity, |record| {
            let remaining_ms = record.cooldown_remaining(now_ms, cooldown_ms);
            if remaining_ms > 0 {
                debug!("Feed of {} refused, {} ms of cooldown left", token_id, remaining_ms);
                return Err(ProgressError::OnCooldown { remaining_ms });
            }

            let levels_gained = if record.is_max() {
                debug!("{} is at max level {}, refreshing cooldown only", token_id, record.level);
                0
            } else {
                record.add_exp(exp_per_feed)
            };
            record.last_feed_at = now_ms;
            Ok(levels_gained)
        })?;

        if levels_gained > 0 {
            info!(
                "{} ({}) leveled up {} -> {}{}",
                token_id,
                record.rarity,
                record.level - levels_gained,
                record.level,
                if record.is_max() { " (max)" } else { "" }
            );
        }

        Ok(FeedOutcome::from_record(&record, levels_gained, cooldown_ms))
    }

    /// Where the fish stands at `now_ms`, without creating or changing anything
    pub fn state(&self, token_id: &str, rarity: Rarity, now_ms: u64) -> FishState {
        let mut record = self
            .store
            .get(token_id)
            .unwrap_or_else(|| FishProgress::new(token_id, rarity));
        record.correct_rarity(rarity);
        record.state(now_ms, self.config.cooldown_ms)
    }
}
