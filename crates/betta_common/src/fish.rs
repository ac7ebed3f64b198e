//! Per-fish progression record.

use crate::progression::{apply_exp, exp_needed, progress_percent, LevelUp};
use crate::rarity::Rarity;
use serde::{Deserialize, Serialize};

/// One tracked fish, keyed by token id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FishProgress {
    /// NFT token id
    pub token_id: String,
    /// Decides the level cap; corrected from caller input
    pub rarity: Rarity,
    /// Current level (1..=rarity cap)
    pub level: u32,
    /// Exp banked toward the next level
    pub exp: u64,
    /// Unix epoch ms of the last successful feed, 0 if never fed
    #[serde(default)]
    pub last_feed_at: u64,
}

impl FishProgress {
    pub fn new(token_id: &str, rarity: Rarity) -> Self {
        Self {
            token_id: token_id.to_string(),
            rarity,
            level: 1,
            exp: 0,
            last_feed_at: 0,
        }
    }

    pub fn max_level(&self) -> u32 {
        self.rarity.max_level()
    }

    pub fn is_max(&self) -> bool {
        self.level >= self.max_level()
    }

    pub fn never_fed(&self) -> bool {
        self.last_feed_at == 0
    }

    /// Exp needed for the next level, 0 at the cap
    pub fn exp_needed_next(&self) -> u64 {
        if self.is_max() {
            0
        } else {
            exp_needed(self.level)
        }
    }

    pub fn progress_percent(&self) -> u8 {
        progress_percent(self.level, self.exp, self.max_level())
    }

    /// Overwrite the rarity with the caller's value.
    ///
    /// Returns true when anything changed. Lowering the cap below the
    /// current level clamps the level and drops banked exp.
    pub fn correct_rarity(&mut self, rarity: Rarity) -> bool {
        if self.rarity == rarity {
            return false;
        }
        self.rarity = rarity;
        self.normalize();
        true
    }

    /// Pull level and exp back inside the invariants
    pub fn normalize(&mut self) {
        let cap = self.max_level();
        self.level = self.level.clamp(1, cap);
        if self.level >= cap {
            self.exp = 0;
        }
    }

    /// Bank exp and level up. Returns the number of levels gained.
    pub fn add_exp(&mut self, gain: u64) -> u32 {
        let LevelUp {
            level,
            exp,
            levels_gained,
        } = apply_exp(self.level, self.exp, gain, self.max_level());
        self.level = level;
        self.exp = exp;
        levels_gained
    }

    /// Milliseconds left on the cooldown at `now_ms`, 0 when feedable.
    ///
    /// A never-fed fish has no cooldown. A clock behind `last_feed_at`
    /// counts as no time elapsed.
    pub fn cooldown_remaining(&self, now_ms: u64, cooldown_ms: u64) -> u64 {
        if self.never_fed() {
            return 0;
        }
        let elapsed = now_ms.saturating_sub(self.last_feed_at);
        cooldown_ms.saturating_sub(elapsed)
    }

    pub fn state(&self, now_ms: u64, cooldown_ms: u64) -> FishState {
        if self.never_fed() {
            return if self.is_max() {
                FishState::MaxLevel
            } else {
                FishState::NeverFed
            };
        }
        match self.cooldown_remaining(now_ms, cooldown_ms) {
            0 if self.is_max() => FishState::MaxLevel,
            0 => FishState::Feedable,
            remaining_ms => FishState::OnCooldown { remaining_ms },
        }
    }
}

/// Token id plus the rarity the caller believes it has
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FishKey {
    pub token_id: String,
    pub rarity: Rarity,
}

impl FishKey {
    pub fn new(token_id: impl Into<String>, rarity: Rarity) -> Self {
        Self {
            token_id: token_id.into(),
            rarity,
        }
    }
}

/// Where a fish sits in the feed cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FishState {
    NeverFed,
    #[serde(rename_all = "camelCase")]
    OnCooldown {
        remaining_ms: u64,
    },
    Feedable,
    MaxLevel,
}

impl FishState {
    pub fn can_feed(&self) -> bool {
        !matches!(self, FishState::OnCooldown { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            FishState::NeverFed => "never fed",
            FishState::OnCooldown { .. } => "on cooldown",
            FishState::Feedable => "hungry",
            FishState::MaxLevel => "max level",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: u64 = 30 * 60 * 1000;

    #[test]
    fn test_new_record_defaults() {
        let fish = FishProgress::new("7", Rarity::Rare);
        assert_eq!(fish.level, 1);
        assert_eq!(fish.exp, 0);
        assert_eq!(fish.last_feed_at, 0);
        assert!(fish.never_fed());
        assert!(!fish.is_max());
        assert_eq!(fish.exp_needed_next(), 100);
    }

    #[test]
    fn test_serde_camel_case() {
        let fish = FishProgress::new("42", Rarity::Epic);
        let json = serde_json::to_value(&fish).unwrap();
        assert_eq!(json["tokenId"], "42");
        assert_eq!(json["rarity"], "EPIC");
        assert_eq!(json["lastFeedAt"], 0);
    }

    #[test]
    fn test_correct_rarity_clamps_level() {
        let mut fish = FishProgress::new("1", Rarity::Legendary);
        fish.level = 30;
        fish.exp = 55;
        assert!(fish.correct_rarity(Rarity::Common));
        assert_eq!(fish.level, 15);
        assert_eq!(fish.exp, 0);
        assert!(fish.is_max());
    }

    #[test]
    fn test_correct_rarity_same_value_is_noop() {
        let mut fish = FishProgress::new("1", Rarity::Common);
        assert!(!fish.correct_rarity(Rarity::Common));
    }

    #[test]
    fn test_cooldown_remaining() {
        let mut fish = FishProgress::new("1", Rarity::Common);
        assert_eq!(fish.cooldown_remaining(5, COOLDOWN), 0);

        fish.last_feed_at = 1_000;
        assert_eq!(fish.cooldown_remaining(1_000, COOLDOWN), COOLDOWN);
        assert_eq!(fish.cooldown_remaining(1_500, COOLDOWN), COOLDOWN - 500);
        assert_eq!(fish.cooldown_remaining(1_000 + COOLDOWN, COOLDOWN), 0);
        // Clock went backwards
        assert_eq!(fish.cooldown_remaining(10, COOLDOWN), COOLDOWN);
    }

    #[test]
    fn test_state_machine() {
        let mut fish = FishProgress::new("1", Rarity::Common);
        assert_eq!(fish.state(0, COOLDOWN), FishState::NeverFed);

        fish.last_feed_at = 10_000;
        assert_eq!(
            fish.state(10_001, COOLDOWN),
            FishState::OnCooldown {
                remaining_ms: COOLDOWN - 1
            }
        );
        assert_eq!(fish.state(10_000 + COOLDOWN, COOLDOWN), FishState::Feedable);

        fish.level = 15;
        assert_eq!(fish.state(10_000 + COOLDOWN, COOLDOWN), FishState::MaxLevel);
        assert!(!fish.state(10_001, COOLDOWN).can_feed());
    }

    #[test]
    fn test_state_serializes_with_tag() {
        let json = serde_json::to_value(FishState::OnCooldown { remaining_ms: 9 }).unwrap();
        assert_eq!(json["state"], "ON_COOLDOWN");
        assert_eq!(json["remainingMs"], 9);
    }
}
