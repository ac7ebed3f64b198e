//! Level Curve
//!
//! Linear experience curve shared by every rarity. Rarity only decides
//! where the curve is cut off.
//!
//! ## Exp Curve
//!
//! Exp required to advance from level L to L+1: base + step * (L - 1)
//! - base = 100
//! - step = 40
//!
//! This means:
//! - Level 1 -> 2: 100 exp
//! - Level 2 -> 3: 140 exp
//! - Level 14 -> 15: 620 exp (last step for COMMON)

use serde::{Deserialize, Serialize};

/// Exp needed to leave level 1
pub const BASE_EXP: u64 = 100;

/// Extra exp needed per level above 1
pub const EXP_STEP: u64 = 40;

/// Exp needed to advance from `level` to `level + 1`
pub fn exp_needed(level: u32) -> u64 {
    BASE_EXP + EXP_STEP * u64::from(level.max(1) - 1)
}

/// Cumulative exp equivalent of being at `level` with `exp` banked
pub fn total_exp(level: u32, exp: u64) -> u64 {
    (1..level.max(1)).map(exp_needed).sum::<u64>() + exp
}

/// Result of running exp through the curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUp {
    pub level: u32,
    pub exp: u64,
    pub levels_gained: u32,
}

impl LevelUp {
    pub fn reached_cap(&self, cap: u32) -> bool {
        self.level >= cap
    }
}

/// Add `gain` exp at `level` and level up as many times as it allows.
///
/// Stops at `cap`; exp beyond the cap is discarded.
pub fn apply_exp(level: u32, exp: u64, gain: u64, cap: u32) -> LevelUp {
    let cap = cap.max(1);
    let mut level = level.clamp(1, cap);
    let mut exp = exp.saturating_add(gain);
    let mut levels_gained = 0;

    while level < cap && exp >= exp_needed(level) {
        exp -= exp_needed(level);
        level += 1;
        levels_gained += 1;
    }

    if level >= cap {
        exp = 0;
    }

    LevelUp {
        level,
        exp,
        levels_gained,
    }
}

/// Progress toward the next level as a percentage (0-100)
pub fn progress_percent(level: u32, exp: u64, cap: u32) -> u8 {
    if level >= cap {
        return 100;
    }
    let needed = exp_needed(level);
    ((exp.min(needed) * 100) / needed) as u8
}
