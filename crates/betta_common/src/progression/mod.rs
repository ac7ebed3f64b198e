//! Progression Module
//!
//! Leveling for fish: a linear exp curve cut off at the rarity's level cap.
//!
//! ## Level System
//!
//! - Levels start at 1 and stop at `Rarity::max_level()`
//! - Exp is banked per level and reset on level-up
//! - A single exp gain may cross several levels

pub mod levels;

pub use levels::{apply_exp, exp_needed, progress_percent, total_exp, LevelUp, BASE_EXP, EXP_STEP};
