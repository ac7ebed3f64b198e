//! Rarity tags and their level caps.

use crate::error::ProgressError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed rarity of a fish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Spirit,
    Epic,
    Legendary,
}

impl Rarity {
    pub const ALL: [Rarity; 6] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Spirit,
        Rarity::Epic,
        Rarity::Legendary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "COMMON",
            Rarity::Uncommon => "UNCOMMON",
            Rarity::Rare => "RARE",
            Rarity::Spirit => "SPIRIT",
            Rarity::Epic => "EPIC",
            Rarity::Legendary => "LEGENDARY",
        }
    }

    /// Highest level a fish of this rarity can reach
    pub fn max_level(&self) -> u32 {
        match self {
            Rarity::Common => 15,
            Rarity::Uncommon => 20,
            Rarity::Rare => 25,
            Rarity::Spirit => 30,
            Rarity::Epic => 40,
            Rarity::Legendary => 50,
        }
    }
}

impl FromStr for Rarity {
    type Err = ProgressError;

    /// Case-insensitive. Unknown tags are rejected, never defaulted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Rarity::ALL
            .iter()
            .copied()
            .find(|r| r.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| ProgressError::invalid(format!("unknown rarity '{}'", tag)))
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
