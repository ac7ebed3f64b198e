//! Betta Common - fish progression for the Betta aquarium mini app.
//!
//! Feed cooldowns, experience and level-ups per NFT fish, kept in a durable
//! progress store. Wallet, contract and signing work happen elsewhere; this
//! crate only needs a token id and a rarity.

pub mod clock;
pub mod config;
pub mod error;
pub mod feed;
pub mod fish;
pub mod handler;
pub mod progression;
pub mod query;
pub mod rarity;
pub mod store;
pub mod wire;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{BackendKind, BettaConfig, StorageConfig};
pub use error::ProgressError;
pub use feed::{FeedConfig, FeedOutcome, FeedService};
pub use fish::{FishKey, FishProgress, FishState};
pub use handler::{RequestHandler, Route};
pub use query::{ProgressQuery, ProgressView};
pub use rarity::Rarity;
pub use store::{JsonFileBackend, MemoryBackend, ProgressBackend, ProgressStore};
