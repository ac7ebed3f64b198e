//! Request and response bodies exchanged with the HTTP layer.
//!
//! Inbound fields are optional and loosely typed so that every malformed
//! body ends up as an `INVALID_INPUT` response instead of a decode failure.

use crate::error::{ProgressError, Result};
use crate::feed::FeedOutcome;
use crate::fish::FishKey;
use crate::query::ProgressView;
use crate::rarity::Rarity;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Upper bound on items in one progress request
pub const MAX_PROGRESS_ITEMS: usize = 500;

/// `POST /feed` body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRequest {
    #[serde(default)]
    pub token_id: Option<Value>,
    #[serde(default)]
    pub rarity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
}

impl FeedRequest {
    pub fn new(token_id: &str, rarity: &str) -> Self {
        Self {
            token_id: Some(Value::String(token_id.to_string())),
            rarity: Some(rarity.to_string()),
            wallet_address: None,
        }
    }

    pub fn validate(&self) -> Result<FishKey> {
        validate_key(self.token_id.as_ref(), self.rarity.as_deref())
    }
}

/// One entry of a progress request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressItem {
    #[serde(default)]
    pub token_id: Option<Value>,
    #[serde(default)]
    pub rarity: Option<String>,
}

/// `POST /progress` body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressRequest {
    #[serde(default)]
    pub items: Option<Vec<ProgressItem>>,
}

impl ProgressRequest {
    pub fn validate(&self) -> Result<Vec<FishKey>> {
        let items = match &self.items {
            Some(items) if !items.is_empty() => items,
            _ => return Err(ProgressError::invalid("items must be a non-empty list")),
        };
        if items.len() > MAX_PROGRESS_ITEMS {
            return Err(ProgressError::invalid(format!(
                "at most {} items per request",
                MAX_PROGRESS_ITEMS
            )));
        }
        let mut rarities: BTreeMap<String, Rarity> = BTreeMap::new();
        let mut keys = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let key = validate_key(item.token_id.as_ref(), item.rarity.as_deref()).map_err(|e| {
                match e {
                    ProgressError::InvalidInput(msg) => {
                        ProgressError::invalid(format!("items[{}]: {}", i, msg))
                    }
                    other => other,
                }
            })?;
            let first = *rarities.entry(key.token_id.clone()).or_insert(key.rarity);
            if first != key.rarity {
                return Err(ProgressError::invalid(format!(
                    "items[{}]: tokenId '{}' already listed as {}",
                    i, key.token_id, first
                )));
            }
            keys.push(key);
        }
        Ok(keys)
    }
}

/// Token ids arrive as strings or as bare JSON integers
fn token_id_from(value: Option<&Value>) -> Result<String> {
    let token_id = match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) if n.is_u64() => n.to_string(),
        Some(_) => return Err(ProgressError::invalid("tokenId must be a string or integer")),
        None => String::new(),
    };
    if token_id.is_empty() {
        return Err(ProgressError::invalid("tokenId is required"));
    }
    Ok(token_id)
}

fn validate_key(token_id: Option<&Value>, rarity: Option<&str>) -> Result<FishKey> {
    let token_id = token_id_from(token_id)?;
    let rarity: Rarity = rarity
        .ok_or_else(|| ProgressError::invalid("rarity is required"))?
        .parse()?;
    Ok(FishKey::new(token_id, rarity))
}

/// Successful feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub level: u32,
    pub exp: u64,
    pub exp_needed_next: u64,
    pub is_max: bool,
    pub cooldown_ms: u64,
    pub levels_gained: u32,
}

impl From<&FeedOutcome> for FeedResponse {
    fn from(outcome: &FeedOutcome) -> Self {
        Self {
            level: outcome.level,
            exp: outcome.exp,
            exp_needed_next: outcome.exp_needed_next,
            is_max: outcome.is_max,
            cooldown_ms: outcome.cooldown_ms,
            levels_gained: outcome.levels_gained,
        }
    }
}

/// Progress by token id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressResponse(pub BTreeMap<String, ProgressView>);

/// Any failed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_ms: Option<u64>,
    #[serde(skip)]
    pub status: u16,
}

impl From<&ProgressError> for ErrorResponse {
    fn from(err: &ProgressError) -> Self {
        let remaining_ms = match err {
            ProgressError::OnCooldown { remaining_ms } => Some(*remaining_ms),
            _ => None,
        };
        // Storage details stay in the logs
        let message = if err.is_storage() {
            "progress storage is unavailable, try again later".to_string()
        } else {
            err.to_string()
        };
        Self {
            error_kind: err.kind().to_string(),
            message,
            remaining_ms,
            status: err.status_code(),
        }
    }
}

impl From<ProgressError> for ErrorResponse {
    fn from(err: ProgressError) -> Self {
        Self::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feed_req(body: Value) -> FeedRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_feed_request_valid() {
        let key = feed_req(json!({"tokenId": "17", "rarity": "rare", "walletAddress": "0xabc"}))
            .validate()
            .unwrap();
        assert_eq!(key, FishKey::new("17", Rarity::Rare));
    }

    #[test]
    fn test_feed_request_builder() {
        let req = FeedRequest::new(" 3 ", "legendary");
        assert_eq!(req.validate().unwrap(), FishKey::new("3", Rarity::Legendary));
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("walletAddress").is_none());
    }

    #[test]
    fn test_feed_request_numeric_token() {
        let key = feed_req(json!({"tokenId": 17, "rarity": "COMMON"}))
            .validate()
            .unwrap();
        assert_eq!(key.token_id, "17");
    }

    #[test]
    fn test_feed_request_rejections() {
        let cases = [
            json!({"rarity": "COMMON"}),
            json!({"tokenId": "", "rarity": "COMMON"}),
            json!({"tokenId": -3, "rarity": "COMMON"}),
            json!({"tokenId": ["1"], "rarity": "COMMON"}),
            json!({"tokenId": "1"}),
            json!({"tokenId": "1", "rarity": "SHINY"}),
        ];
        for body in cases {
            let err = feed_req(body.clone()).validate().unwrap_err();
            assert_eq!(err.kind(), "INVALID_INPUT", "body {}", body);
        }
    }

    #[test]
    fn test_progress_request() {
        let req: ProgressRequest = serde_json::from_value(json!({
            "items": [{"tokenId": "1", "rarity": "COMMON"}, {"tokenId": 2, "rarity": "EPIC"}]
        }))
        .unwrap();
        let keys = req.validate().unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[1], FishKey::new("2", Rarity::Epic));
    }

    #[test]
    fn test_progress_request_rejections() {
        let empty: ProgressRequest = serde_json::from_value(json!({"items": []})).unwrap();
        assert!(empty.validate().is_err());
        assert!(ProgressRequest::default().validate().is_err());

        let bad: ProgressRequest = serde_json::from_value(json!({
            "items": [{"tokenId": "1", "rarity": "COMMON"}, {"tokenId": "2", "rarity": "??"}]
        }))
        .unwrap();
        let err = bad.validate().unwrap_err();
        assert!(err.to_string().contains("items[1]"), "{}", err);
    }

    #[test]
    fn test_progress_request_repeated_tokens() {
        let same: ProgressRequest = serde_json::from_value(json!({
            "items": [{"tokenId": "4", "rarity": "RARE"}, {"tokenId": 4, "rarity": "rare"}]
        }))
        .unwrap();
        assert_eq!(same.validate().unwrap().len(), 2);

        let conflicting: ProgressRequest = serde_json::from_value(json!({
            "items": [{"tokenId": "4", "rarity": "RARE"}, {"tokenId": "4", "rarity": "EPIC"}]
        }))
        .unwrap();
        let err = conflicting.validate().unwrap_err();
        assert_eq!(err.kind(), "INVALID_INPUT");
        assert!(err.to_string().contains("items[1]"), "{}", err);
    }

    #[test]
    fn test_error_response_shapes() {
        let cooldown = ErrorResponse::from(ProgressError::OnCooldown { remaining_ms: 42 });
        let json = serde_json::to_value(&cooldown).unwrap();
        assert_eq!(json["errorKind"], "ON_COOLDOWN");
        assert_eq!(json["remainingMs"], 42);
        assert!(json.get("status").is_none());
        assert_eq!(cooldown.status, 429);

        let storage = ErrorResponse::from(ProgressError::Storage("/secret/path".into()));
        assert_eq!(storage.error_kind, "STORAGE_FAILURE");
        assert!(!storage.message.contains("/secret/path"));
        let json = serde_json::to_value(&storage).unwrap();
        assert!(json.get("remainingMs").is_none());
    }

    #[test]
    fn test_feed_response_camel_case() {
        let response = FeedResponse {
            level: 2,
            exp: 0,
            exp_needed_next: 140,
            is_max: false,
            cooldown_ms: 1_800_000,
            levels_gained: 1,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["expNeededNext"], 140);
        assert_eq!(json["isMax"], false);
        assert_eq!(json["cooldownMs"], 1_800_000);
    }
}
