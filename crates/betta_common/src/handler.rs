//! Request handler: validated body in, response body out.
//!
//! This is the seam an HTTP route calls into. Routing, auth and transport
//! stay outside; the handler only owns validation, the clock, and the
//! mapping of results onto the response contract.

use crate::clock::{Clock, SystemClock};
use crate::config::BettaConfig;
use crate::error::ProgressError;
use crate::feed::{FeedConfig, FeedService};
use crate::query::ProgressQuery;
use crate::store::ProgressStore;
use crate::wire::{ErrorResponse, FeedRequest, FeedResponse, ProgressRequest, ProgressResponse};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Which operation a raw JSON body is meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Feed,
    Progress,
}

impl FromStr for Route {
    type Err = ProgressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "feed" => Ok(Route::Feed),
            "progress" => Ok(Route::Progress),
            other => Err(ProgressError::invalid(format!("unknown route '{}'", other))),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Feed => f.write_str("feed"),
            Route::Progress => f.write_str("progress"),
        }
    }
}

pub struct RequestHandler {
    feed: FeedService,
    query: ProgressQuery,
    clock: Arc<dyn Clock>,
}

impl RequestHandler {
    pub fn new(store: Arc<ProgressStore>, config: FeedConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            feed: FeedService::new(store.clone(), config),
            query: ProgressQuery::new(store),
            clock,
        }
    }

    /// Handler over the store described by `config`, on the wall clock
    pub fn from_config(config: &BettaConfig) -> Self {
        Self::new(
            Arc::new(config.open_store()),
            config.feed,
            Arc::new(SystemClock),
        )
    }

    pub fn feed_service(&self) -> &FeedService {
        &self.feed
    }

    pub fn progress_query(&self) -> &ProgressQuery {
        &self.query
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn handle_feed(&self, request: &FeedRequest) -> Result<FeedResponse, ErrorResponse> {
        let key = request.validate()?;
        if let Some(wallet) = &request.wallet_address {
            debug!("Feed of {} requested by {}", key.token_id, wallet);
        }
        let outcome = self
            .feed
            .feed(&key.token_id, key.rarity, self.clock.now_ms())?;
        Ok(FeedResponse::from(&outcome))
    }

    pub fn handle_progress(
        &self,
        request: &ProgressRequest,
    ) -> Result<ProgressResponse, ErrorResponse> {
        let keys = request.validate()?;
        Ok(ProgressResponse(self.query.query(&keys)))
    }

    /// Decode `body`, dispatch on `route`, and return status plus JSON body
    pub fn handle_json(&self, route: Route, body: &str) -> (u16, Value) {
        match route {
            Route::Feed => respond(decode::<FeedRequest>(body).and_then(|r| self.handle_feed(&r))),
            Route::Progress => {
                respond(decode::<ProgressRequest>(body).and_then(|r| self.handle_progress(&r)))
            }
        }
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ErrorResponse> {
    serde_json::from_str(body)
        .map_err(|e| ErrorResponse::from(ProgressError::invalid(format!("malformed body: {}", e))))
}

fn respond<T: Serialize>(result: Result<T, ErrorResponse>) -> (u16, Value) {
    let (status, body) = match result {
        Ok(ok) => (200, serde_json::to_value(ok)),
        Err(err) => (err.status, serde_json::to_value(&err)),
    };
    match body {
        Ok(body) => (status, body),
        Err(e) => {
            warn!("Failed to encode response: {}", e);
            (
                500,
                serde_json::json!({"errorKind": "INTERNAL", "message": "failed to encode response"}),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const COOLDOWN: u64 = 60_000;

    fn handler() -> (RequestHandler, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let config = FeedConfig {
            exp_per_feed: 20,
            cooldown_ms: COOLDOWN,
        };
        let handler = RequestHandler::new(
            Arc::new(ProgressStore::in_memory()),
            config,
            clock.clone(),
        );
        (handler, clock)
    }

    #[test]
    fn test_route_parse() {
        assert_eq!("feed".parse::<Route>().unwrap(), Route::Feed);
        assert_eq!("PROGRESS".parse::<Route>().unwrap(), Route::Progress);
        assert!("hatch".parse::<Route>().is_err());
    }

    #[test]
    fn test_feed_then_cooldown_over_json() {
        let (handler, clock) = handler();
        let body = r#"{"tokenId": "8", "rarity": "COMMON", "walletAddress": "0x1"}"#;

        let (status, json) = handler.handle_json(Route::Feed, body);
        assert_eq!(status, 200);
        assert_eq!(json["exp"], 20);
        assert_eq!(json["cooldownMs"], COOLDOWN);

        clock.advance(10_000);
        let (status, json) = handler.handle_json(Route::Feed, body);
        assert_eq!(status, 429);
        assert_eq!(json["errorKind"], "ON_COOLDOWN");
        assert_eq!(json["remainingMs"], COOLDOWN - 10_000);
    }

    #[test]
    fn test_malformed_body_is_invalid_input() {
        let (handler, _) = handler();
        let (status, json) = handler.handle_json(Route::Feed, "{nope");
        assert_eq!(status, 400);
        assert_eq!(json["errorKind"], "INVALID_INPUT");

        let (status, _) = handler.handle_json(Route::Feed, r#"{"tokenId": "1", "rarity": "GOLD"}"#);
        assert_eq!(status, 400);
    }

    #[test]
    fn test_progress_over_json() {
        let (handler, _) = handler();
        handler.handle_json(Route::Feed, r#"{"tokenId": "1", "rarity": "RARE"}"#);

        let (status, json) = handler.handle_json(
            Route::Progress,
            r#"{"items": [{"tokenId": "1", "rarity": "RARE"}, {"tokenId": "2", "rarity": "RARE"}]}"#,
        );
        assert_eq!(status, 200);
        assert_eq!(json["1"]["exp"], 20);
        assert_eq!(json["2"]["level"], 1);
        assert_eq!(json["2"]["expNeededNext"], 100);
        assert!(handler.feed_service().store().get("2").is_none());
    }
}
