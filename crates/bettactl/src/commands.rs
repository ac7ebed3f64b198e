//! Subcommand implementations.

use crate::cli::RouteArg;
use anyhow::{Context as _, Result};
use betta_common::wire::{ErrorResponse, FeedResponse};
use betta_common::{
    BettaConfig, FishKey, FishProgress, FishState, ProgressError, ProgressStore, Rarity,
    RequestHandler, Route, SystemClock,
};
use chrono::{TimeZone, Utc};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Everything a command needs, built once from flags and config
pub struct Context {
    pub config: BettaConfig,
    pub handler: RequestHandler,
    pub json: bool,
}

impl Context {
    pub fn load(config_path: Option<&Path>, store_path: Option<PathBuf>, json: bool) -> Result<Self> {
        let config = BettaConfig::load(config_path)?;
        let store = match store_path {
            Some(path) => ProgressStore::open_file(path),
            None => config.open_store(),
        };
        debug!("Using progress store {}", store.describe());
        let handler = RequestHandler::new(Arc::new(store), config.feed, Arc::new(SystemClock));
        Ok(Self {
            config,
            handler,
            json,
        })
    }

    fn now(&self, at: Option<u64>) -> u64 {
        at.unwrap_or_else(|| self.handler.now_ms())
    }
}

pub fn feed(ctx: &Context, token_id: &str, rarity: Rarity, at: Option<u64>) -> Result<bool> {
    let now = ctx.now(at);
    match ctx.handler.feed_service().feed(token_id, rarity, now) {
        Ok(outcome) => {
            if ctx.json {
                print_json(&FeedResponse::from(&outcome))?;
            } else {
                println!(
                    "Fed {} ({}): level {}, {}",
                    outcome.token_id,
                    outcome.rarity,
                    outcome.level,
                    exp_line(outcome.exp, outcome.exp_needed_next, outcome.is_max)
                );
                if outcome.leveled_up() {
                    println!("  Level up! +{} level(s)", outcome.levels_gained);
                }
                println!(
                    "  Next feed in {}",
                    format_duration_ms(outcome.cooldown_ms)
                );
            }
            Ok(true)
        }
        Err(err) => {
            if ctx.json {
                print_json(&ErrorResponse::from(&err))?;
            } else {
                match &err {
                    ProgressError::OnCooldown { remaining_ms } => eprintln!(
                        "{} is still full, try again in {}",
                        token_id,
                        format_duration_ms(*remaining_ms)
                    ),
                    other => eprintln!("Feed failed: {}", other),
                }
            }
            Ok(false)
        }
    }
}

pub fn progress(ctx: &Context, keys: &[FishKey]) -> Result<bool> {
    let views = ctx.handler.progress_query().query(keys);
    if ctx.json {
        print_json(&views)?;
        return Ok(true);
    }

    for (token_id, view) in &views {
        println!(
            "{:<12} level {:>2}  {}",
            token_id,
            view.level,
            exp_line(view.exp, view.exp_needed_next, view.is_max)
        );
    }
    Ok(true)
}

pub fn state(ctx: &Context, token_id: &str, rarity: Rarity, at: Option<u64>) -> Result<bool> {
    let state = ctx
        .handler
        .feed_service()
        .state(token_id, rarity, ctx.now(at));
    if ctx.json {
        print_json(&state)?;
    } else {
        match state {
            FishState::OnCooldown { remaining_ms } => println!(
                "{}: {} ({} left)",
                token_id,
                state.label(),
                format_duration_ms(remaining_ms)
            ),
            _ => println!("{}: {}", token_id, state.label()),
        }
    }
    Ok(true)
}

pub fn list(ctx: &Context) -> Result<bool> {
    let fish = ctx.handler.feed_service().store().all();
    if ctx.json {
        print_json(&fish)?;
        return Ok(true);
    }

    if fish.is_empty() {
        println!("No fish have been fed yet.");
        return Ok(true);
    }
    for record in &fish {
        println!("{}", format_record(record));
    }
    Ok(true)
}

pub fn request(ctx: &Context, route: RouteArg, body: Option<String>) -> Result<bool> {
    let body = match body {
        Some(body) => body,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request body from stdin")?;
            buf
        }
    };
    let route = match route {
        RouteArg::Feed => Route::Feed,
        RouteArg::Progress => Route::Progress,
    };

    let (status, response) = ctx.handler.handle_json(route, &body);
    debug!("{} request answered with {}", route, status);
    print_json(&response)?;
    Ok(status == 200)
}

pub fn config(ctx: &Context) -> Result<bool> {
    if ctx.json {
        print_json(&ctx.config)?;
    } else {
        print!("{}", ctx.config.to_toml()?);
        println!(
            "# progress file: {}",
            ctx.config.storage.resolved_path().display()
        );
    }
    Ok(true)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn exp_line(exp: u64, needed: u64, is_max: bool) -> String {
    if is_max {
        "MAX".to_string()
    } else {
        format!("{}/{} exp", exp, needed)
    }
}

fn format_record(record: &FishProgress) -> String {
    let fed = if record.never_fed() {
        "never fed".to_string()
    } else {
        match Utc.timestamp_millis_opt(record.last_feed_at as i64).single() {
            Some(at) => format!("last fed {}", at.format("%Y-%m-%d %H:%M UTC")),
            None => format!("last fed at {} ms", record.last_feed_at),
        }
    };
    format!(
        "{:<12} {:<9} level {:>2}/{:<2}  {:<14} {}",
        record.token_id,
        record.rarity,
        record.level,
        record.max_level(),
        exp_line(record.exp, record.exp_needed_next(), record.is_max()),
        fed
    )
}

/// Human readable duration: "29m 5s", "1h 0m", "450ms"
pub fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        return format!("{}ms", ms);
    }
    let secs = ms / 1000;
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h {}m", h, m)
    } else if m > 0 {
        format!("{}m {}s", m, s)
    } else {
        format!("{}s", s)
    }
}
