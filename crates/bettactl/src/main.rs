//! Betta Control - CLI for the fish progression store
//!
//! Feeds fish, shows progress, and replays API request bodies locally.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use commands::Context;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Log filter, e.g. `BETTA_LOG=betta_common=debug`
const LOG_ENV: &str = "BETTA_LOG";

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr so --json output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let ctx = Context::load(cli.config.as_deref(), cli.store, cli.json)?;

    let ok = match cli.command {
        Commands::Feed {
            token_id,
            rarity,
            at,
        } => commands::feed(&ctx, &token_id, rarity, at)?,
        Commands::Progress { fish } => commands::progress(&ctx, &fish)?,
        Commands::State {
            token_id,
            rarity,
            at,
        } => commands::state(&ctx, &token_id, rarity, at)?,
        Commands::List => commands::list(&ctx)?,
        Commands::Request { route, body } => commands::request(&ctx, route, body)?,
        Commands::Config => commands::config(&ctx)?,
    };

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
