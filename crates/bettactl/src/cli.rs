//! Command line definition.

use betta_common::{FishKey, Rarity};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bettactl")]
#[command(about = "Betta aquarium - fish feeding and progression", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to ~/.config/betta/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Progress file to use instead of the configured one
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Feed a fish
    Feed {
        token_id: String,

        #[arg(value_parser = parse_rarity)]
        rarity: Rarity,

        /// Feed time in Unix epoch milliseconds (defaults to now)
        #[arg(long)]
        at: Option<u64>,
    },

    /// Show progress for one or more fish without creating records
    Progress {
        /// Fish as TOKEN_ID:RARITY
        #[arg(required = true, value_parser = parse_fish_key)]
        fish: Vec<FishKey>,
    },

    /// Show whether a fish can be fed right now
    State {
        token_id: String,

        #[arg(value_parser = parse_rarity)]
        rarity: Rarity,

        /// Time in Unix epoch milliseconds (defaults to now)
        #[arg(long)]
        at: Option<u64>,
    },

    /// List every stored fish
    List,

    /// Handle a raw JSON request body the way the API route would
    Request {
        #[arg(value_enum)]
        route: RouteArg,

        /// Request body; read from stdin when omitted
        #[arg(long)]
        body: Option<String>,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RouteArg {
    Feed,
    Progress,
}

fn parse_rarity(s: &str) -> Result<Rarity, String> {
    s.parse::<Rarity>().map_err(|e| e.to_string())
}

/// `TOKEN_ID:RARITY`; the last colon splits so token ids may contain colons
pub fn parse_fish_key(s: &str) -> Result<FishKey, String> {
    let (token_id, rarity) = s
        .rsplit_once(':')
        .ok_or_else(|| format!("expected TOKEN_ID:RARITY, got '{}'", s))?;
    let token_id = token_id.trim();
    if token_id.is_empty() {
        return Err(format!("missing token id in '{}'", s));
    }
    Ok(FishKey::new(token_id, parse_rarity(rarity)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_fish_key() {
        assert_eq!(
            parse_fish_key("12:rare").unwrap(),
            FishKey::new("12", Rarity::Rare)
        );
        assert_eq!(
            parse_fish_key("base:12:EPIC").unwrap(),
            FishKey::new("base:12", Rarity::Epic)
        );
        assert!(parse_fish_key("12").is_err());
        assert!(parse_fish_key(":COMMON").is_err());
        assert!(parse_fish_key("12:SHINY").is_err());
    }

    #[test]
    fn test_parse_feed_command() {
        let cli = Cli::try_parse_from(["bettactl", "--json", "feed", "5", "common", "--at", "99"])
            .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Feed {
                token_id,
                rarity,
                at,
            } => {
                assert_eq!(token_id, "5");
                assert_eq!(rarity, Rarity::Common);
                assert_eq!(at, Some(99));
            }
            _ => panic!("expected feed"),
        }
    }

    #[test]
    fn test_unknown_rarity_rejected_by_parser() {
        assert!(Cli::try_parse_from(["bettactl", "feed", "5", "golden"]).is_err());
    }
}
