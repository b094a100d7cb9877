//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod proposals;
mod repair;
mod scrape;
mod selectors;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{Config, Settings};
use crate::selectors::SelectorField;

#[derive(Parser)]
#[command(name = "stc")]
#[command(about = "Scrape x.com reply threads and extract the proposals they make")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory for selectors and scraped threads (overrides config and STC_DATA_DIR)
    #[arg(long, short = 'd', global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the replies of a post (cached unless --refresh)
    Scrape {
        /// Post URL, e.g. https://x.com/<username>/status/<id>
        url: String,
        /// Ignore the cache and scrape again
        #[arg(short, long)]
        refresh: bool,
    },

    /// Scrape a post and extract what its replies propose
    Proposals {
        /// Post URL, e.g. https://x.com/<username>/status/<id>
        url: String,
        /// Kind of entity to extract, e.g. "ministers"
        #[arg(short, long)]
        subject: String,
        /// Model to use instead of the one configured via LLM_MODEL
        #[arg(short, long)]
        model: Option<String>,
        /// Ignore the cache and scrape again
        #[arg(short, long)]
        refresh: bool,
    },

    /// Re-derive selectors from the reference post
    Repair {
        /// Class attribute of a reply container on the live site
        container_class: String,
    },

    /// Inspect or edit the stored selectors
    Selectors {
        #[command(subcommand)]
        command: SelectorCommands,
    },
}

#[derive(Subcommand)]
enum SelectorCommands {
    /// Show the stored selectors
    Show,
    /// Set one selector by hand
    Set {
        /// reply_container, author or body
        field: SelectorField,
        /// CSS selector
        value: String,
    },
}

/// Load config from an explicit path or by discovery.
async fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from_path(&path)
            .await
            .map_err(anyhow::Error::msg),
        None => Ok(Config::load().await),
    }
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config).await?;
    let settings = Settings::resolve(config, cli.data_dir);
    settings.ensure_directories()?;

    match cli.command {
        Commands::Scrape { url, refresh } => scrape::cmd_scrape(&settings, &url, refresh).await,
        Commands::Proposals {
            url,
            subject,
            model,
            refresh,
        } => proposals::cmd_proposals(&settings, &url, &subject, model, refresh).await,
        Commands::Repair { container_class } => {
            repair::cmd_repair(&settings, &container_class).await
        }
        Commands::Selectors { command } => match command {
            SelectorCommands::Show => selectors::cmd_selectors_show(&settings),
            SelectorCommands::Set { field, value } => {
                selectors::cmd_selectors_set(&settings, field, &value)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_proposals_command() {
        let cli = Cli::try_parse_from([
            "stc",
            "-v",
            "proposals",
            "https://x.com/a/status/1",
            "--subject",
            "ministers",
            "--model",
            "qwen2.5:7b",
            "--refresh",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Proposals {
                url,
                subject,
                model,
                refresh,
            } => {
                assert_eq!(url, "https://x.com/a/status/1");
                assert_eq!(subject, "ministers");
                assert_eq!(model.as_deref(), Some("qwen2.5:7b"));
                assert!(refresh);
            }
            _ => panic!("expected proposals command"),
        }
    }

    #[test]
    fn test_selector_field_argument() {
        let cli = Cli::try_parse_from(["stc", "selectors", "set", "body", "div > span"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Selectors {
                command: SelectorCommands::Set {
                    field: SelectorField::Body,
                    ..
                }
            }
        ));
        assert!(Cli::try_parse_from(["stc", "selectors", "set", "nope", "x"]).is_err());
    }
}
