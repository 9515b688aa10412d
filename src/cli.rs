//! Command-line interface for the voiceplay demo.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Voiceplay - voice-driven tic-tac-toe demo core
#[derive(Parser, Debug)]
#[command(name = "voiceplay")]
#[command(about = "Voice-command game core with an NLU command registry", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play interactively in the console (manual dispatch path)
    Play {
        /// Path to the persisted widget configuration (defaults to the
        /// platform config directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the current command catalogue as JSON
    Catalogue,

    /// Inspect or update the persisted widget configuration
    Config {
        /// Configuration action
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the active configuration and its source
    Show,

    /// Save a custom configuration
    Set {
        /// Widget API key
        #[arg(long)]
        api_key: String,

        /// Hosted application URL
        #[arg(long)]
        app_url: String,

        /// Language code
        #[arg(long, default_value = "en-US")]
        language_code: String,
    },

    /// Clear the custom configuration, reverting to defaults
    Clear,
}
