//! Voiceplay - console demo
//!
//! Drives the full session stack (registry dispatch, grounding context,
//! error recovery) from the terminal, standing in for the voice channel.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command, ConfigAction};
use serde_json::json;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use voiceplay::{
    ConfigStore, GameStatus, LoggingWidget, MAKE_TIC_TAC_TOE_MOVE, VoiceConfig, VoiceSession,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Play { config } => run_play(config).await,
        Command::Catalogue => run_catalogue().await,
        Command::Config { action } => run_config(action),
    }
}

fn open_store(path: Option<std::path::PathBuf>) -> Result<ConfigStore> {
    Ok(match path {
        Some(path) => ConfigStore::new(path),
        None => ConfigStore::default_location()?,
    })
}

/// Interactive console play over the real dispatch path.
async fn run_play(config_path: Option<std::path::PathBuf>) -> Result<()> {
    let store = open_store(config_path)?;
    let config = store.current();
    info!(source = %store.source(), "Loaded widget configuration");

    let mut session = VoiceSession::new(Arc::new(LoggingWidget), config);
    session.connect().await;

    println!("voiceplay console demo");
    println!("commands: start | reset | move <user> [computer] | board | quit");
    render(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            [] => continue,
            ["quit"] | ["exit"] => break,
            ["start"] => session.start(),
            ["reset"] => session.reset(),
            ["board"] => {}
            ["move", user] => dispatch_move(&session, user, None),
            ["move", user, computer] => dispatch_move(&session, user, Some(computer)),
            _ => {
                println!("unrecognized command: {line}");
                continue;
            }
        }
        render(&session);
    }

    session.shutdown();
    Ok(())
}

fn dispatch_move(session: &VoiceSession, user: &str, computer: Option<&str>) {
    let Ok(user) = user.parse::<u32>() else {
        println!("user position must be a number");
        return;
    };
    let mut payload = json!({ "userMove": { "position": user } });
    if let Some(computer) = computer {
        let Ok(computer) = computer.parse::<u32>() else {
            println!("computer position must be a number");
            return;
        };
        payload["computerMove"] = json!({ "position": computer });
    }
    session.dispatch(MAKE_TIC_TAC_TOE_MOVE, payload);
}

fn render(session: &VoiceSession) {
    let state = session.game_state();
    println!("\n{}", state.board().display());
    match state.status() {
        GameStatus::Won => {
            let winner = state.winner().map(|m| m.to_string()).unwrap_or_default();
            println!("status: won ({winner})");
        }
        status => println!("status: {status}"),
    }
    if let Some(message) = state.last_error() {
        println!("note: {message}");
    }
    println!();
}

/// Prints the externally visible command catalogue.
async fn run_catalogue() -> Result<()> {
    let session = VoiceSession::new(Arc::new(LoggingWidget), VoiceConfig::from_env());
    println!("{}", serde_json::to_string_pretty(&session.catalogue())?);
    Ok(())
}

fn run_config(action: ConfigAction) -> Result<()> {
    let store = ConfigStore::default_location()?;
    match action {
        ConfigAction::Show => {
            let config = store.current();
            println!("source: {}", store.source());
            println!("app_url: {}", config.app_url());
            println!("language_code: {}", config.language_code());
            let key = if config.api_key().is_empty() { "(unset)" } else { "(set)" };
            println!("api_key: {key}");
        }
        ConfigAction::Set {
            api_key,
            app_url,
            language_code,
        } => {
            store.save_custom(&VoiceConfig::new(api_key, app_url, language_code))?;
            println!("saved custom configuration to {}", store.path().display());
        }
        ConfigAction::Clear => {
            store.clear_custom();
            println!("cleared custom configuration");
        }
    }
    Ok(())
}
