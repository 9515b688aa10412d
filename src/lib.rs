//! Voiceplay - voice-driven tic-tac-toe core
//!
//! This library implements the core of a voice-controlled demo application:
//! a tic-tac-toe game engine and a custom-command registry kept in sync with
//! an externally hosted voice/NLU widget.
//!
//! # Architecture
//!
//! - **Game engine**: pure state machine owning the 9-cell board, status,
//!   and win-line detection ([`Game`])
//! - **Command registry**: catalogue of named, schema-described actions the
//!   voice channel can invoke ([`CommandRegistry`])
//! - **Widget**: capability traits over the hosted voice platform
//!   ([`VoiceWidget`], [`WidgetConnection`])
//! - **Session**: per-run wiring of engine, registry, connection lifecycle,
//!   and the transient-error recovery timer ([`VoiceSession`])
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use voiceplay::{LoggingWidget, VoiceConfig, VoiceSession};
//!
//! # async fn example() {
//! let mut session = VoiceSession::new(Arc::new(LoggingWidget), VoiceConfig::from_env());
//! session.connect().await;
//! session.start();
//! session.dispatch(
//!     voiceplay::MAKE_TIC_TAC_TOE_MOVE,
//!     serde_json::json!({ "userMove": { "position": 5 }, "computerMove": { "position": 1 } }),
//! );
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod commands;
mod config;
mod games;
mod session;
mod widget;

// Crate-level exports - command registry
pub use commands::{CommandDescriptor, CommandHandler, CommandRegistry, CommandSpec};

// Crate-level exports - configuration
pub use config::{
    ConfigError, ConfigSource, ConfigStore, DEFAULT_LANGUAGE_CODE, ENV_API_KEY, ENV_APP_URL,
    ENV_LANGUAGE_CODE, VoiceConfig,
};

// Crate-level exports - session
pub use session::{
    ConnectionStatus, ERROR_RECOVERY_DELAY, MAKE_TIC_TAC_TOE_MOVE, MovePayload, MoveRequest,
    RESET_TIC_TAC_TOE, START_TIC_TAC_TOE, VoiceSession,
};

// Crate-level exports - widget capability
pub use widget::{ConnectionError, LoggingConnection, LoggingWidget, VoiceWidget, WidgetConnection};

// Crate-level exports - game types (tic-tac-toe)
pub use games::tictactoe::{
    Board, Cell, Game, GameError, GameState, GameStatus, Mark, NO_COMPUTER_MOVE, WINNING_LINES,
    context,
};
