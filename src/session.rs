//! Application session: engine + registry + widget + error recovery.
//!
//! [`VoiceSession`] is constructed once per application run and owns the
//! game engine, the command registry, and the widget connection lifecycle.
//! All command dispatch funnels through it so that the post-transition work
//! (scheduling the error recovery, refreshing the grounding context) happens
//! exactly once per committed state change rather than per UI refresh.

use crate::commands::{CommandDescriptor, CommandRegistry, CommandSpec};
use crate::config::VoiceConfig;
use crate::games::tictactoe::{Game, GameState, GameStatus, context};
use crate::widget::VoiceWidget;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Action name for starting a new game.
pub const START_TIC_TAC_TOE: &str = "start_tic_tac_toe";
/// Action name for resetting the game to idle.
pub const RESET_TIC_TAC_TOE: &str = "reset_tic_tac_toe";
/// Action name for a combined user + computer move.
pub const MAKE_TIC_TAC_TOE_MOVE: &str = "make_tic_tac_toe_move";

/// How long the transient error state lasts before auto-recovery.
pub const ERROR_RECOVERY_DELAY: Duration = Duration::from_millis(3000);

/// A single move inside a [`MovePayload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MoveRequest {
    /// 1-based board position. For the computer move, 0 means the game
    /// already ended and no counter-move is required.
    pub position: u32,
}

/// Payload of [`MAKE_TIC_TAC_TOE_MOVE`], as resolved by the voice channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovePayload {
    /// The user's spoken move (X), 1-9.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_move: Option<MoveRequest>,
    /// The voice AI's counter-move (O), 0-9 where 0 means no move.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computer_move: Option<MoveRequest>,
}

/// Whether the hosted widget is reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionStatus {
    /// Widget connection established.
    Connected,
    /// No widget connection; the application runs in manual mode.
    Disconnected,
}

struct RecoveryTask {
    epoch: u64,
    handle: JoinHandle<()>,
}

type RecoverySlot = Arc<Mutex<Option<RecoveryTask>>>;

/// One application session of the voice-driven game.
pub struct VoiceSession {
    game: Arc<Mutex<Game>>,
    registry: Arc<Mutex<CommandRegistry>>,
    widget: Arc<dyn VoiceWidget>,
    config: VoiceConfig,
    connection: ConnectionStatus,
    recovery: RecoverySlot,
}

impl VoiceSession {
    /// Creates a session and registers the game commands.
    ///
    /// The widget is not contacted yet; call [`VoiceSession::connect`].
    #[instrument(skip(widget, config))]
    pub fn new(widget: Arc<dyn VoiceWidget>, config: VoiceConfig) -> Self {
        info!("Creating voice session");
        let game = Arc::new(Mutex::new(Game::new()));
        let recovery: RecoverySlot = Arc::new(Mutex::new(None));

        let mut registry = CommandRegistry::new();
        registry.register(start_descriptor(&game, &recovery));
        registry.register(reset_descriptor(&game, &recovery));
        registry.register(move_descriptor(&game));

        Self {
            game,
            registry: Arc::new(Mutex::new(registry)),
            widget,
            config,
            connection: ConnectionStatus::Disconnected,
            recovery,
        }
    }

    /// Establishes the widget connection.
    ///
    /// Failure is not fatal: it is logged, the session stays
    /// [`ConnectionStatus::Disconnected`], and manual dispatch keeps working.
    /// There is no automatic retry.
    #[instrument(skip(self))]
    pub async fn connect(&mut self) {
        match self.widget.create(&self.config).await {
            Ok(connection) => {
                self.registry.lock().unwrap().attach(connection);
                self.connection = ConnectionStatus::Connected;
                info!("Voice widget connected, catalogue pushed");
            }
            Err(e) => {
                warn!(error = %e, "Failed to initialize voice widget, continuing in manual mode");
                self.connection = ConnectionStatus::Disconnected;
            }
        }
    }

    /// Tears down the current connection and reconnects with new parameters.
    ///
    /// Teardown runs before the new connection is established and its
    /// failures are swallowed.
    #[instrument(skip(self, config))]
    pub async fn reconfigure(&mut self, config: VoiceConfig) {
        info!("Configuration changed, recreating widget connection");
        self.teardown_connection();
        self.config = config;
        self.connect().await;
    }

    /// Releases the widget connection, best effort.
    #[instrument(skip(self))]
    pub fn shutdown(&mut self) {
        self.teardown_connection();
    }

    /// Routes an inbound invocation from the voice channel.
    ///
    /// Unknown actions and handler failures are contained by the registry;
    /// afterwards the session schedules error recovery if the engine entered
    /// the error state and refreshes the grounding context.
    #[instrument(skip(self, payload))]
    pub fn dispatch(&self, action: &str, payload: serde_json::Value) {
        self.registry.lock().unwrap().dispatch(action, payload);
        self.after_transition();
    }

    /// Starts a new game (button path).
    pub fn start(&self) {
        self.dispatch(START_TIC_TAC_TOE, json!({}));
    }

    /// Resets to idle (button path).
    pub fn reset(&self) {
        self.dispatch(RESET_TIC_TAC_TOE, json!({}));
    }

    /// Manual input path: a click on a 0-based board cell becomes a user
    /// move with no computer counter-move.
    #[instrument(skip(self))]
    pub fn click_cell(&self, index: usize) {
        if self.game.lock().unwrap().state().status() != GameStatus::Playing {
            debug!(index, "Cell click ignored, no game in progress");
            return;
        }
        self.dispatch(
            MAKE_TIC_TAC_TOE_MOVE,
            json!({ "userMove": { "position": index + 1 } }),
        );
    }

    /// Snapshot of the current game state.
    pub fn game_state(&self) -> GameState {
        self.game.lock().unwrap().state().clone()
    }

    /// The current externally visible command catalogue.
    pub fn catalogue(&self) -> Vec<CommandSpec> {
        self.registry.lock().unwrap().catalogue()
    }

    /// The widget connection status.
    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection
    }

    /// The active widget configuration.
    pub fn config(&self) -> &VoiceConfig {
        &self.config
    }

    fn after_transition(&self) {
        let (status, epoch) = {
            let game = self.game.lock().unwrap();
            (game.state().status(), game.epoch())
        };

        if status == GameStatus::Error && !self.recovery_pending(epoch) {
            self.schedule_recovery(epoch);
        }

        sync_grounding(&self.game, &self.registry);
    }

    fn recovery_pending(&self, epoch: u64) -> bool {
        self.recovery
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|task| task.epoch == epoch)
    }

    /// Schedules the delayed error recovery for the given game epoch.
    ///
    /// The task both holds an abort handle (cancelled by `start`/`reset`) and
    /// re-checks the epoch on firing, so a stale timer can never clear an
    /// error belonging to a different game epoch.
    #[instrument(skip(self))]
    fn schedule_recovery(&self, epoch: u64) {
        let game = Arc::clone(&self.game);
        let registry = Arc::clone(&self.registry);
        let recovery = Arc::clone(&self.recovery);

        debug!(epoch, delay_ms = ERROR_RECOVERY_DELAY.as_millis() as u64, "Scheduling error recovery");
        let handle = tokio::spawn(async move {
            tokio::time::sleep(ERROR_RECOVERY_DELAY).await;
            let recovered = game.lock().unwrap().clear_error(epoch);
            if recovered {
                sync_grounding(&game, &registry);
            }
            let mut slot = recovery.lock().unwrap();
            if slot.as_ref().is_some_and(|task| task.epoch == epoch) {
                *slot = None;
            }
        });

        let mut slot = self.recovery.lock().unwrap();
        if let Some(stale) = slot.take() {
            stale.handle.abort();
        }
        *slot = Some(RecoveryTask { epoch, handle });
    }

    fn teardown_connection(&mut self) {
        if let Some(mut connection) = self.registry.lock().unwrap().detach()
            && let Err(e) = connection.teardown()
        {
            warn!(error = %e, "Widget teardown failed, ignoring");
        }
        self.connection = ConnectionStatus::Disconnected;
    }
}

impl Drop for VoiceSession {
    fn drop(&mut self) {
        self.teardown_connection();
        cancel_recovery(&self.recovery);
    }
}

/// Re-registers the move command with a description rebuilt from current
/// state, which pushes the refreshed catalogue (and with it the grounding
/// context) to the widget.
fn sync_grounding(game: &Arc<Mutex<Game>>, registry: &Arc<Mutex<CommandRegistry>>) {
    let descriptor = move_descriptor(game);
    registry.lock().unwrap().register(descriptor);
}

fn cancel_recovery(recovery: &RecoverySlot) {
    if let Some(task) = recovery.lock().unwrap().take() {
        debug!(epoch = task.epoch, "Cancelling pending error recovery");
        task.handle.abort();
    }
}

fn start_descriptor(game: &Arc<Mutex<Game>>, recovery: &RecoverySlot) -> CommandDescriptor {
    let game = Arc::clone(game);
    let recovery = Arc::clone(recovery);
    CommandDescriptor::new(
        START_TIC_TAC_TOE,
        "Start a new tic-tac-toe game. User plays X and goes first.",
        empty_object_schema(),
        Box::new(move |_payload| {
            cancel_recovery(&recovery);
            game.lock().unwrap().start();
            Ok(())
        }),
    )
}

fn reset_descriptor(game: &Arc<Mutex<Game>>, recovery: &RecoverySlot) -> CommandDescriptor {
    let game = Arc::clone(game);
    let recovery = Arc::clone(recovery);
    CommandDescriptor::new(
        RESET_TIC_TAC_TOE,
        "Reset the tic-tac-toe game to start over",
        empty_object_schema(),
        Box::new(move |_payload| {
            cancel_recovery(&recovery);
            game.lock().unwrap().reset();
            Ok(())
        }),
    )
}

fn move_descriptor(game: &Arc<Mutex<Game>>) -> CommandDescriptor {
    let description = context::move_command_description(game.lock().unwrap().state());
    let game = Arc::clone(game);
    CommandDescriptor::new(
        MAKE_TIC_TAC_TOE_MOVE,
        description,
        schemars::schema_for!(MovePayload).to_value(),
        Box::new(move |payload| {
            let payload: MovePayload = serde_json::from_value(payload)?;
            let user = payload.user_move.map(|m| m.position);
            let computer = payload.computer_move.map(|m| m.position);
            if let Err(e) = game
                .lock()
                .unwrap()
                .process_combined_move(user, computer)
            {
                // The engine already recorded the transition; nothing to
                // surface to the voice channel.
                warn!(error = %e, "Move payload rejected");
            }
            Ok(())
        }),
    )
}

fn empty_object_schema() -> serde_json::Value {
    json!({ "type": "object", "properties": {} })
}
