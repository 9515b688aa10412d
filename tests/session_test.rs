//! Tests for the voice session: wiring, grounding context, error recovery.

use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use voiceplay::{
    Cell, CommandSpec, ConnectionError, ConnectionStatus, GameStatus, MAKE_TIC_TAC_TOE_MOVE, Mark,
    RESET_TIC_TAC_TOE, START_TIC_TAC_TOE, VoiceConfig, VoiceSession, VoiceWidget, WidgetConnection,
};

type PushLog = Arc<Mutex<Vec<Vec<CommandSpec>>>>;

struct RecordingConnection {
    log: PushLog,
}

impl WidgetConnection for RecordingConnection {
    fn set_commands(&mut self, catalogue: &[CommandSpec]) {
        self.log.lock().unwrap().push(catalogue.to_vec());
    }

    fn teardown(&mut self) -> Result<(), ConnectionError> {
        Ok(())
    }
}

#[derive(Default)]
struct StubWidget {
    log: PushLog,
}

#[async_trait]
impl VoiceWidget for StubWidget {
    async fn create(
        &self,
        _config: &VoiceConfig,
    ) -> Result<Box<dyn WidgetConnection>, ConnectionError> {
        Ok(Box::new(RecordingConnection {
            log: Arc::clone(&self.log),
        }))
    }
}

struct FailingWidget;

#[async_trait]
impl VoiceWidget for FailingWidget {
    async fn create(
        &self,
        _config: &VoiceConfig,
    ) -> Result<Box<dyn WidgetConnection>, ConnectionError> {
        Err(ConnectionError::new("widget unreachable"))
    }
}

async fn connected_session() -> (VoiceSession, PushLog) {
    let widget = Arc::new(StubWidget::default());
    let log = Arc::clone(&widget.log);
    let mut session = VoiceSession::new(widget, VoiceConfig::default());
    session.connect().await;
    (session, log)
}

/// Lets spawned tasks (the recovery timer) run after a time advance.
async fn drain_tasks() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_connect_pushes_catalogue() {
    let (session, log) = connected_session().await;

    assert_eq!(session.connection_status(), ConnectionStatus::Connected);
    let pushes = log.lock().unwrap();
    assert!(!pushes.is_empty());
    let actions: Vec<&str> = pushes[0].iter().map(|s| s.action.as_str()).collect();
    assert!(actions.contains(&START_TIC_TAC_TOE));
    assert!(actions.contains(&RESET_TIC_TAC_TOE));
    assert!(actions.contains(&MAKE_TIC_TAC_TOE_MOVE));
}

#[tokio::test]
async fn test_connection_failure_degrades_to_manual_mode() {
    let mut session = VoiceSession::new(Arc::new(FailingWidget), VoiceConfig::default());
    session.connect().await;

    assert_eq!(session.connection_status(), ConnectionStatus::Disconnected);

    // Manual mode keeps working without a widget.
    session.start();
    assert_eq!(session.game_state().status(), GameStatus::Playing);
    session.click_cell(4);
    assert_eq!(
        session.game_state().board().get(4),
        Some(Cell::Occupied(Mark::X))
    );
}

#[tokio::test]
async fn test_voice_commands_drive_the_game() {
    let (session, _log) = connected_session().await;

    session.dispatch(START_TIC_TAC_TOE, json!({}));
    assert_eq!(session.game_state().status(), GameStatus::Playing);

    session.dispatch(
        MAKE_TIC_TAC_TOE_MOVE,
        json!({ "userMove": { "position": 5 }, "computerMove": { "position": 0 } }),
    );
    let state = session.game_state();
    assert_eq!(state.status(), GameStatus::Playing);
    assert_eq!(state.board().get(4), Some(Cell::Occupied(Mark::X)));
    assert_eq!(state.board().available_positions().len(), 8);

    session.dispatch(RESET_TIC_TAC_TOE, json!({}));
    assert_eq!(session.game_state().status(), GameStatus::Idle);
}

#[tokio::test]
async fn test_unknown_action_leaves_state_untouched() {
    let (session, _log) = connected_session().await;
    session.start();

    session.dispatch("order_pizza", json!({ "size": "large" }));
    assert_eq!(session.game_state().status(), GameStatus::Playing);
}

#[tokio::test]
async fn test_malformed_payload_is_contained() {
    let (session, _log) = connected_session().await;
    session.start();

    session.dispatch(MAKE_TIC_TAC_TOE_MOVE, json!({ "userMove": { "position": "five" } }));

    let state = session.game_state();
    assert_eq!(state.status(), GameStatus::Playing);
    assert!(state.board().cells().iter().all(|c| *c == Cell::Empty));
}

#[tokio::test]
async fn test_grounding_context_tracks_state() {
    let (session, log) = connected_session().await;
    session.start();
    session.dispatch(
        MAKE_TIC_TAC_TOE_MOVE,
        json!({ "userMove": { "position": 5 }, "computerMove": { "position": 1 } }),
    );

    let description = session
        .catalogue()
        .into_iter()
        .find(|s| s.action == MAKE_TIC_TAC_TOE_MOVE)
        .unwrap()
        .description;

    assert!(description.contains("[O,2,3,4,X,6,7,8,9]"), "got: {description}");
    assert!(description.contains("Available positions: [2,3,4,6,7,8,9]"));
    assert!(description.contains("Game status: playing"));

    // The refreshed catalogue also reached the widget.
    let pushes = log.lock().unwrap();
    let last = pushes.last().unwrap();
    let pushed = last
        .iter()
        .find(|s| s.action == MAKE_TIC_TAC_TOE_MOVE)
        .unwrap();
    assert!(pushed.description.contains("[O,2,3,4,X,6,7,8,9]"));
}

#[tokio::test(start_paused = true)]
async fn test_invalid_move_recovers_after_exactly_three_seconds() {
    let (session, _log) = connected_session().await;
    session.start();

    session.dispatch(
        MAKE_TIC_TAC_TOE_MOVE,
        json!({ "userMove": { "position": 99 } }),
    );
    let state = session.game_state();
    assert_eq!(state.status(), GameStatus::Error);
    assert!(state.last_error().unwrap().contains("Invalid position"));
    // Let the recovery task register its timer before moving the clock.
    drain_tasks().await;

    // One millisecond early: still in the error state.
    tokio::time::advance(Duration::from_millis(2999)).await;
    drain_tasks().await;
    assert_eq!(session.game_state().status(), GameStatus::Error);

    // Crossing the 3000 ms mark recovers and clears the message.
    tokio::time::advance(Duration::from_millis(2)).await;
    drain_tasks().await;
    let state = session.game_state();
    assert_eq!(state.status(), GameStatus::Playing);
    assert_eq!(state.last_error(), None);
}

#[tokio::test(start_paused = true)]
async fn test_reset_cancels_pending_recovery() {
    let (session, _log) = connected_session().await;
    session.start();

    session.dispatch(
        MAKE_TIC_TAC_TOE_MOVE,
        json!({ "userMove": { "position": 99 } }),
    );
    assert_eq!(session.game_state().status(), GameStatus::Error);
    drain_tasks().await;

    session.reset();
    assert_eq!(session.game_state().status(), GameStatus::Idle);

    // The stale timer must not resurrect a playing state.
    tokio::time::advance(Duration::from_millis(5000)).await;
    drain_tasks().await;
    assert_eq!(session.game_state().status(), GameStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_new_game_supersedes_pending_recovery() {
    let (session, _log) = connected_session().await;
    session.start();

    session.dispatch(
        MAKE_TIC_TAC_TOE_MOVE,
        json!({ "userMove": { "position": 99 } }),
    );
    assert_eq!(session.game_state().status(), GameStatus::Error);
    drain_tasks().await;

    session.start();
    assert_eq!(session.game_state().status(), GameStatus::Playing);

    tokio::time::advance(Duration::from_millis(5000)).await;
    drain_tasks().await;
    // Still the fresh game, untouched by the old epoch's timer.
    let state = session.game_state();
    assert_eq!(state.status(), GameStatus::Playing);
    assert_eq!(state.last_error(), None);
}

#[tokio::test]
async fn test_click_cell_is_ignored_while_idle() {
    let (session, _log) = connected_session().await;

    session.click_cell(4);
    assert_eq!(session.game_state().status(), GameStatus::Idle);
    assert!(session.game_state().board().is_empty(4));
}

#[tokio::test]
async fn test_reconfigure_recreates_connection() {
    let (mut session, log) = connected_session().await;
    let before = log.lock().unwrap().len();

    session
        .reconfigure(VoiceConfig::new("key", "https://example.test/app", "en-US"))
        .await;

    assert_eq!(session.connection_status(), ConnectionStatus::Connected);
    assert_eq!(session.config().api_key(), "key");
    // The new connection received a fresh catalogue push.
    assert!(log.lock().unwrap().len() > before);
}
