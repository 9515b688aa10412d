//! Game logic and rules for tic-tac-toe.

use super::types::{Board, Cell, GameState, GameStatus, Mark};
use derive_more::{Display, Error};
use tracing::{info, instrument, warn};

/// Sentinel position meaning "no computer move required" in a combined move.
pub const NO_COMPUTER_MOVE: u32 = 0;

/// Errors that can occur when applying a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum GameError {
    /// Position is outside the 1-9 range.
    #[display("Invalid position {position}: must be 1-9")]
    OutOfRange {
        /// The rejected 1-based position.
        position: u32,
    },
    /// Target cell already holds a mark.
    #[display("Position {position} is already occupied")]
    Occupied {
        /// The rejected 1-based position.
        position: u32,
    },
    /// A move was received while no game was in progress.
    #[display("Please start a new game first")]
    NotPlaying,
}

/// Tic-tac-toe game engine.
///
/// Owns the board and status and enforces move legality. Positions at this
/// boundary are **1-based** (1-9), matching what the voice channel resolves
/// from utterances; they map onto 0-based board slots 0-8.
///
/// The engine itself is synchronous. Entering [`GameStatus::Error`] bumps the
/// game epoch; the caller schedules the delayed recovery and passes the
/// captured epoch back to [`Game::clear_error`], so a recovery that was
/// superseded by a `start`/`reset` in the meantime is ignored as stale.
#[derive(Debug, Clone)]
pub struct Game {
    state: GameState,
    epoch: u64,
}

impl Game {
    /// Creates a new game in the idle state.
    #[instrument]
    pub fn new() -> Self {
        Self {
            state: GameState::new(),
            epoch: 0,
        }
    }

    /// Returns the current game state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Returns the current game epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Starts a new game: empty board, status `playing`.
    ///
    /// Idempotent; also supersedes any pending error recovery.
    #[instrument(skip(self))]
    pub fn start(&mut self) {
        info!("Starting new game: user (X) vs voice AI (O)");
        self.fresh_board(GameStatus::Playing);
    }

    /// Resets to the idle state: empty board, no game in progress.
    ///
    /// Always succeeds, from any state.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        info!("Game reset, returning to idle state");
        self.fresh_board(GameStatus::Idle);
    }

    fn fresh_board(&mut self, status: GameStatus) {
        self.state = GameState::new();
        self.state.set_status(status);
        self.epoch += 1;
    }

    /// Applies a single move at the given 1-based position.
    ///
    /// On failure the board is unchanged, status transitions to `error`, and
    /// the epoch is bumped so the caller can schedule a recovery.
    ///
    /// # Errors
    ///
    /// [`GameError::NotPlaying`] when no game is in progress (records the
    /// message without entering the error state), [`GameError::OutOfRange`]
    /// or [`GameError::Occupied`] for an illegal position.
    #[instrument(skip(self))]
    pub fn apply_move(&mut self, position: u32, mark: Mark) -> Result<GameStatus, GameError> {
        self.guard_playing()?;

        let mut board = self.state.board().clone();
        if let Err(e) = place(&mut board, position, mark) {
            self.enter_error(&e);
            return Err(e);
        }

        Ok(self.commit(board))
    }

    /// Processes a combined user + computer move payload.
    ///
    /// The user's move (X) is applied and evaluated first; if it ends the
    /// game the computer move is never applied, so the automated side cannot
    /// be credited with a move after the user has already won. A computer
    /// position of [`NO_COMPUTER_MOVE`] is an explicit no-op sentinel, and an
    /// absent computer move behaves identically.
    ///
    /// The payload commits atomically: if any contained move is illegal,
    /// nothing from the payload reaches the board.
    ///
    /// # Errors
    ///
    /// Same as [`Game::apply_move`], for whichever contained move failed.
    #[instrument(skip(self))]
    pub fn process_combined_move(
        &mut self,
        user: Option<u32>,
        computer: Option<u32>,
    ) -> Result<GameStatus, GameError> {
        self.guard_playing()?;

        let mut board = self.state.board().clone();

        if let Some(position) = user {
            if let Err(e) = place(&mut board, position, Mark::X) {
                warn!(position, error = %e, "User move rejected");
                self.enter_error(&e);
                return Err(e);
            }
            let (status, _, _) = evaluate(&board);
            if status != GameStatus::Playing {
                // User ended the game; the counter-move is dropped.
                return Ok(self.commit(board));
            }
        }

        match computer {
            None | Some(NO_COMPUTER_MOVE) => {}
            Some(position) => {
                if let Err(e) = place(&mut board, position, Mark::O) {
                    warn!(position, error = %e, "Computer move rejected, payload discarded");
                    self.enter_error(&e);
                    return Err(e);
                }
            }
        }

        Ok(self.commit(board))
    }

    /// Ordered 1-based positions of the empty cells.
    pub fn available_positions(&self) -> Vec<u32> {
        self.state.board().available_positions()
    }

    /// Recovers from the error state back to `playing`.
    ///
    /// Only acts when `epoch` matches the epoch captured when the error was
    /// entered and the status is still `error`; a stale firing (a new game
    /// started or reset in the meantime) is ignored. Returns whether the
    /// recovery was applied.
    #[instrument(skip(self), fields(current_epoch = self.epoch))]
    pub fn clear_error(&mut self, epoch: u64) -> bool {
        if self.epoch != epoch || self.state.status() != GameStatus::Error {
            return false;
        }
        info!("Error state recovered, resuming play");
        self.state.set_status(GameStatus::Playing);
        self.state.set_last_error(None);
        true
    }

    fn guard_playing(&mut self) -> Result<(), GameError> {
        if self.state.status() != GameStatus::Playing {
            let e = GameError::NotPlaying;
            warn!(status = %self.state.status(), "Move received while not playing");
            self.state.set_last_error(Some(e.to_string()));
            return Err(e);
        }
        Ok(())
    }

    fn enter_error(&mut self, error: &GameError) {
        self.state.set_status(GameStatus::Error);
        self.state.set_last_error(Some(error.to_string()));
        self.epoch += 1;
    }

    /// Replaces the board and re-derives status, winner, and winning line.
    fn commit(&mut self, board: Board) -> GameStatus {
        let (status, winner, line) = evaluate(&board);
        *self.state.board_mut() = board;
        self.state.set_status(status);
        self.state.set_outcome(winner, line);
        self.state.set_last_error(None);

        match status {
            GameStatus::Won => info!(winner = ?winner, ?line, "Game over: three in a line"),
            GameStatus::Draw => info!("Game over: draw"),
            _ => {}
        }
        status
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes a mark at the given 1-based position, validating range and vacancy.
fn place(board: &mut Board, position: u32, mark: Mark) -> Result<(), GameError> {
    if !(1..=9).contains(&position) {
        return Err(GameError::OutOfRange { position });
    }
    let index = (position - 1) as usize;
    if !board.is_empty(index) {
        return Err(GameError::Occupied { position });
    }
    board.set(index, Cell::Occupied(mark));
    Ok(())
}

/// Evaluates terminal conditions: win first, then draw, else still playing.
fn evaluate(board: &Board) -> (GameStatus, Option<Mark>, Option<[usize; 3]>) {
    if let Some((mark, line)) = board.winner() {
        return (GameStatus::Won, Some(mark), Some(line));
    }
    if board.is_full() {
        return (GameStatus::Draw, None, None);
    }
    (GameStatus::Playing, None, None)
}
