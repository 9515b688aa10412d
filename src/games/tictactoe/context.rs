//! Grounding context sent to the external NLU.
//!
//! The voice platform resolves utterances like "take the corner" against a
//! textual snapshot of the current board, so the snapshot is regenerated on
//! every committed state change and shipped inside the move command's
//! description.

use super::types::{Cell, GameState, GameStatus};

/// Comma-joined board line: numbers for empty slots, X/O for occupied.
///
/// Example: `X,2,O,4,5,6,7,8,9`.
pub fn board_line(state: &GameState) -> String {
    state
        .board()
        .cells()
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell {
            Cell::Empty => (i + 1).to_string(),
            Cell::Occupied(mark) => mark.to_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Comma-joined available 1-based positions, or `none` when the board is full.
pub fn available_line(state: &GameState) -> String {
    let available = state.board().available_positions();
    if available.is_empty() {
        "none".to_string()
    } else {
        available
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Full description for the move command, embedding the board snapshot.
pub fn move_command_description(state: &GameState) -> String {
    let playing = state.status() == GameStatus::Playing;
    let instructions = if playing {
        "You must provide both the user's move and then your move as the \
         computer opponent. If the user wins, then return 0 as the spot. \
         Choose strategic moves to try to win or block the user from winning."
    } else {
        "Game is not in playing state, moves cannot be made."
    };

    format!(
        "Make a move in tic-tac-toe game.\n\
         Board positions: 1=top-left, 2=top-middle, 3=top-right,\n\
         4=middle-left, 5=center, 6=middle-right,\n\
         7=bottom-left, 8=bottom-middle, 9=bottom-right.\n\
         Current board state: [{board}] where numbers are empty positions, \
         X is user, O is computer.\n\
         Available positions: [{available}].\n\
         User is X (plays first), computer is O.\n\
         Game status: {status}.\n\
         {instructions}",
        board = board_line(state),
        available = available_line(state),
        status = state.status(),
    )
}
