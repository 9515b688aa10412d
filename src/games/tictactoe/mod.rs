//! Tic-tac-toe: types, rules, and NLU grounding context.

pub mod context;
mod rules;
mod types;

pub use rules::{Game, GameError, NO_COMPUTER_MOVE};
pub use types::{Board, Cell, GameState, GameStatus, Mark, WINNING_LINES};
