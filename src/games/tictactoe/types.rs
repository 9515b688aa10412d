//! Core domain types for tic-tac-toe.

use serde::{Deserialize, Serialize};

/// A mark placed on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum Mark {
    /// The human player (goes first).
    X,
    /// The automated opponent.
    O,
}

impl Mark {
    /// Returns the opposing mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// A cell on the tic-tac-toe board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// Empty cell.
    Empty,
    /// Cell occupied by a mark.
    Occupied(Mark),
}

/// The 8 winning triples of a 3x3 board: rows, columns, diagonals.
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// 3x3 tic-tac-toe board.
///
/// Cells are stored in row-major order: index 0 is the top-left corner,
/// index 8 the bottom-right.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: [Cell; 9],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; 9],
        }
    }

    /// Gets the cell at the given index (0-8).
    pub fn get(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    /// Sets the cell at the given index.
    pub(super) fn set(&mut self, index: usize, cell: Cell) {
        self.cells[index] = cell;
    }

    /// Checks if a cell is empty.
    pub fn is_empty(&self, index: usize) -> bool {
        matches!(self.get(index), Some(Cell::Empty))
    }

    /// Checks if every cell is occupied.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|c| *c != Cell::Empty)
    }

    /// Returns all cells as a slice.
    pub fn cells(&self) -> &[Cell; 9] {
        &self.cells
    }

    /// Finds a completed winning triple, if any.
    ///
    /// When a single move completes more than one line, the first match in
    /// declaration order (rows, columns, diagonals) is reported.
    pub fn winner(&self) -> Option<(Mark, [usize; 3])> {
        for line in WINNING_LINES {
            let [a, b, c] = line;
            if let Cell::Occupied(mark) = self.cells[a]
                && self.cells[a] == self.cells[b]
                && self.cells[b] == self.cells[c]
            {
                return Some((mark, line));
            }
        }
        None
    }

    /// Ordered 1-based positions of the empty cells.
    ///
    /// Returns an empty vec (never a sentinel) when no positions remain.
    pub fn available_positions(&self) -> Vec<u32> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == Cell::Empty)
            .map(|(i, _)| i as u32 + 1)
            .collect()
    }

    /// Formats the board as a 3x3 grid for logs and the console demo.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                let index = row * 3 + col;
                let symbol = match self.cells[index] {
                    Cell::Empty => (index + 1).to_string(),
                    Cell::Occupied(mark) => mark.to_string(),
                };
                result.push_str(&symbol);
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Current status of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// No game in progress yet.
    Idle,
    /// Game is ongoing, moves are accepted.
    Playing,
    /// Game ended with a winner.
    Won,
    /// Game ended with a full board and no winner.
    Draw,
    /// An invalid move was received; auto-recovers after a fixed delay.
    Error,
}

/// Complete game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// The board.
    board: Board,
    /// Game status.
    status: GameStatus,
    /// Winning mark, set only while status is [`GameStatus::Won`].
    winner: Option<Mark>,
    /// Winning triple (0-based indices), set only while status is [`GameStatus::Won`].
    winning_line: Option<[usize; 3]>,
    /// Transient error message shown to the user.
    last_error: Option<String>,
}

impl GameState {
    /// Creates a new idle game state.
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            status: GameStatus::Idle,
            winner: None,
            winning_line: None,
            last_error: None,
        }
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the game status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Returns the winning mark, if the game has been won.
    pub fn winner(&self) -> Option<Mark> {
        self.winner
    }

    /// Returns the winning triple, if the game has been won.
    pub fn winning_line(&self) -> Option<[usize; 3]> {
        self.winning_line
    }

    /// Returns the transient error message, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub(super) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub(super) fn set_status(&mut self, status: GameStatus) {
        self.status = status;
    }

    pub(super) fn set_outcome(&mut self, winner: Option<Mark>, line: Option<[usize; 3]>) {
        self.winner = winner;
        self.winning_line = line;
    }

    pub(super) fn set_last_error(&mut self, message: Option<String>) {
        self.last_error = message;
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
