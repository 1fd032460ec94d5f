//! Board logic: pure win/tie classification of a 3×3 grid.

use crosswire_protocol::{Board, GameOutcome, Mark};

/// The eight winning triples, in evaluation order: rows, then columns,
/// then diagonals. Indices are row-major into the board.
pub const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Classifies a board position.
///
/// Returns `Win` for the first triple whose three cells hold the same
/// mark (the order is fixed, and a cell holds at most one mark, so two
/// patterns can never disagree on the winner), `Tie` when no empty cell
/// remains, and `None` while the game is still open.
pub fn evaluate(board: &Board) -> Option<GameOutcome> {
    for [a, b, c] in WIN_LINES {
        if let Some(mark) = board[a] {
            if board[b] == Some(mark) && board[c] == Some(mark) {
                return Some(GameOutcome::Win { mark });
            }
        }
    }

    if board.iter().all(Option::is_some) {
        return Some(GameOutcome::Tie);
    }

    None
}
