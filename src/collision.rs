//! Placement validation of a piece against the board

use crate::board::{BOARD_HEIGHT, BOARD_WIDTH, Board};
use crate::piece::Piece;

/// Check that every occupied cell of the piece is a legal position.
///
/// Columns must lie in `[0, BOARD_WIDTH)` and rows below `BOARD_HEIGHT`.
/// Cells above the top edge (negative row) never collide with locked cells,
/// which is what lets a piece sit partly above the board.
pub fn is_valid(board: &Board, piece: &Piece) -> bool {
    piece.cells().all(|(row, col)| {
        if col < 0 || col >= BOARD_WIDTH as i32 || row >= BOARD_HEIGHT as i32 {
            return false;
        }
        row < 0 || board.is_occupied(row, col) == Some(false)
    })
}
