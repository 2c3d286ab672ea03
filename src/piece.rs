//! Active falling piece logic

use crate::board::{BOARD_WIDTH, Board};
use crate::collision::is_valid;
use crate::tetromino::TetrominoType;
use ratatui::style::Color;

/// Occupancy matrix of a piece, rows top to bottom
pub type Shape = Vec<Vec<bool>>;

/// Rotate a shape 90 degrees clockwise.
///
/// An R x C input yields a C x R output with `out[j][R-1-i] = in[i][j]`.
pub fn rotate(shape: &Shape) -> Shape {
    let rows = shape.len();
    let cols = shape.first().map_or(0, Vec::len);
    let mut rotated = vec![vec![false; rows]; cols];
    for (i, row) in shape.iter().enumerate() {
        for (j, &cell) in row.iter().enumerate() {
            rotated[j][rows - 1 - i] = cell;
        }
    }
    rotated
}

/// An active falling piece
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    /// The type of tetromino
    pub kind: TetrominoType,
    /// Current orientation
    pub shape: Shape,
    /// Board column of the shape's top-left cell
    pub x: i32,
    /// Board row of the shape's top-left cell
    pub y: i32,
}

impl Piece {
    /// Create a piece with its top-left cell at (x, y)
    pub fn new(kind: TetrominoType, x: i32, y: i32) -> Self {
        Self {
            kind,
            shape: kind.shape(),
            x,
            y,
        }
    }

    /// Create a piece at the spawn position: horizontally centered, row 0
    pub fn spawn(kind: TetrominoType) -> Self {
        let width = kind.shape()[0].len() as i32;
        Self::new(kind, BOARD_WIDTH as i32 / 2 - width / 2, 0)
    }

    pub fn color(&self) -> Color {
        self.kind.color()
    }

    /// Absolute (row, col) of every occupied cell
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape.iter().enumerate().flat_map(move |(i, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, occupied)| **occupied)
                .map(move |(j, _)| (self.y + i as i32, self.x + j as i32))
        })
    }

    /// Whether any occupied cell sits above the visible board
    pub fn is_above_top(&self) -> bool {
        self.cells().any(|(row, _)| row < 0)
    }

    /// Translate by (dx, dy), reverting if the result is invalid
    pub fn try_shift(&mut self, dx: i32, dy: i32, board: &Board) -> bool {
        self.x += dx;
        self.y += dy;
        if is_valid(board, self) {
            true
        } else {
            self.x -= dx;
            self.y -= dy;
            false
        }
    }

    /// Rotate clockwise in place, keeping the old shape if the rotated one
    /// does not fit. No kicks are attempted.
    pub fn try_rotate(&mut self, board: &Board) -> bool {
        let rotated = rotate(&self.shape);
        let original = std::mem::replace(&mut self.shape, rotated);
        if is_valid(board, self) {
            true
        } else {
            self.shape = original;
            false
        }
    }

    /// Drop until the next row down is invalid, returning the distance
    pub fn hard_drop(&mut self, board: &Board) -> i32 {
        let start = self.y;
        while is_valid(board, self) {
            self.y += 1;
        }
        self.y -= 1;
        self.y - start
    }
}
