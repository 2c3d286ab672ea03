//! Game board representation

use ratatui::style::Color;

/// Board dimensions, fixed for every session
pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;

/// A cell on the board - either empty or filled with a color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled(Color),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, Cell::Filled(_))
    }
}

/// The grid of locked cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Grid stored as [row][col], row 0 is the top, row increases downward
    cells: [[Cell; BOARD_WIDTH]; BOARD_HEIGHT],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [[Cell::Empty; BOARD_WIDTH]; BOARD_HEIGHT],
        }
    }

    fn index(row: i32, col: i32) -> Option<(usize, usize)> {
        if row < 0 || col < 0 {
            return None;
        }
        let (row, col) = (row as usize, col as usize);
        if row >= BOARD_HEIGHT || col >= BOARD_WIDTH {
            return None;
        }
        Some((row, col))
    }

    /// Get the cell at a position (row, col)
    /// Returns None if out of bounds
    pub fn get(&self, row: i32, col: i32) -> Option<Cell> {
        Self::index(row, col).map(|(r, c)| self.cells[r][c])
    }

    /// Whether a locked cell occupies (row, col); None when out of range
    pub fn is_occupied(&self, row: i32, col: i32) -> Option<bool> {
        self.get(row, col).map(|cell| cell.is_filled())
    }

    /// Set a cell at a position
    /// Returns false if out of bounds
    pub fn set(&mut self, row: i32, col: i32, cell: Cell) -> bool {
        match Self::index(row, col) {
            Some((r, c)) => {
                self.cells[r][c] = cell;
                true
            }
            None => false,
        }
    }

    /// True iff every column of the row is filled
    pub fn is_row_complete(&self, row: usize) -> bool {
        row < BOARD_HEIGHT && self.cells[row].iter().all(|cell| cell.is_filled())
    }

    /// Remove a row, shift every row above it down by one and put a fresh
    /// empty row at the top
    pub fn clear_row(&mut self, row: usize) {
        if row >= BOARD_HEIGHT {
            return;
        }
        for r in (1..=row).rev() {
            self.cells[r] = self.cells[r - 1];
        }
        self.cells[0] = [Cell::Empty; BOARD_WIDTH];
    }

    /// Check if the board is completely empty
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.cells
            .iter()
            .all(|row| row.iter().all(|cell| cell.is_empty()))
    }

    /// Iterate rows top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Cell; BOARD_WIDTH]> {
        self.cells.iter()
    }
}
