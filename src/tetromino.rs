//! Tetromino definitions
//!
//! The 7 canonical shapes, each with a fixed color and a spawn-orientation
//! occupancy matrix.

use crate::piece::Shape;
use ratatui::style::Color;

/// The 7 tetromino types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TetrominoType {
    I, // Cyan - long bar
    O, // Yellow - square
    T, // Magenta - T-shape
    Z, // Red - Z-shape
    S, // Green - S-shape
    J, // Blue - J-shape
    L, // Orange - L-shape
}

impl TetrominoType {
    /// Get the color for this tetromino
    pub fn color(&self) -> Color {
        match self {
            TetrominoType::I => Color::Cyan,
            TetrominoType::O => Color::Yellow,
            TetrominoType::T => Color::Magenta,
            TetrominoType::Z => Color::Red,
            TetrominoType::S => Color::Green,
            TetrominoType::J => Color::Blue,
            TetrominoType::L => Color::Rgb(255, 165, 0), // Orange
        }
    }

    /// All tetromino types, in palette order
    pub fn all() -> [TetrominoType; 7] {
        [
            TetrominoType::I,
            TetrominoType::O,
            TetrominoType::T,
            TetrominoType::Z,
            TetrominoType::S,
            TetrominoType::J,
            TetrominoType::L,
        ]
    }

    /// Spawn-orientation occupancy matrix, rows top to bottom
    pub fn shape(&self) -> Shape {
        let rows: &[&[u8]] = match self {
            TetrominoType::I => &[&[1, 1, 1, 1]],
            TetrominoType::O => &[&[1, 1], &[1, 1]],
            TetrominoType::T => &[&[0, 1, 0], &[1, 1, 1]],
            TetrominoType::Z => &[&[1, 1, 0], &[0, 1, 1]],
            TetrominoType::S => &[&[0, 1, 1], &[1, 1, 0]],
            TetrominoType::J => &[&[1, 0, 0], &[1, 1, 1]],
            TetrominoType::L => &[&[0, 0, 1], &[1, 1, 1]],
        };
        rows.iter()
            .map(|row| row.iter().map(|&cell| cell != 0).collect())
            .collect()
    }
}
