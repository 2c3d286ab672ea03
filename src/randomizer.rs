//! Piece selection
//!
//! Each spawn draws uniformly from the 7 tetrominoes. The source of pieces is
//! a trait so the game can be driven by a fixed seed or a scripted sequence.

use crate::tetromino::TetrominoType;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Supplies the next piece kind on every spawn
pub trait PieceSource {
    fn next_piece(&mut self) -> TetrominoType;
}

/// Uniform random piece source backed by a seedable PRNG
#[derive(Debug, Clone)]
pub struct Randomizer {
    rng: ChaCha8Rng,
}

impl Default for Randomizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Randomizer {
    /// Create a randomizer with a random seed
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Create a randomizer with a fixed seed (reproducible sequence)
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl PieceSource for Randomizer {
    fn next_piece(&mut self) -> TetrominoType {
        let all = TetrominoType::all();
        all[self.rng.gen_range(0..all.len())]
    }
}

/// Cycles through a fixed list of pieces
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct Scripted {
    pieces: Vec<TetrominoType>,
    next: usize,
}

#[cfg(test)]
impl Scripted {
    pub fn new(pieces: Vec<TetrominoType>) -> Self {
        assert!(!pieces.is_empty());
        Self { pieces, next: 0 }
    }
}

#[cfg(test)]
impl PieceSource for Scripted {
    fn next_piece(&mut self) -> TetrominoType {
        let piece = self.pieces[self.next % self.pieces.len()];
        self.next += 1;
        piece
    }
}
