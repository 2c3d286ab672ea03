//! Score and gravity progression

use std::time::Duration;

/// Points awarded for each cleared line, no combo bonus
pub const POINTS_PER_LINE: u32 = 100;
/// Gravity interval at the start of a round
pub const INITIAL_DELAY: Duration = Duration::from_millis(500);
/// Factor applied to the gravity interval per cleared line
pub const DELAY_DECAY: f64 = 0.95;

/// Per-round score tracking
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    /// Current score
    pub points: u32,
    /// Total lines cleared
    pub lines: u32,
    /// Current gravity interval
    delay: Duration,
}

impl Default for Score {
    fn default() -> Self {
        Self::new()
    }
}

impl Score {
    pub fn new() -> Self {
        Self {
            points: 0,
            lines: 0,
            delay: INITIAL_DELAY,
        }
    }

    /// Account for one cleared line: add points and speed up gravity
    pub fn add_line(&mut self) {
        self.points += POINTS_PER_LINE;
        self.lines += 1;
        self.delay = self.delay.mul_f64(DELAY_DECAY);
    }

    /// Time between gravity steps
    pub fn fall_delay(&self) -> Duration {
        self.delay
    }
}
