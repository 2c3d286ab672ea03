//! Core game state and logic

use crate::board::{BOARD_HEIGHT, Board, Cell};
use crate::collision::is_valid;
use crate::ledger::{GameResult, Ledger, Outcome};
use crate::menu::{Menu, MenuAction};
use crate::piece::Piece;
use crate::randomizer::PieceSource;
use crate::score::Score;
use std::time::Duration;

/// Game state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    MainMenu,
    Rating,
    Playing,
    Paused,
    GameOver,
    GameWon,
}

/// Input actions the game can process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    SoftDrop,
    HardDrop,
    Rotate,
    Pause,
    ToggleResults,
    Restart,
    MenuUp,
    MenuDown,
    Select,
    /// Pick a menu item directly (mouse click)
    SelectItem(usize),
    Back,
    Quit,
}

/// The main game struct
pub struct Game {
    /// The game board
    pub board: Board,
    /// Current falling piece, None before the first round
    pub current_piece: Option<Piece>,
    /// Score and gravity interval
    pub score: Score,
    /// Current game state
    pub state: GameState,
    /// Main menu cursor
    pub menu: Menu,
    /// Best-results overlay visible
    pub show_results: bool,
    /// Last persistence problem, shown to the player
    pub status: Option<String>,
    ledger: Ledger,
    source: Box<dyn PieceSource>,
    /// Time accumulated since the last gravity step
    elapsed: Duration,
    /// Set once a terminal outcome has been recorded for this round
    finished: bool,
    quit_requested: bool,
}

impl Game {
    /// Create a game sitting in the main menu
    pub fn new(source: Box<dyn PieceSource>, ledger: Ledger) -> Self {
        Self {
            board: Board::new(),
            current_piece: None,
            score: Score::new(),
            state: GameState::MainMenu,
            menu: Menu::new(),
            show_results: false,
            status: None,
            ledger,
            source,
            elapsed: Duration::ZERO,
            finished: false,
            quit_requested: false,
        }
    }

    /// Ranked past results
    pub fn results(&self) -> &[GameResult] {
        self.ledger.entries()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Process an action
    pub fn process_action(&mut self, action: Action) {
        if action == Action::Quit {
            self.quit_requested = true;
            return;
        }

        match self.state {
            GameState::MainMenu => match action {
                Action::MenuUp => self.menu.move_up(),
                Action::MenuDown => self.menu.move_down(),
                Action::Select => self.activate(self.menu.selected_action()),
                Action::SelectItem(index) => {
                    if self.menu.select_index(index) {
                        self.activate(self.menu.selected_action());
                    }
                }
                _ => {}
            },
            GameState::Rating => {
                if matches!(action, Action::Back | Action::Select | Action::SelectItem(_)) {
                    self.state = GameState::MainMenu;
                }
            }
            GameState::Playing => match action {
                Action::MoveLeft => self.shift(-1),
                Action::MoveRight => self.shift(1),
                Action::SoftDrop => self.step_down(),
                Action::HardDrop => self.hard_drop(),
                Action::Rotate => {
                    if let Some(piece) = &mut self.current_piece {
                        piece.try_rotate(&self.board);
                    }
                }
                Action::Pause => self.state = GameState::Paused,
                Action::ToggleResults => self.show_results = !self.show_results,
                Action::Restart => self.start_round(),
                _ => {}
            },
            GameState::Paused => match action {
                Action::Pause => self.state = GameState::Playing,
                Action::ToggleResults => self.show_results = !self.show_results,
                Action::Restart => self.start_round(),
                _ => {}
            },
            GameState::GameOver | GameState::GameWon => match action {
                Action::ToggleResults => self.show_results = !self.show_results,
                Action::Restart => {
                    self.show_results = false;
                    self.state = GameState::MainMenu;
                }
                _ => {}
            },
        }
    }

    /// Advance gravity by the elapsed frame time
    pub fn update(&mut self, dt: Duration) {
        if self.state != GameState::Playing {
            return;
        }

        self.elapsed += dt;
        if self.elapsed >= self.score.fall_delay() {
            self.step_down();
            self.elapsed = Duration::ZERO;
        }
    }

    fn activate(&mut self, action: MenuAction) {
        match action {
            MenuAction::StartGame => self.start_round(),
            MenuAction::ViewRating => self.state = GameState::Rating,
            MenuAction::Quit => self.quit_requested = true,
        }
    }

    /// Reset all round state and spawn the first piece
    fn start_round(&mut self) {
        self.board = Board::new();
        self.score = Score::new();
        self.elapsed = Duration::ZERO;
        self.finished = false;
        self.show_results = false;
        self.state = GameState::Playing;
        tracing::info!("Round started");
        self.spawn();
    }

    fn shift(&mut self, dx: i32) {
        if let Some(piece) = &mut self.current_piece {
            piece.try_shift(dx, 0, &self.board);
        }
    }

    /// Move down one row, locking the piece if it cannot move
    fn step_down(&mut self) {
        let Some(piece) = &mut self.current_piece else {
            return;
        };
        if !piece.try_shift(0, 1, &self.board) {
            self.lock_piece();
        }
    }

    fn hard_drop(&mut self) {
        if let Some(piece) = &mut self.current_piece {
            piece.hard_drop(&self.board);
            self.lock_piece();
        }
    }

    /// Lock the current piece, clear lines and spawn the next
    fn lock_piece(&mut self) {
        let Some(piece) = self.current_piece.take() else {
            return;
        };

        let color = piece.color();
        for (row, col) in piece.cells().filter(|&(row, _)| row >= 0) {
            self.board.set(row, col, Cell::Filled(color));
        }
        tracing::debug!("Locked {:?} at ({}, {})", piece.kind, piece.x, piece.y);

        let cleared = self.clear_lines();
        if cleared > 0 {
            tracing::debug!("Cleared {} lines, score {}", cleared, self.score.points);
        }

        self.spawn();
    }

    /// Remove complete rows scanning bottom to top. After a removal the same
    /// index is checked again since the row above has moved into it.
    fn clear_lines(&mut self) -> u32 {
        let mut cleared = 0;
        let mut row = BOARD_HEIGHT;
        while row > 0 {
            if self.board.is_row_complete(row - 1) {
                self.board.clear_row(row - 1);
                self.score.add_line();
                cleared += 1;
            } else {
                row -= 1;
            }
        }
        cleared
    }

    fn spawn(&mut self) {
        let kind = self.source.next_piece();
        self.place_spawned(Piece::spawn(kind));
    }

    /// Install a freshly spawned piece and evaluate the end conditions.
    ///
    /// Loss (spawn position invalid) and win (a cell above the top edge) are
    /// evaluated independently; when both hold, the state ends as won while
    /// the ledger keeps the first outcome recorded.
    fn place_spawned(&mut self, piece: Piece) {
        let blocked = !is_valid(&self.board, &piece);
        let above_top = piece.is_above_top();
        tracing::debug!("Spawned {:?}", piece.kind);
        self.current_piece = Some(piece);

        if blocked {
            self.state = GameState::GameOver;
            self.finish(Outcome::Lose);
        }
        if above_top {
            self.state = GameState::GameWon;
            self.finish(Outcome::Win);
        }
    }

    /// Record the round outcome once
    fn finish(&mut self, outcome: Outcome) {
        if self.finished {
            return;
        }
        self.finished = true;
        tracing::info!("Round finished: {} with {} points", outcome, self.score.points);

        match self.ledger.append(self.score.points, outcome) {
            Ok(()) => self.status = None,
            Err(e) => {
                tracing::warn!("Could not save results: {}", e);
                self.status = Some(format!("Results not saved: {}", e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BOARD_WIDTH;
    use crate::ledger::MemoryStore;
    use crate::randomizer::{Randomizer, Scripted};
    use crate::score::{DELAY_DECAY, INITIAL_DELAY};
    use crate::tetromino::TetrominoType;
    use ratatui::style::Color;

    fn game_with(pieces: Vec<TetrominoType>) -> Game {
        let ledger = Ledger::load(Box::new(MemoryStore::default()));
        Game::new(Box::new(Scripted::new(pieces)), ledger)
    }

    fn started(pieces: Vec<TetrominoType>) -> Game {
        let mut game = game_with(pieces);
        game.process_action(Action::Select);
        assert_eq!(game.state, GameState::Playing);
        game
    }

    fn piece_cells(game: &Game) -> Vec<(i32, i32)> {
        game.current_piece.as_ref().unwrap().cells().collect()
    }

    /// Fill a row except for the given columns
    fn fill_row_except(board: &mut Board, row: i32, gaps: &[i32]) {
        for col in 0..BOARD_WIDTH as i32 {
            if !gaps.contains(&col) {
                board.set(row, col, Cell::Filled(Color::DarkGray));
            }
        }
    }

    #[test]
    fn test_new_game_waits_in_menu() {
        let mut game = game_with(vec![TetrominoType::I]);
        assert_eq!(game.state, GameState::MainMenu);
        assert!(game.current_piece.is_none());
        game.update(Duration::from_secs(5));
        assert!(game.current_piece.is_none());
    }

    #[test]
    fn test_start_spawns_centered_piece() {
        let game = started(vec![TetrominoType::I]);
        assert_eq!(piece_cells(&game), vec![(0, 3), (0, 4), (0, 5), (0, 6)]);
        assert_eq!(game.score.points, 0);
        assert!(game.board.is_empty());
    }

    #[test]
    fn test_menu_to_rating_and_back() {
        let mut game = game_with(vec![TetrominoType::O]);
        game.process_action(Action::MenuDown);
        game.process_action(Action::Select);
        assert_eq!(game.state, GameState::Rating);
        game.process_action(Action::MoveLeft);
        assert_eq!(game.state, GameState::Rating);
        game.process_action(Action::Back);
        assert_eq!(game.state, GameState::MainMenu);
    }

    #[test]
    fn test_menu_click_selects_item() {
        let mut game = game_with(vec![TetrominoType::O]);
        game.process_action(Action::SelectItem(7));
        assert_eq!(game.state, GameState::MainMenu);
        game.process_action(Action::SelectItem(2));
        assert!(game.quit_requested());
    }

    #[test]
    fn test_quit_from_anywhere() {
        let mut game = started(vec![TetrominoType::T]);
        game.process_action(Action::Quit);
        assert!(game.quit_requested());
    }

    #[test]
    fn test_moves_revert_at_walls() {
        let mut game = started(vec![TetrominoType::O]);
        for _ in 0..10 {
            game.process_action(Action::MoveLeft);
        }
        assert_eq!(game.current_piece.as_ref().unwrap().x, 0);
        for _ in 0..10 {
            game.process_action(Action::MoveRight);
        }
        assert_eq!(game.current_piece.as_ref().unwrap().x, BOARD_WIDTH as i32 - 2);
    }

    #[test]
    fn test_rotate() {
        let mut game = started(vec![TetrominoType::I]);
        game.process_action(Action::SoftDrop);
        game.process_action(Action::Rotate);
        let piece = game.current_piece.as_ref().unwrap();
        assert_eq!(piece.shape.len(), 4);
        assert_eq!(piece.shape[0].len(), 1);
    }

    #[test]
    fn test_gravity_waits_for_delay() {
        let mut game = started(vec![TetrominoType::T]);
        game.update(INITIAL_DELAY / 2);
        assert_eq!(game.current_piece.as_ref().unwrap().y, 0);
        game.update(INITIAL_DELAY / 2);
        assert_eq!(game.current_piece.as_ref().unwrap().y, 1);
        // Accumulator was reset
        game.update(INITIAL_DELAY / 2);
        assert_eq!(game.current_piece.as_ref().unwrap().y, 1);
    }

    #[test]
    fn test_gravity_locks_on_floor() {
        let mut game = started(vec![TetrominoType::O, TetrominoType::T]);
        for _ in 0..BOARD_HEIGHT {
            game.update(INITIAL_DELAY);
        }
        assert_eq!(game.board.get(19, 4), Some(Cell::Filled(Color::Yellow)));
        assert_eq!(game.current_piece.as_ref().unwrap().kind, TetrominoType::T);
    }

    #[test]
    fn test_pause_freezes_round() {
        let mut game = started(vec![TetrominoType::O]);
        game.process_action(Action::Pause);
        assert_eq!(game.state, GameState::Paused);

        game.update(Duration::from_secs(10));
        game.process_action(Action::MoveLeft);
        game.process_action(Action::HardDrop);
        let piece = game.current_piece.as_ref().unwrap();
        assert_eq!((piece.x, piece.y), (4, 0));
        assert!(game.board.is_empty());

        game.process_action(Action::ToggleResults);
        assert!(game.show_results);

        game.process_action(Action::Pause);
        assert_eq!(game.state, GameState::Playing);
    }

    #[test]
    fn test_restart_while_paused_starts_fresh_round() {
        let mut game = started(vec![TetrominoType::O]);
        game.process_action(Action::HardDrop);
        assert!(!game.board.is_empty());
        game.process_action(Action::Pause);
        game.process_action(Action::Restart);
        assert_eq!(game.state, GameState::Playing);
        assert!(game.board.is_empty());
        assert_eq!(game.current_piece.as_ref().unwrap().y, 0);
    }

    #[test]
    fn test_lock_writes_exactly_piece_cells() {
        let mut game = started(vec![TetrominoType::T, TetrominoType::O]);
        game.board.set(19, 0, Cell::Filled(Color::White));
        let before = game.board.clone();

        let mut landed = game.current_piece.clone().unwrap();
        landed.hard_drop(&game.board);
        let expected: Vec<_> = landed.cells().collect();

        game.process_action(Action::HardDrop);

        for row in 0..BOARD_HEIGHT as i32 {
            for col in 0..BOARD_WIDTH as i32 {
                let cell = game.board.get(row, col).unwrap();
                if expected.contains(&(row, col)) {
                    assert_eq!(cell, Cell::Filled(Color::Magenta));
                } else {
                    assert_eq!(cell, before.get(row, col).unwrap());
                }
            }
        }
    }

    #[test]
    fn test_soft_drop_locks_on_floor() {
        let mut game = started(vec![TetrominoType::I, TetrominoType::O]);
        for _ in 0..BOARD_HEIGHT {
            game.process_action(Action::SoftDrop);
        }
        assert_eq!(game.board.is_occupied(19, 3), Some(true));
        assert_eq!(game.current_piece.as_ref().unwrap().kind, TetrominoType::O);
    }

    #[test]
    fn test_filling_gap_clears_bottom_row() {
        let mut game = started(vec![TetrominoType::I, TetrominoType::O]);
        fill_row_except(&mut game.board, 19, &[3, 4, 5, 6]);
        game.board.set(18, 0, Cell::Filled(Color::Red));

        game.process_action(Action::HardDrop);

        assert_eq!(game.score.points, 100);
        assert_eq!(game.score.lines, 1);
        // Row 18 moved down, new empty row on top
        assert_eq!(game.board.get(19, 0), Some(Cell::Filled(Color::Red)));
        assert_eq!(game.board.is_occupied(19, 1), Some(false));
        assert!(game.board.rows().next().unwrap().iter().all(|c| c.is_empty()));
        let delay = game.score.fall_delay().as_secs_f64();
        assert!((delay - INITIAL_DELAY.as_secs_f64() * DELAY_DECAY).abs() < 1e-6);
    }

    #[test]
    fn test_adjacent_rows_clear_together() {
        let mut game = started(vec![TetrominoType::O, TetrominoType::T]);
        fill_row_except(&mut game.board, 19, &[4, 5]);
        fill_row_except(&mut game.board, 18, &[4, 5]);

        game.process_action(Action::HardDrop);

        assert_eq!(game.score.points, 200);
        assert_eq!(game.score.lines, 2);
        assert!(game.board.is_empty());
        let expected = INITIAL_DELAY.as_secs_f64() * DELAY_DECAY.powi(2);
        assert!((game.score.fall_delay().as_secs_f64() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_separated_rows_clear_together() {
        // Vertical I fills column 0 on rows 16..=19; only rows 17 and 19 complete
        let mut game = started(vec![TetrominoType::I, TetrominoType::O]);
        fill_row_except(&mut game.board, 19, &[0]);
        fill_row_except(&mut game.board, 18, &[0, 9]);
        fill_row_except(&mut game.board, 17, &[0]);
        game.process_action(Action::SoftDrop);
        game.process_action(Action::Rotate);
        for _ in 0..10 {
            game.process_action(Action::MoveLeft);
        }
        assert_eq!(game.current_piece.as_ref().unwrap().x, 0);

        game.process_action(Action::HardDrop);

        assert_eq!(game.score.points, 200);
        // Old row 18 is now the bottom row, old row 16 above it
        assert_eq!(game.board.is_occupied(19, 9), Some(false));
        assert_eq!(game.board.is_occupied(19, 0), Some(true));
        assert_eq!(game.board.is_occupied(18, 0), Some(true));
        assert_eq!(game.board.is_occupied(17, 0), Some(false));
    }

    #[test]
    fn test_blocked_spawn_is_loss_recorded_once() {
        let mut game = started(vec![TetrominoType::T]);
        fill_row_except(&mut game.board, 0, &[]);
        fill_row_except(&mut game.board, 1, &[]);

        game.spawn();
        assert_eq!(game.state, GameState::GameOver);
        assert_eq!(game.results().len(), 1);
        assert_eq!(game.results()[0].outcome, Outcome::Lose);

        // Re-evaluating the terminal condition does not append again
        game.spawn();
        assert_eq!(game.results().len(), 1);

        // Moves and gravity are ignored once over
        game.process_action(Action::HardDrop);
        game.update(Duration::from_secs(1));
        assert_eq!(game.results().len(), 1);

        game.process_action(Action::Restart);
        assert_eq!(game.state, GameState::MainMenu);
    }

    #[test]
    fn test_stack_reaching_top_ends_round() {
        let mut game = started(vec![TetrominoType::O]);
        // Keep stacking O pieces in the middle until spawning fails
        for _ in 0..BOARD_HEIGHT {
            if game.state != GameState::Playing {
                break;
            }
            game.process_action(Action::HardDrop);
        }
        assert_eq!(game.state, GameState::GameOver);
        assert_eq!(game.results().len(), 1);
        assert_eq!(game.results()[0].score, 0);
    }

    #[test]
    fn test_spawn_above_top_is_win() {
        let mut game = started(vec![TetrominoType::O]);
        game.place_spawned(Piece::new(TetrominoType::O, 4, -1));
        assert_eq!(game.state, GameState::GameWon);
        assert_eq!(game.results().len(), 1);
        assert_eq!(game.results()[0].outcome, Outcome::Win);
    }

    #[test]
    fn test_spawn_above_top_and_blocked() {
        // Both end conditions hold: the state ends as won, the ledger keeps
        // the loss that was recorded first
        let mut game = started(vec![TetrominoType::O]);
        fill_row_except(&mut game.board, 0, &[]);
        game.place_spawned(Piece::new(TetrominoType::O, 4, -1));
        assert_eq!(game.state, GameState::GameWon);
        assert_eq!(game.results().len(), 1);
        assert_eq!(game.results()[0].outcome, Outcome::Lose);
    }

    #[test]
    fn test_new_round_after_finish_records_again() {
        let mut game = started(vec![TetrominoType::T]);
        fill_row_except(&mut game.board, 0, &[]);
        game.spawn();
        game.process_action(Action::Restart);
        game.process_action(Action::Select);
        assert_eq!(game.state, GameState::Playing);
        fill_row_except(&mut game.board, 0, &[]);
        game.spawn();
        assert_eq!(game.results().len(), 2);
    }

    #[test]
    fn test_results_overlay_in_terminal_state() {
        let mut game = started(vec![TetrominoType::T]);
        fill_row_except(&mut game.board, 0, &[]);
        game.spawn();
        game.process_action(Action::ToggleResults);
        assert!(game.show_results);
        game.process_action(Action::Restart);
        assert!(!game.show_results);
    }

    #[test]
    fn test_save_failure_is_reported_not_fatal() {
        let store = MemoryStore {
            fail_writes: true,
            ..MemoryStore::default()
        };
        let ledger = Ledger::load(Box::new(store));
        let mut game = Game::new(Box::new(Scripted::new(vec![TetrominoType::T])), ledger);
        game.process_action(Action::Select);
        fill_row_except(&mut game.board, 0, &[]);
        game.spawn();
        assert_eq!(game.state, GameState::GameOver);
        assert!(game.status.is_some());
        assert_eq!(game.results().len(), 1);
    }

    #[test]
    fn test_seeded_games_are_reproducible() {
        let make = || {
            let ledger = Ledger::load(Box::new(MemoryStore::default()));
            let mut game = Game::new(Box::new(Randomizer::with_seed(99)), ledger);
            game.process_action(Action::Select);
            let mut kinds = Vec::new();
            for _ in 0..5 {
                kinds.push(game.current_piece.as_ref().unwrap().kind);
                game.process_action(Action::HardDrop);
            }
            kinds
        };
        assert_eq!(make(), make());
    }
}
