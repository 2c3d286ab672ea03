//! BLOCKFALL - a falling-block puzzle game for the terminal
//!
//! Drop pieces, complete rows, chase the best-results table.

mod board;
mod collision;
mod game;
mod input;
mod ledger;
mod menu;
mod piece;
mod randomizer;
mod score;
mod settings;
mod tetromino;
mod ui;

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseButton,
        MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use game::{Action, Game, GameState};
use input::InputHandler;
use ledger::{FileStore, Ledger};
use randomizer::Randomizer;
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};
use settings::Settings;
use std::{
    io::{self, stdout},
    time::{Duration, Instant},
};

/// Target frame rate
const TARGET_FPS: u64 = 60;
const FRAME_DURATION: Duration = Duration::from_micros(1_000_000 / TARGET_FPS);

/// Get the blockfall temp directory for logs, creating it if needed
fn log_dir() -> std::path::PathBuf {
    let dir = std::env::temp_dir().join("blockfall");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

fn main() -> io::Result<()> {
    // Setup tracing to a log file; the terminal belongs to the UI
    let dir = log_dir();
    let file_appender = tracing_appender::rolling::never(&dir, "blockfall.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("blockfall=debug"));
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(filter)
        .with_ansi(false)
        .init();

    tracing::info!("BLOCKFALL starting up, log={}", dir.join("blockfall.log").display());

    let settings = load_settings();
    let mut game = new_game(&settings);
    let input = InputHandler::from_settings(&settings);

    // Setup terminal
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut game, &input);

    // Restore terminal
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen, DisableMouseCapture)?;

    tracing::info!("BLOCKFALL shutting down");
    result
}

/// Load settings, writing the defaults out on first run
fn load_settings() -> Settings {
    let settings = Settings::load();
    if Settings::settings_path().is_some_and(|path| !path.exists()) {
        if let Err(e) = settings.save() {
            tracing::warn!("Could not write default settings: {}", e);
        }
    }
    settings
}

/// Open the results ledger and build a game in the main menu
fn new_game(settings: &Settings) -> Game {
    let path = settings.results_path();
    let ledger = match FileStore::open(&path) {
        Ok(store) => {
            tracing::info!("Results file: {}", store.path().display());
            Ledger::load(Box::new(store))
        }
        Err(e) => {
            // Keep playing with a ledger that only lives for this session
            tracing::warn!("Results file unavailable: {}", e);
            Ledger::load(Box::new(UnavailableStore(path)))
        }
    };

    let source = match settings.gameplay.seed {
        Some(seed) => Randomizer::with_seed(seed),
        None => Randomizer::new(),
    };
    Game::new(Box::new(source), ledger)
}

/// Store used when the results file cannot be created
struct UnavailableStore(std::path::PathBuf);

impl ledger::LedgerStore for UnavailableStore {
    fn read(&self) -> Result<String, ledger::LedgerError> {
        Ok(String::new())
    }

    fn write(&mut self, _contents: &str) -> Result<(), ledger::LedgerError> {
        Err(ledger::LedgerError::Io {
            path: self.0.clone(),
            source: io::Error::new(io::ErrorKind::NotFound, "results file unavailable"),
        })
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    game: &mut Game,
    input: &InputHandler,
) -> io::Result<()> {
    let mut last_frame = Instant::now();

    loop {
        terminal.draw(|frame| ui::render(frame, game))?;

        if event::poll(FRAME_DURATION)? {
            let action = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    input.key_down(key, game.state)
                }
                Event::Mouse(mouse) => menu_click(terminal, game, mouse)?,
                _ => None,
            };
            if let Some(action) = action {
                game.process_action(action);
            }
        }

        if game.quit_requested() {
            return Ok(());
        }

        let now = Instant::now();
        game.update(now - last_frame);
        last_frame = now;
    }
}

/// Map a left click on a main-menu item to its selection
fn menu_click(
    terminal: &Terminal<CrosstermBackend<io::Stdout>>,
    game: &Game,
    mouse: event::MouseEvent,
) -> io::Result<Option<Action>> {
    if game.state != GameState::MainMenu
        || mouse.kind != MouseEventKind::Down(MouseButton::Left)
    {
        return Ok(None);
    }
    let size = terminal.size()?;
    let area = Rect::new(0, 0, size.width, size.height);
    Ok(ui::menu_item_at(area, &game.menu, mouse.column, mouse.row).map(Action::SelectItem))
}
