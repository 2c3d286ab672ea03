//! Key events to game actions
//!
//! Menu screens use fixed navigation keys; in a round the configurable
//! bindings from the settings file apply.

use crate::game::{Action, GameState};
use crate::settings::Settings;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Key bindings configuration - supports multiple keys per action
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub move_left: Vec<KeyCode>,
    pub move_right: Vec<KeyCode>,
    pub soft_drop: Vec<KeyCode>,
    pub hard_drop: Vec<KeyCode>,
    pub rotate: Vec<KeyCode>,
    pub pause: Vec<KeyCode>,
    pub results: Vec<KeyCode>,
    pub restart: Vec<KeyCode>,
    pub quit: Vec<KeyCode>,
}

impl KeyBindings {
    /// Parse a key string into KeyCode
    fn parse_key(s: &str) -> Option<KeyCode> {
        let lower = s.to_lowercase();
        let code = match lower.as_str() {
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "space" => KeyCode::Char(' '),
            "enter" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "backspace" => KeyCode::Backspace,
            "esc" | "escape" => KeyCode::Esc,
            _ => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => {
                        tracing::warn!("Ignoring unknown key name {:?}", s);
                        return None;
                    }
                }
            }
        };
        Some(code)
    }

    /// Parse a list of key strings into KeyCodes
    fn parse_keys(keys: &[String]) -> Vec<KeyCode> {
        keys.iter().filter_map(|s| Self::parse_key(s)).collect()
    }

    /// Create keybindings from settings
    pub fn from_settings(settings: &Settings) -> Self {
        let keys = &settings.keys;
        Self {
            move_left: Self::parse_keys(&keys.move_left),
            move_right: Self::parse_keys(&keys.move_right),
            soft_drop: Self::parse_keys(&keys.soft_drop),
            hard_drop: Self::parse_keys(&keys.hard_drop),
            rotate: Self::parse_keys(&keys.rotate),
            pause: Self::parse_keys(&keys.pause),
            results: Self::parse_keys(&keys.results),
            restart: Self::parse_keys(&keys.restart),
            quit: Self::parse_keys(&keys.quit),
        }
    }

    fn round_action(&self, code: KeyCode) -> Option<Action> {
        let table = [
            (&self.move_left, Action::MoveLeft),
            (&self.move_right, Action::MoveRight),
            (&self.soft_drop, Action::SoftDrop),
            (&self.hard_drop, Action::HardDrop),
            (&self.rotate, Action::Rotate),
            (&self.pause, Action::Pause),
            (&self.results, Action::ToggleResults),
            (&self.restart, Action::Restart),
            (&self.quit, Action::Quit),
        ];
        table
            .into_iter()
            .find(|(keys, _)| keys.contains(&code))
            .map(|(_, action)| action)
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Translates key presses for the current screen
#[derive(Debug, Clone, Default)]
pub struct InputHandler {
    bindings: KeyBindings,
}

impl InputHandler {
    /// Create input handler from settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            bindings: KeyBindings::from_settings(settings),
        }
    }

    /// Handle a key press event
    pub fn key_down(&self, key: KeyEvent, state: GameState) -> Option<Action> {
        // Ctrl+C always quits
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Action::Quit);
        }

        let code = normalize_key(key.code);

        match state {
            GameState::MainMenu => match code {
                KeyCode::Up => Some(Action::MenuUp),
                KeyCode::Down => Some(Action::MenuDown),
                KeyCode::Enter | KeyCode::Char(' ') => Some(Action::Select),
                KeyCode::Esc | KeyCode::Char('q') => Some(Action::Quit),
                _ => None,
            },
            GameState::Rating => match code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char(' ') => {
                    Some(Action::Back)
                }
                KeyCode::Char('q') => Some(Action::Quit),
                _ => None,
            },
            _ => self.bindings.round_action(code),
        }
    }
}

/// Normalize key codes for consistent handling
fn normalize_key(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}
