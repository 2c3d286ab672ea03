//! Best-results ledger
//!
//! Keeps the ten highest-scoring round outcomes, ranked by score, and
//! persists them as whitespace-separated text records:
//!
//! ```text
//! 2026-10-18_21:04:55 1300 LOSE
//! ```
//!
//! Storage is pluggable through [`LedgerStore`]; the game uses a file, tests
//! use memory.

use chrono::Local;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Maximum number of results kept
pub const LEDGER_CAPACITY: usize = 10;
/// Default file name of the persisted ledger
pub const RESULTS_FILE: &str = "tetris_results.txt";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("results file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// How a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Lose,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Win => "WIN",
            Outcome::Lose => "LOSE",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "WIN" => Some(Outcome::Win),
            "LOSE" => Some(Outcome::Lose),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finished round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    /// Local time the round ended, without embedded whitespace
    pub timestamp: String,
    pub score: u32,
    pub outcome: Outcome,
}

impl GameResult {
    /// Stamp a result with the current local time
    pub fn now(score: u32, outcome: Outcome) -> Self {
        Self {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            score,
            outcome,
        }
    }

    /// Parse a `<timestamp> <score> <outcome>` record
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let timestamp = tokens.next()?;
        let score = tokens.next()?.parse().ok()?;
        let outcome = Outcome::parse(tokens.next()?)?;
        if tokens.next().is_some() {
            return None;
        }
        Some(Self {
            timestamp: timestamp.to_string(),
            score,
            outcome,
        })
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.timestamp, self.score, self.outcome)
    }
}

/// Whole-ledger persistence: read everything, write everything
pub trait LedgerStore {
    fn read(&self) -> Result<String, LedgerError>;
    fn write(&mut self, contents: &str) -> Result<(), LedgerError>;
}

/// Ledger persisted to a text file
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Use `path`, creating it (and its directory) empty if it is missing
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        if !path.exists() {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir).map_err(|source| LedgerError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
            fs::write(&path, "").map_err(|source| LedgerError::Io {
                path: path.clone(),
                source,
            })?;
            tracing::info!("Created empty results file at {}", path.display());
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedgerStore for FileStore {
    fn read(&self) -> Result<String, LedgerError> {
        fs::read_to_string(&self.path).map_err(|source| LedgerError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&mut self, contents: &str) -> Result<(), LedgerError> {
        fs::write(&self.path, contents).map_err(|source| LedgerError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Ranked, size-bounded list of past results
pub struct Ledger {
    entries: Vec<GameResult>,
    store: Box<dyn LedgerStore>,
}

impl Ledger {
    /// Read and rank the persisted results. Malformed records are skipped and
    /// a read failure yields an empty ledger.
    pub fn load(store: Box<dyn LedgerStore>) -> Self {
        let entries: Vec<GameResult> = match store.read() {
            Ok(contents) => contents.lines().filter_map(GameResult::parse_line).collect(),
            Err(e) => {
                tracing::warn!("Could not read results, starting empty: {}", e);
                Vec::new()
            }
        };
        let mut ledger = Self { entries, store };
        ledger.rank();
        tracing::info!("Loaded {} results", ledger.entries.len());
        ledger
    }

    /// Results, best first
    pub fn entries(&self) -> &[GameResult] {
        &self.entries
    }

    /// Record a finished round stamped with the current time, then persist
    /// the whole ledger. On a save error the entry stays in memory.
    pub fn append(&mut self, score: u32, outcome: Outcome) -> Result<(), LedgerError> {
        self.insert(GameResult::now(score, outcome));
        self.save()
    }

    /// Insert without persisting
    pub fn insert(&mut self, result: GameResult) {
        self.entries.push(result);
        self.rank();
    }

    /// Overwrite the store with the current entries
    pub fn save(&mut self) -> Result<(), LedgerError> {
        let contents: String = self.entries.iter().map(|r| format!("{}\n", r)).collect();
        self.store.write(&contents)
    }

    // Stable: equal scores keep their insertion order
    fn rank(&mut self) {
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(LEDGER_CAPACITY);
    }
}

/// In-memory store whose contents stay inspectable after being handed over
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub contents: std::rc::Rc<std::cell::RefCell<String>>,
    pub fail_writes: bool,
}

#[cfg(test)]
impl MemoryStore {
    pub fn with_contents(contents: &str) -> Self {
        Self {
            contents: std::rc::Rc::new(std::cell::RefCell::new(contents.to_string())),
            fail_writes: false,
        }
    }
}

#[cfg(test)]
impl LedgerStore for MemoryStore {
    fn read(&self) -> Result<String, LedgerError> {
        Ok(self.contents.borrow().clone())
    }

    fn write(&mut self, contents: &str) -> Result<(), LedgerError> {
        if self.fail_writes {
            return Err(LedgerError::Io {
                path: PathBuf::from("<memory>"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        *self.contents.borrow_mut() = contents.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(timestamp: &str, score: u32, outcome: Outcome) -> GameResult {
        GameResult {
            timestamp: timestamp.to_string(),
            score,
            outcome,
        }
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(
            GameResult::parse_line("2026-01-02_03:04:05 700 WIN"),
            Some(result("2026-01-02_03:04:05", 700, Outcome::Win))
        );
        assert_eq!(GameResult::parse_line(""), None);
        assert_eq!(GameResult::parse_line("2026-01-02 03:04:05 700 LOSE"), None);
        assert_eq!(GameResult::parse_line("ts abc LOSE"), None);
        assert_eq!(GameResult::parse_line("ts 100 DRAW"), None);
        assert_eq!(GameResult::parse_line("ts 100 win"), None);
        assert_eq!(GameResult::parse_line("ts 100"), None);
    }

    #[test]
    fn test_load_skips_malformed_and_sorts() {
        let store = MemoryStore::with_contents(
            "a 100 LOSE\n\
             garbage line here and more\n\
             b 900 WIN\n\
             c notanumber LOSE\n\
             d 300 LOSE\n",
        );
        let ledger = Ledger::load(Box::new(store));
        let scores: Vec<_> = ledger.entries().iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![900, 300, 100]);
    }

    #[test]
    fn test_append_keeps_ten_best_sorted() {
        let store = MemoryStore::default();
        let mut ledger = Ledger::load(Box::new(store.clone()));
        for score in [500, 100, 1100, 0, 700, 300, 900, 200, 1000, 400, 600] {
            ledger.append(score, Outcome::Lose).unwrap();
        }
        let scores: Vec<_> = ledger.entries().iter().map(|r| r.score).collect();
        assert_eq!(
            scores,
            vec![1100, 1000, 900, 700, 600, 500, 400, 300, 200, 100]
        );

        // The store holds exactly the same ten records
        let reloaded = Ledger::load(Box::new(store));
        assert_eq!(reloaded.entries(), ledger.entries());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut ledger = Ledger::load(Box::new(MemoryStore::default()));
        ledger.insert(result("first", 200, Outcome::Lose));
        ledger.insert(result("second", 200, Outcome::Win));
        ledger.insert(result("top", 300, Outcome::Lose));
        let stamps: Vec<_> = ledger.entries().iter().map(|r| r.timestamp.as_str()).collect();
        assert_eq!(stamps, vec!["top", "first", "second"]);
    }

    #[test]
    fn test_append_stamps_token_safe_time() {
        let mut ledger = Ledger::load(Box::new(MemoryStore::default()));
        ledger.append(100, Outcome::Win).unwrap();
        let stamp = &ledger.entries()[0].timestamp;
        assert!(!stamp.contains(char::is_whitespace));
        assert_eq!(stamp.len(), "YYYY-MM-DD_HH:MM:SS".len());
    }

    #[test]
    fn test_save_failure_keeps_entry_in_memory() {
        let store = MemoryStore {
            fail_writes: true,
            ..MemoryStore::default()
        };
        let mut ledger = Ledger::load(Box::new(store));
        assert!(ledger.append(400, Outcome::Lose).is_err());
        assert_eq!(ledger.entries().len(), 1);
        assert_eq!(ledger.entries()[0].score, 400);
    }

    #[test]
    fn test_file_store_created_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(RESULTS_FILE);
        let store = FileStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.path(), path.as_path());

        let mut ledger = Ledger::load(Box::new(store));
        assert!(ledger.entries().is_empty());
        ledger.append(1200, Outcome::Win).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.ends_with(" 1200 WIN\n"));

        let reloaded = Ledger::load(Box::new(FileStore::open(&path).unwrap()));
        assert_eq!(reloaded.entries(), ledger.entries());
    }

    #[test]
    fn test_unreadable_file_yields_empty_ledger() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be read as a file
        let store = FileStore::open(dir.path()).unwrap();
        let ledger = Ledger::load(Box::new(store));
        assert!(ledger.entries().is_empty());
    }
}
