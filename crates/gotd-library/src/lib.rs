//! Game catalog and play history for the C64 game of the day
//!
//! Handles the list of playable games (bundled, scanned from disk, or read
//! from SQLite) and the per-game play history used by the daily rotation.

mod catalog;
mod clock;
mod database;
mod game;
mod history;
mod scanner;

pub use catalog::{BundledCatalogStore, GameCatalog, GameCatalogStore};
pub use clock::{Clock, ManualClock, SystemClock, date_string};
pub use database::GameDatabase;
pub use game::{GameInfo, bundled_games};
pub use history::{
    GameHistoryEntry, GameHistoryManager, GameHistoryMap, GameHistoryStore, KeyValueHistoryStore,
};
pub use scanner::{DirectoryCatalogStore, ScanConfig};

use gotd_storage::StorageError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Catalog source error: {0}")]
    Catalog(String),

    #[error("No games found")]
    NoGames,

    #[error("Rating must be between 0 and 5, got {0}")]
    InvalidRating(i64),

    #[error("Invalid user id: {0:?}")]
    InvalidUser(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_error_display() {
        assert_eq!(format!("{}", LibraryError::NoGames), "No games found");
        assert_eq!(
            format!("{}", LibraryError::InvalidRating(7)),
            "Rating must be between 0 and 5, got 7"
        );
        assert!(format!("{}", LibraryError::InvalidUser("unknown".into())).contains("unknown"));
    }
}
