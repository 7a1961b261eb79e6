//! Per-game play history

use crate::LibraryError;
use gotd_storage::KeyValueStore;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Play record for one game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameHistoryEntry {
    /// Calendar date of the last play (`YYYY-MM-DD`)
    pub last_played: String,

    /// Epoch milliseconds of the last play
    pub last_played_time: i64,

    /// Always at least 1 once the entry exists
    pub play_count: u32,
}

/// Game id -> play record
pub type GameHistoryMap = BTreeMap<String, GameHistoryEntry>;

/// Durable home of the history map
pub trait GameHistoryStore: Send + Sync {
    /// Persisted history; missing or unparsable data yields an empty map
    fn load(&self) -> GameHistoryMap;

    /// Persist the full map
    fn save(&self, history: &GameHistoryMap) -> Result<(), LibraryError>;

    /// Drop the persisted copy
    fn reset(&self) -> Result<(), LibraryError>;
}

/// History kept as JSON under one key of a [`KeyValueStore`]
#[derive(Clone)]
pub struct KeyValueHistoryStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl KeyValueHistoryStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl GameHistoryStore for KeyValueHistoryStore {
    fn load(&self) -> GameHistoryMap {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return GameHistoryMap::new(),
            Err(e) => {
                tracing::error!("Error reading game history: {}", e);
                return GameHistoryMap::new();
            }
        };

        match serde_json::from_str::<GameHistoryMap>(&raw) {
            Ok(mut history) => {
                history.retain(|id, entry| {
                    let valid = entry.play_count >= 1;
                    if !valid {
                        tracing::warn!("Dropping history entry {} with zero play count", id);
                    }
                    valid
                });
                history
            }
            Err(e) => {
                tracing::warn!("Ignoring corrupt game history: {}", e);
                GameHistoryMap::new()
            }
        }
    }

    fn save(&self, history: &GameHistoryMap) -> Result<(), LibraryError> {
        let raw = serde_json::to_string(history)?;
        self.store.set(&self.key, &raw)?;
        Ok(())
    }

    fn reset(&self) -> Result<(), LibraryError> {
        self.store.remove(&self.key)?;
        Ok(())
    }
}

/// In-memory cache of the history map over a [`GameHistoryStore`]
///
/// Storage failures are logged and swallowed so that a broken store never
/// blocks gameplay. Reads hand out copies.
pub struct GameHistoryManager {
    store: Arc<dyn GameHistoryStore>,
    history: Mutex<GameHistoryMap>,
}

impl GameHistoryManager {
    /// Create a manager and load the persisted history
    pub fn new(store: Arc<dyn GameHistoryStore>) -> Self {
        let history = store.load();
        tracing::debug!("Loaded game history with {} entries", history.len());
        Self {
            store,
            history: Mutex::new(history),
        }
    }

    /// Re-read the persisted history and adopt it
    pub fn load(&self) -> GameHistoryMap {
        let loaded = self.store.load();
        *self.history.lock() = loaded.clone();
        loaded
    }

    /// Persist the cached history
    pub fn save(&self) {
        let history = self.history.lock();
        self.persist(&history);
    }

    /// Clear both the cache and the persisted copy
    pub fn reset(&self) {
        self.history.lock().clear();
        if let Err(e) = self.store.reset() {
            tracing::error!("Error resetting game history: {}", e);
        }
    }

    /// Copy of the current history
    pub fn history(&self) -> GameHistoryMap {
        self.history.lock().clone()
    }

    pub fn entry(&self, game_id: &str) -> Option<GameHistoryEntry> {
        self.history.lock().get(game_id).cloned()
    }

    /// Record a play of `game_id` and persist immediately
    ///
    /// The date and timestamp overwrite the previous values; the play count
    /// grows by one.
    pub fn update_game(&self, game_id: &str, today: &str, now_ms: i64) -> GameHistoryEntry {
        let mut history = self.history.lock();
        let play_count = history.get(game_id).map_or(0, |e| e.play_count) + 1;
        let entry = GameHistoryEntry {
            last_played: today.to_string(),
            last_played_time: now_ms,
            play_count,
        };
        history.insert(game_id.to_string(), entry.clone());
        self.persist(&history);
        entry
    }

    fn persist(&self, history: &GameHistoryMap) {
        match self.store.save(history) {
            Ok(()) => tracing::debug!("Game history saved ({} entries)", history.len()),
            Err(e) => tracing::error!("Error saving game history: {}", e),
        }
    }
}
