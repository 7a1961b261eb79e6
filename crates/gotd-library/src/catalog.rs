//! Game catalog

use crate::{GameInfo, LibraryError, bundled_games};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

/// Source of catalog entries
#[async_trait]
pub trait GameCatalogStore: Send + Sync {
    /// Every game the source knows about, in a stable order
    async fn available_games(&self) -> Result<Vec<GameInfo>, LibraryError>;
}

/// The built-in game list
#[derive(Debug, Clone)]
pub struct BundledCatalogStore {
    games: Vec<GameInfo>,
}

impl Default for BundledCatalogStore {
    fn default() -> Self {
        Self::new(bundled_games())
    }
}

impl BundledCatalogStore {
    pub fn new(games: Vec<GameInfo>) -> Self {
        Self { games }
    }
}

#[async_trait]
impl GameCatalogStore for BundledCatalogStore {
    async fn available_games(&self) -> Result<Vec<GameInfo>, LibraryError> {
        Ok(self.games.clone())
    }
}

/// Read-only catalog façade
///
/// Never fails: any source error is logged and reported as an empty
/// catalog. Entries whose id repeats an earlier one are dropped so ids stay
/// unique.
#[derive(Clone)]
pub struct GameCatalog {
    store: Arc<dyn GameCatalogStore>,
}

impl Default for GameCatalog {
    fn default() -> Self {
        Self::new(Arc::new(BundledCatalogStore::default()))
    }
}

impl GameCatalog {
    pub fn new(store: Arc<dyn GameCatalogStore>) -> Self {
        Self { store }
    }

    /// Swap the underlying source
    pub fn set_store(&mut self, store: Arc<dyn GameCatalogStore>) {
        self.store = store;
    }

    /// All available games; empty on any failure
    pub async fn available_games(&self) -> Vec<GameInfo> {
        let games = match self.store.available_games().await {
            Ok(games) => games,
            Err(e) => {
                tracing::error!("Error getting available games: {}", e);
                return Vec::new();
            }
        };

        if games.is_empty() {
            tracing::warn!("No games found in the games list");
            return games;
        }

        let mut seen = HashSet::new();
        games
            .into_iter()
            .filter(|game| {
                let fresh = seen.insert(game.id.clone());
                if !fresh {
                    tracing::warn!("Dropping duplicate catalog id {}", game.id);
                }
                fresh
            })
            .collect()
    }
}
