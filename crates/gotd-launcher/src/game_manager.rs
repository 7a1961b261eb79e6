//! Game of the day façade

use crate::logutil::escape_log;
use crate::rotation;
use gotd_config::RotationPolicy;
use gotd_emulator::{EmulatorError, EmulatorManager};
use gotd_library::{
    Clock, GameCatalog, GameHistoryManager, GameHistoryMap, GameInfo, SystemClock, date_string,
};
use gotd_network::game_url;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Lifecycle of the current game as seen by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameState {
    #[default]
    Idle,
    Loading,
    Running,
    Error,
}

impl GameState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameState::Idle => "idle",
            GameState::Loading => "loading",
            GameState::Running => "running",
            GameState::Error => "error",
        }
    }
}

type Listener = Arc<dyn Fn(GameState) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Listener)>>,
}

/// Handle returned by [`GameManager::on_state_change`]
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Subscription {
    /// Stop receiving notifications; calling it again is harmless
    pub fn unsubscribe(&self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.entries.lock().retain(|(id, _)| *id != self.id);
        }
    }
}

/// Picks today's game and drives the emulator for it
pub struct GameManager {
    catalog: GameCatalog,
    history: Arc<GameHistoryManager>,
    emulator: Arc<EmulatorManager>,
    clock: Arc<dyn Clock>,
    rotation: RotationPolicy,
    state: Mutex<GameState>,
    last_error: Mutex<Option<EmulatorError>>,
    listeners: Arc<Listeners>,
}

impl GameManager {
    pub fn new(
        catalog: GameCatalog,
        history: Arc<GameHistoryManager>,
        emulator: Arc<EmulatorManager>,
    ) -> Self {
        Self {
            catalog,
            history,
            emulator,
            clock: Arc::new(SystemClock),
            rotation: RotationPolicy::default(),
            state: Mutex::new(GameState::Idle),
            last_error: Mutex::new(None),
            listeners: Arc::new(Listeners::default()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_rotation(mut self, rotation: RotationPolicy) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn rotation(&self) -> &RotationPolicy {
        &self.rotation
    }

    pub fn emulator(&self) -> &Arc<EmulatorManager> {
        &self.emulator
    }

    pub async fn available_games(&self) -> Vec<GameInfo> {
        self.catalog.available_games().await
    }

    /// Copy of the play history
    pub fn history(&self) -> GameHistoryMap {
        self.history.history()
    }

    /// Today's game, advancing the rotation when the previous pick expired
    ///
    /// Returns `None` for an empty catalog. A new pick is recorded in the
    /// history before it is returned.
    pub async fn todays_game(&self) -> Option<GameInfo> {
        let games = self.catalog.available_games().await;
        if games.is_empty() {
            tracing::warn!("No games available for today");
            return None;
        }

        let history = self.history.history();
        let now_ms = self.clock.now_ms();
        let today = date_string(self.clock.today());

        if let Some(game) =
            rotation::current_pick(&games, &history, &self.rotation, &today, now_ms)
        {
            tracing::debug!("Today's game is still {}", escape_log(&game.name));
            return Some(game.clone());
        }

        let game = games[rotation::next_index(&games, &history)].clone();
        self.history.update_game(&game.id, &today, now_ms);
        tracing::info!("New game of the day: {}", escape_log(&game.name));
        Some(game)
    }

    pub fn state(&self) -> GameState {
        *self.state.lock()
    }

    /// Error from the most recent failed start, cleared by the next start
    pub fn last_error(&self) -> Option<EmulatorError> {
        self.last_error.lock().clone()
    }

    /// Register a listener for state transitions
    ///
    /// Listeners run synchronously in registration order and only when the
    /// state actually changes.
    pub fn on_state_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(GameState) + Send + Sync + 'static,
    {
        let id = self.listeners.next_id.fetch_add(1, Ordering::SeqCst);
        self.listeners
            .entries
            .lock()
            .push((id, Arc::new(listener)));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    fn set_state(&self, state: GameState) {
        {
            let mut current = self.state.lock();
            if *current == state {
                return;
            }
            *current = state;
        }

        let listeners: Vec<Listener> = self
            .listeners
            .entries
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(state);
        }
    }

    /// URL the emulator loads for `game`
    pub fn game_url(&self, game: &GameInfo) -> String {
        match &self.emulator.config().games_base_url {
            Some(base) if !game.image_path.is_empty() => game_url(base, &game.image_path),
            _ => game.image_path.clone(),
        }
    }

    /// Start `game` in the emulator, replacing any running game
    pub async fn start_game(&self, game: &GameInfo) -> Result<(), EmulatorError> {
        *self.last_error.lock() = None;
        self.set_state(GameState::Loading);

        let url = self.game_url(game);
        tracing::info!("Starting {}", escape_log(&game.name));

        match self.emulator.initialize_emulator(&url).await {
            Ok(()) => {
                self.set_state(GameState::Running);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to start {}: {}", escape_log(&game.name), e);
                *self.last_error.lock() = Some(e.clone());
                self.set_state(GameState::Error);
                Err(e)
            }
        }
    }

    /// Start today's game; `Ok(None)` when the catalog is empty
    pub async fn start_todays_game(&self) -> Result<Option<GameInfo>, EmulatorError> {
        match self.todays_game().await {
            Some(game) => {
                self.start_game(&game).await?;
                Ok(Some(game))
            }
            None => Ok(None),
        }
    }

    /// Stop the running game; the emulator is released even if stopping fails
    pub async fn stop_game(&self) -> Result<(), EmulatorError> {
        let result = self.emulator.stop_emulator().await;
        self.set_state(GameState::Idle);
        result
    }

    pub fn reset_history(&self) {
        tracing::info!("Resetting game history");
        self.history.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gotd_config::EmulatorConfig;
    use gotd_emulator::mock::{MockDocument, MockRuntime};
    use gotd_library::{BundledCatalogStore, KeyValueHistoryStore, ManualClock};
    use gotd_storage::MemoryStore;

    fn game_manager(document: MockDocument, runtime: Arc<MockRuntime>) -> GameManager {
        let games = vec![
            GameInfo::new("g1", "Game One", "/games/One.d64", ""),
            GameInfo::new("g2", "Game Two", "", ""),
        ];
        let catalog = GameCatalog::new(Arc::new(BundledCatalogStore::new(games)));
        let history = Arc::new(GameHistoryManager::new(Arc::new(KeyValueHistoryStore::new(
            Arc::new(MemoryStore::new()),
            "history",
        ))));
        let emulator = Arc::new(EmulatorManager::new(
            EmulatorConfig::default(),
            Arc::new(document),
            runtime,
        ));

        GameManager::new(catalog, history, emulator).with_clock(Arc::new(ManualClock::new(0)))
    }

    fn recorder(manager: &GameManager) -> (Arc<Mutex<Vec<GameState>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let sub = manager.on_state_change(move |state| sink.lock().push(state));
        (seen, sub)
    }

    #[tokio::test]
    async fn test_start_notifies_loading_then_running() {
        let runtime = Arc::new(MockRuntime::new());
        let document = MockDocument::new()
            .with_container("emulator-container")
            .with_runtime(runtime.clone());
        let manager = game_manager(document, runtime);
        let (seen, _sub) = recorder(&manager);

        let game = manager.todays_game().await.unwrap();
        manager.start_game(&game).await.unwrap();
        manager.stop_game().await.unwrap();

        assert_eq!(
            *seen.lock(),
            vec![GameState::Loading, GameState::Running, GameState::Idle]
        );
    }

    #[tokio::test]
    async fn test_failed_start_reports_error_state() {
        let runtime = Arc::new(MockRuntime::new());
        let manager = game_manager(MockDocument::new(), runtime);
        let (seen, _sub) = recorder(&manager);

        let game = GameInfo::new("g2", "Game Two", "", "");
        let result = manager.start_game(&game).await;

        assert_eq!(result, Err(EmulatorError::NoGamePath));
        assert_eq!(manager.state(), GameState::Error);
        assert_eq!(manager.last_error(), Some(EmulatorError::NoGamePath));
        assert_eq!(*seen.lock(), vec![GameState::Loading, GameState::Error]);
    }

    #[tokio::test]
    async fn test_repeated_state_not_renotified() {
        let runtime = Arc::new(MockRuntime::new());
        let manager = game_manager(MockDocument::new(), runtime);
        let (seen, _sub) = recorder(&manager);

        manager.stop_game().await.unwrap();
        manager.stop_game().await.unwrap();

        assert!(seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_listeners_in_order_and_unsubscribe() {
        let runtime = Arc::new(MockRuntime::new());
        let manager = game_manager(MockDocument::new(), runtime);
        let calls = Arc::new(Mutex::new(Vec::new()));

        let first = calls.clone();
        let sub_a = manager.on_state_change(move |_| first.lock().push("a"));
        let second = calls.clone();
        let _sub_b = manager.on_state_change(move |_| second.lock().push("b"));

        manager.set_state(GameState::Loading);
        sub_a.unsubscribe();
        sub_a.unsubscribe();
        manager.set_state(GameState::Idle);

        assert_eq!(*calls.lock(), vec!["a", "b", "b"]);
    }

    #[tokio::test]
    async fn test_game_url_uses_base() {
        let runtime = Arc::new(MockRuntime::new());
        let config = EmulatorConfig {
            games_base_url: Some("https://cdn.example.com/games".to_string()),
            ..EmulatorConfig::default()
        };
        let emulator = Arc::new(EmulatorManager::new(
            config,
            Arc::new(MockDocument::new()),
            runtime,
        ));
        let history = Arc::new(GameHistoryManager::new(Arc::new(KeyValueHistoryStore::new(
            Arc::new(MemoryStore::new()),
            "history",
        ))));
        let manager = GameManager::new(GameCatalog::default(), history, emulator);

        let game = GameInfo::new("luna", "Luna", "/games/Luna Two.d64", "");
        assert_eq!(
            manager.game_url(&game),
            "https://cdn.example.com/games/Luna%20Two.d64"
        );
    }
}
