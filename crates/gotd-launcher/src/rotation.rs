//! Game rotation over catalog order
//!
//! The "last index" is the catalog position of the game with the most recent
//! `last_played_time`. History entries for games no longer in the catalog
//! are ignored.

use gotd_config::RotationPolicy;
use gotd_library::{GameHistoryMap, GameInfo};

/// Catalog index of the most recently played game
pub fn last_index(games: &[GameInfo], history: &GameHistoryMap) -> Option<usize> {
    games
        .iter()
        .enumerate()
        .filter_map(|(idx, game)| history.get(&game.id).map(|e| (idx, e.last_played_time)))
        .max_by_key(|(_, time)| *time)
        .map(|(idx, _)| idx)
}

/// Round-robin successor of the last pick, 0 without history
pub fn next_index(games: &[GameInfo], history: &GameHistoryMap) -> usize {
    match last_index(games, history) {
        Some(idx) if !games.is_empty() => (idx + 1) % games.len(),
        _ => 0,
    }
}

/// The pick that is still current under `policy`, if any
pub fn current_pick<'a>(
    games: &'a [GameInfo],
    history: &GameHistoryMap,
    policy: &RotationPolicy,
    today: &str,
    now_ms: i64,
) -> Option<&'a GameInfo> {
    match policy {
        RotationPolicy::CalendarDay => games
            .iter()
            .filter_map(|game| history.get(&game.id).map(|e| (game, e)))
            .filter(|(_, entry)| entry.last_played == today)
            .max_by_key(|(_, entry)| entry.last_played_time)
            .map(|(game, _)| game),
        RotationPolicy::FixedWindow { window_secs } => {
            let idx = last_index(games, history)?;
            let entry = history.get(&games[idx].id)?;
            let window_ms = i64::try_from(window_secs.saturating_mul(1000)).unwrap_or(i64::MAX);
            (now_ms.saturating_sub(entry.last_played_time) < window_ms).then_some(&games[idx])
        }
    }
}
