//! Game catalog and rating database using SQLite

use crate::{GameCatalogStore, GameInfo, LibraryError};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

/// Game database manager
pub struct GameDatabase {
    conn: Mutex<Connection>,
}

impl GameDatabase {
    /// Open or create a database
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LibraryError> {
        let conn = Connection::open(path)?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;

        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self, LibraryError> {
        let conn = Connection::open_in_memory()?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;

        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<(), LibraryError> {
        self.conn.lock().execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS games (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                d64_path TEXT NOT NULL,
                thumbnail_path TEXT NOT NULL,
                description TEXT,
                year INTEGER,
                publisher TEXT,
                genre TEXT,
                players TEXT
            );

            CREATE TABLE IF NOT EXISTS ratings (
                game_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                rating INTEGER NOT NULL CHECK(rating BETWEEN 0 AND 5),
                PRIMARY KEY (game_id, user_id)
            );

            CREATE INDEX IF NOT EXISTS idx_games_name ON games(name);
        "#,
        )?;

        Ok(())
    }

    /// Add or replace a game
    pub fn add_game(&self, game: &GameInfo) -> Result<(), LibraryError> {
        self.conn.lock().execute(
            r#"INSERT OR REPLACE INTO games
               (id, name, d64_path, thumbnail_path, description, year, publisher, genre, players)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
            params![
                game.id,
                game.name,
                game.image_path,
                game.thumbnail_path,
                game.description,
                game.year,
                game.publisher,
                game.genre,
                game.players,
            ],
        )?;
        Ok(())
    }

    /// Seed the games table if it is empty; returns the number inserted
    pub fn populate_with(&self, games: &[GameInfo]) -> Result<usize, LibraryError> {
        if self.game_count()? > 0 {
            return Ok(0);
        }

        for game in games {
            self.add_game(game)?;
        }
        tracing::info!("Seeded game database with {} games", games.len());
        Ok(games.len())
    }

    /// Get a game by id
    pub fn get_game(&self, id: &str) -> Result<Option<GameInfo>, LibraryError> {
        let game = self
            .conn
            .lock()
            .query_row(
                "SELECT * FROM games WHERE id = ?1",
                params![id],
                Self::row_to_game,
            )
            .optional()?;

        Ok(game)
    }

    /// Get all games, ordered by id
    pub fn get_all_games(&self) -> Result<Vec<GameInfo>, LibraryError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT * FROM games ORDER BY id")?;

        let games = stmt
            .query_map([], Self::row_to_game)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(games)
    }

    /// Get total game count
    pub fn game_count(&self) -> Result<i64, LibraryError> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM games", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Server-side pick: proleptic Gregorian day number modulo catalog size
    pub fn game_of_the_day(&self, date: NaiveDate) -> Result<GameInfo, LibraryError> {
        let games = self.get_all_games()?;
        if games.is_empty() {
            return Err(LibraryError::NoGames);
        }

        let ordinal = i64::from(date.num_days_from_ce());
        let idx = ordinal.rem_euclid(games.len() as i64) as usize;
        Ok(games[idx].clone())
    }

    /// Insert or update a user's rating
    pub fn set_rating(&self, game_id: &str, user_id: &str, rating: i64) -> Result<(), LibraryError> {
        if user_id.trim().is_empty() || user_id == "unknown" {
            return Err(LibraryError::InvalidUser(user_id.to_string()));
        }
        if !(0..=5).contains(&rating) {
            return Err(LibraryError::InvalidRating(rating));
        }

        self.conn.lock().execute(
            r#"INSERT INTO ratings (game_id, user_id, rating) VALUES (?1, ?2, ?3)
               ON CONFLICT(game_id, user_id) DO UPDATE SET rating = excluded.rating"#,
            params![game_id, user_id, rating],
        )?;
        Ok(())
    }

    /// A user's rating for a game, 0 if unrated
    pub fn get_rating(&self, game_id: &str, user_id: &str) -> Result<i64, LibraryError> {
        let rating = self
            .conn
            .lock()
            .query_row(
                "SELECT rating FROM ratings WHERE game_id = ?1 AND user_id = ?2",
                params![game_id, user_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(rating.unwrap_or(0))
    }

    /// Mean rating for a game, 0.0 if unrated
    pub fn average_rating(&self, game_id: &str) -> Result<f64, LibraryError> {
        let avg: Option<f64> = self.conn.lock().query_row(
            "SELECT AVG(rating) FROM ratings WHERE game_id = ?1",
            params![game_id],
            |row| row.get(0),
        )?;

        Ok(avg.unwrap_or(0.0))
    }

    /// Convert a row to a GameInfo
    fn row_to_game(row: &rusqlite::Row) -> rusqlite::Result<GameInfo> {
        Ok(GameInfo {
            id: row.get("id")?,
            name: row.get("name")?,
            image_path: row.get("d64_path")?,
            thumbnail_path: row.get("thumbnail_path")?,
            description: row.get("description")?,
            year: row.get("year")?,
            publisher: row.get("publisher")?,
            genre: row.get("genre")?,
            players: row.get("players")?,
        })
    }
}

#[async_trait]
impl GameCatalogStore for GameDatabase {
    async fn available_games(&self) -> Result<Vec<GameInfo>, LibraryError> {
        self.get_all_games()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundled_games;

    #[test]
    fn test_database_creation() {
        let db = GameDatabase::in_memory().unwrap();
        assert_eq!(db.game_count().unwrap(), 0);
    }

    #[test]
    fn test_add_and_get_game() {
        let db = GameDatabase::in_memory().unwrap();
        let game = GameInfo::new("luna", "Luna", "/games/Luna.d64", "/t.png").with_year(2022);

        db.add_game(&game).unwrap();
        let retrieved = db.get_game("luna").unwrap().unwrap();

        assert_eq!(retrieved, game);
        assert_eq!(db.get_game("missing").unwrap(), None);
    }

    #[test]
    fn test_populate_only_when_empty() {
        let db = GameDatabase::in_memory().unwrap();
        let games = bundled_games();

        assert_eq!(db.populate_with(&games).unwrap(), games.len());
        assert_eq!(db.populate_with(&games).unwrap(), 0);
        assert_eq!(db.game_count().unwrap(), games.len() as i64);
    }

    #[test]
    fn test_all_games_ordered_by_id() {
        let db = GameDatabase::in_memory().unwrap();
        db.populate_with(&bundled_games()).unwrap();

        let ids: Vec<_> = db.get_all_games().unwrap().into_iter().map(|g| g.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_game_of_the_day_rotates_by_date() {
        let db = GameDatabase::in_memory().unwrap();
        db.add_game(&GameInfo::new("a", "A", "/a.d64", "")).unwrap();
        db.add_game(&GameInfo::new("b", "B", "/b.d64", "")).unwrap();

        let day = NaiveDate::from_ymd_opt(2025, 6, 23).unwrap();
        let next = day.succ_opt().unwrap();
        let first = db.game_of_the_day(day).unwrap();
        let second = db.game_of_the_day(next).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(db.game_of_the_day(day).unwrap(), first);
    }

    #[test]
    fn test_game_of_the_day_empty() {
        let db = GameDatabase::in_memory().unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 6, 23).unwrap();
        assert!(matches!(db.game_of_the_day(day), Err(LibraryError::NoGames)));
    }

    #[test]
    fn test_ratings() {
        let db = GameDatabase::in_memory().unwrap();
        assert_eq!(db.get_rating("luna", "user-1").unwrap(), 0);
        assert_eq!(db.average_rating("luna").unwrap(), 0.0);

        db.set_rating("luna", "user-1", 4).unwrap();
        db.set_rating("luna", "user-2", 2).unwrap();
        db.set_rating("luna", "user-1", 5).unwrap();

        assert_eq!(db.get_rating("luna", "user-1").unwrap(), 5);
        assert_eq!(db.average_rating("luna").unwrap(), 3.5);
    }

    #[test]
    fn test_rating_validation() {
        let db = GameDatabase::in_memory().unwrap();
        assert!(matches!(
            db.set_rating("luna", "user-1", 6),
            Err(LibraryError::InvalidRating(6))
        ));
        assert!(matches!(
            db.set_rating("luna", "unknown", 3),
            Err(LibraryError::InvalidUser(_))
        ));
        assert!(matches!(
            db.set_rating("luna", "", 3),
            Err(LibraryError::InvalidUser(_))
        ));
    }
}
