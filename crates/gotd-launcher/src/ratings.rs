//! Star ratings, remote or local

use crate::logutil::escape_log;
use gotd_library::{GameDatabase, LibraryError};
use gotd_network::{ApiClient, NetworkError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RatingError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Library(#[from] LibraryError),
}

/// Where ratings are read from and written to
///
/// Reads never fail; an unreachable or broken backend reads as unrated.
#[derive(Clone)]
pub enum RatingService {
    Remote(Arc<ApiClient>),
    Local(Arc<GameDatabase>),
}

impl RatingService {
    /// The user's rating, 0 if unrated
    pub async fn rating(&self, game_id: &str, user_id: &str) -> i64 {
        match self {
            RatingService::Remote(client) => client.rating(game_id, user_id).await.rating,
            RatingService::Local(db) => db.get_rating(game_id, user_id).unwrap_or_else(|e| {
                tracing::warn!(
                    "Failed to read rating for {}: {}",
                    escape_log(game_id),
                    e
                );
                0
            }),
        }
    }

    /// Mean rating, 0 if unrated
    pub async fn average(&self, game_id: &str) -> f64 {
        match self {
            RatingService::Remote(client) => client.average_rating(game_id).await.average,
            RatingService::Local(db) => db.average_rating(game_id).unwrap_or_else(|e| {
                tracing::warn!(
                    "Failed to read average rating for {}: {}",
                    escape_log(game_id),
                    e
                );
                0.0
            }),
        }
    }

    /// Store a rating in 0..=5 and return the stored value
    pub async fn rate(&self, game_id: &str, user_id: &str, stars: i64) -> Result<i64, RatingError> {
        match self {
            RatingService::Remote(client) => {
                Ok(client.post_rating(game_id, user_id, stars).await?.rating)
            }
            RatingService::Local(db) => {
                db.set_rating(game_id, user_id, stars)?;
                Ok(stars)
            }
        }
    }
}
