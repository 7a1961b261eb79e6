//! HTTP API client for the C64 game of the day backend
//!
//! The backend serves the game list, a server-side game of the day and
//! per-user star ratings. Read paths degrade to neutral values when the
//! backend is unreachable; only local input validation surfaces as an error.

mod catalog;
mod client;
mod url;

pub use catalog::HttpCatalogStore;
pub use client::{ApiClient, AverageRating, UserRating};
pub use url::game_url;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Server returned {0}")]
    Status(u16),

    #[error("Rating must be between 0 and 5, got {0}")]
    InvalidRating(i64),

    #[error("Invalid user id: {0:?}")]
    InvalidUser(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(NetworkError::Status(404).to_string(), "Server returned 404");
        assert!(NetworkError::InvalidRating(9).to_string().contains('9'));
    }
}
