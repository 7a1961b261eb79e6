//! Backend API client

use crate::NetworkError;
use gotd_config::{ApiConfig, NOT_FOUND_GAME_NAME};
use gotd_library::GameInfo;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

/// A user's rating for one game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRating {
    pub game_id: String,
    pub user_id: String,
    pub rating: i64,
}

/// Mean rating for one game
#[derive(Debug, Clone, PartialEq)]
pub struct AverageRating {
    pub game_id: String,
    pub average: f64,
}

#[derive(Deserialize)]
struct RatingBody {
    rating: i64,
}

#[derive(Deserialize)]
struct AverageBody {
    #[serde(alias = "average")]
    rating: f64,
}

/// Client for the game of the day backend
pub struct ApiClient {
    base_url: Url,
    client: Client,
    game_of_the_day_timeout: Duration,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, NetworkError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| NetworkError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(NetworkError::InvalidUrl(config.base_url.clone()));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(format!("gotd/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url,
            client,
            game_of_the_day_timeout: Duration::from_millis(config.game_of_the_day_timeout_ms),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `<base>/api/<segments...>`, each segment percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, NetworkError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }

    /// Full game list
    pub async fn games(&self) -> Result<Vec<GameInfo>, NetworkError> {
        let url = self.endpoint(&["games"]);
        tracing::debug!("GET {}", url);
        let games: Vec<GameInfo> = self.get_json(self.client.get(url)).await?;
        Ok(games.into_iter().map(GameInfo::ensure_id).collect())
    }

    /// Server-side pick, or a placeholder entry if the backend has none
    pub async fn game_of_the_day(&self) -> GameInfo {
        let url = self.endpoint(&["game_of_the_day"]);
        tracing::debug!("GET {}", url);
        let request = self.client.get(url).timeout(self.game_of_the_day_timeout);

        match self.get_json::<GameInfo>(request).await {
            Ok(game) => game.ensure_id(),
            Err(e) => {
                tracing::warn!("Failed to fetch game of the day: {}", e);
                not_found_game()
            }
        }
    }

    /// A user's rating; 0 when unrated or unreachable
    pub async fn rating(&self, game_id: &str, user_id: &str) -> UserRating {
        let url = self.endpoint(&["games", game_id, "rating"]);
        tracing::debug!("GET {}", url);
        let request = self.client.get(url).query(&[("user_id", user_id)]);

        let rating = match self.get_json::<RatingBody>(request).await {
            Ok(body) => body.rating,
            Err(e) => {
                tracing::warn!("Failed to fetch rating for {}: {}", game_id, e);
                0
            }
        };
        UserRating {
            game_id: game_id.to_string(),
            user_id: user_id.to_string(),
            rating,
        }
    }

    /// Mean rating; 0 when unrated or unreachable
    pub async fn average_rating(&self, game_id: &str) -> AverageRating {
        let url = self.endpoint(&["games", game_id, "average_rating"]);
        tracing::debug!("GET {}", url);

        let average = match self.get_json::<AverageBody>(self.client.get(url)).await {
            Ok(body) => body.rating,
            Err(e) => {
                tracing::warn!("Failed to fetch average rating for {}: {}", game_id, e);
                0.0
            }
        };
        AverageRating {
            game_id: game_id.to_string(),
            average,
        }
    }

    /// Store a user's rating
    ///
    /// Out-of-range ratings and missing user ids are rejected before any
    /// request is made. A failed request yields a zero rating.
    pub async fn post_rating(
        &self,
        game_id: &str,
        user_id: &str,
        rating: i64,
    ) -> Result<UserRating, NetworkError> {
        if user_id.trim().is_empty() || user_id == "unknown" {
            return Err(NetworkError::InvalidUser(user_id.to_string()));
        }
        if !(0..=5).contains(&rating) {
            return Err(NetworkError::InvalidRating(rating));
        }

        let url = self.endpoint(&["games", game_id, "rating"]);
        tracing::debug!("POST {} rating={}", url, rating);
        let body = json!({
            "game_id": game_id_value(game_id),
            "user_id": user_id,
            "rating": rating,
        });
        let request = self.client.post(url).json(&body);

        let stored = match self.get_json::<RatingBody>(request).await {
            Ok(body) => body.rating,
            Err(e) => {
                tracing::warn!("Failed to post rating for {}: {}", game_id, e);
                0
            }
        };
        Ok(UserRating {
            game_id: game_id.to_string(),
            user_id: user_id.to_string(),
            rating: stored,
        })
    }
}

/// Placeholder shown when no game can be fetched
pub(crate) fn not_found_game() -> GameInfo {
    GameInfo::new("", NOT_FOUND_GAME_NAME, "", "")
}

/// Numeric ids go over the wire as numbers
fn game_id_value(game_id: &str) -> Value {
    match game_id.parse::<i64>() {
        Ok(n) => json!(n),
        Err(_) => json!(game_id),
    }
}
