//! Catalog backed by the HTTP API

use crate::ApiClient;
use async_trait::async_trait;
use gotd_library::{GameCatalogStore, GameInfo, LibraryError};
use std::sync::Arc;

/// Game list fetched from the backend on every read
#[derive(Clone)]
pub struct HttpCatalogStore {
    client: Arc<ApiClient>,
}

impl HttpCatalogStore {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GameCatalogStore for HttpCatalogStore {
    async fn available_games(&self) -> Result<Vec<GameInfo>, LibraryError> {
        self.client
            .games()
            .await
            .map_err(|e| LibraryError::Catalog(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gotd_config::ApiConfig;
    use gotd_library::GameCatalog;

    #[tokio::test]
    async fn test_unreachable_backend_is_empty_catalog() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_ms: 500,
            ..ApiConfig::default()
        };
        let client = Arc::new(ApiClient::new(&config).unwrap());
        let store = HttpCatalogStore::new(client);

        assert!(matches!(
            store.available_games().await,
            Err(LibraryError::Catalog(_))
        ));

        let catalog = GameCatalog::new(Arc::new(store));
        assert!(catalog.available_games().await.is_empty());
    }
}
