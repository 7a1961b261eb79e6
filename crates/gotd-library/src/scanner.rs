//! Disk image directory scanning

use crate::{GameCatalogStore, GameInfo, LibraryError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory scanner configuration
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Disk image extensions to pick up
    pub extensions: HashSet<String>,

    /// URL prefix the images are served under
    pub url_prefix: String,

    /// Thumbnail sub-directory, relative to the games directory
    pub thumbnails_dir: String,

    /// Thumbnail used when a game has none of its own
    pub default_thumbnail: String,

    /// Skip hidden files
    pub skip_hidden: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        let mut extensions = HashSet::new();
        extensions.insert("d64".to_string());

        Self {
            extensions,
            url_prefix: "/games".to_string(),
            thumbnails_dir: "thumbnails".to_string(),
            default_thumbnail: "default.png".to_string(),
            skip_hidden: true,
        }
    }
}

/// Catalog built from the disk images present in a directory
#[derive(Debug, Clone)]
pub struct DirectoryCatalogStore {
    games_dir: PathBuf,
    config: ScanConfig,
}

impl DirectoryCatalogStore {
    pub fn new(games_dir: impl Into<PathBuf>) -> Self {
        Self::with_config(games_dir, ScanConfig::default())
    }

    pub fn with_config(games_dir: impl Into<PathBuf>, config: ScanConfig) -> Self {
        Self {
            games_dir: games_dir.into(),
            config,
        }
    }

    /// Scan the directory, sorted by name
    pub fn scan(&self) -> Result<Vec<GameInfo>, LibraryError> {
        if !self.games_dir.is_dir() {
            return Err(LibraryError::PathNotFound(self.games_dir.clone()));
        }

        let mut games = Vec::new();
        for entry in fs::read_dir(&self.games_dir)? {
            let entry = entry?;
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().to_string();

            if self.config.skip_hidden && file_name.starts_with('.') {
                continue;
            }

            if path.is_file()
                && let Some(ext) = path.extension().and_then(|e| e.to_str())
                && self.config.extensions.contains(&ext.to_lowercase())
                && let Some(game) = self.create_game(&path, &file_name)
            {
                games.push(game);
            }
        }

        games.sort_by(|a, b| a.name.cmp(&b.name));
        tracing::debug!(
            "Scanned {} games in {}",
            games.len(),
            self.games_dir.display()
        );
        Ok(games)
    }

    /// Create a catalog entry from an image file
    fn create_game(&self, path: &Path, file_name: &str) -> Option<GameInfo> {
        let name = path.file_stem()?.to_string_lossy().to_string();
        let thumb_file = format!("{}.png", name.to_lowercase());
        let prefix = self.config.url_prefix.trim_end_matches('/');
        let thumbs = &self.config.thumbnails_dir;

        let thumbnail_path = if self.games_dir.join(thumbs).join(&thumb_file).is_file() {
            format!("{}/{}/{}", prefix, thumbs, thumb_file)
        } else {
            format!("{}/{}/{}", prefix, thumbs, self.config.default_thumbnail)
        };

        Some(
            GameInfo::new(
                "",
                name,
                format!("{}/{}", prefix, file_name),
                thumbnail_path,
            )
            .ensure_id(),
        )
    }
}

#[async_trait]
impl GameCatalogStore for DirectoryCatalogStore {
    async fn available_games(&self) -> Result<Vec<GameInfo>, LibraryError> {
        self.scan()
    }
}
