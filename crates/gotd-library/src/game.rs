//! Catalog entries

use serde::{Deserialize, Deserializer, Serialize};

/// A playable game
///
/// Field names on the wire follow the catalog API (`d64Path`,
/// `thumbnailPath`). Entries are never mutated once a catalog source
/// returns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    /// Stable key, unique across the catalog
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,

    pub name: String,

    /// Path or URL of the loadable disk image
    #[serde(rename = "d64Path", alias = "path")]
    pub image_path: String,

    #[serde(default)]
    pub thumbnail_path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,

    /// Player count, e.g. "1" or "1-2"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players: Option<String>,
}

impl GameInfo {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        image_path: impl Into<String>,
        thumbnail_path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image_path: image_path.into(),
            thumbnail_path: thumbnail_path.into(),
            description: None,
            year: None,
            publisher: None,
            genre: None,
            players: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_players(mut self, players: impl Into<String>) -> Self {
        self.players = Some(players.into());
        self
    }

    /// Fill a missing id from the display name
    ///
    /// Some sources (directory listings) carry no id; the slug of the name
    /// is stable for a given file.
    pub fn ensure_id(mut self) -> Self {
        if self.id.trim().is_empty() {
            self.id = slug(&self.name);
        }
        self
    }
}

/// Lowercase ASCII alphanumerics joined by single dashes
pub(crate) fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            dash = false;
        } else if !dash && !out.is_empty() {
            out.push('-');
            dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

/// Games shipped with the application
pub fn bundled_games() -> Vec<GameInfo> {
    vec![
        GameInfo::new(
            "blockheads",
            "Blockheads",
            "/games/Blockheads.d64",
            "/games/thumbnails/blockheads.png",
        )
        .with_description(
            "A classic C64 platformer where you guide a character through a series of levels.",
        )
        .with_year(1986)
        .with_publisher("Ocean Software")
        .with_genre("Platform")
        .with_players("1"),
        GameInfo::new(
            "legacy-of-the-lost-spell",
            "Legacy of the Lost Spell",
            "/games/Legacy of the Lost Spell Preview + [BLZ].d64",
            "/games/thumbnails/default.png",
        )
        .with_description("A preview of a C64 RPG adventure with magic and exploration.")
        .with_year(2023)
        .with_publisher("Indie Developer")
        .with_genre("RPG")
        .with_players("1"),
        GameInfo::new(
            "luna",
            "Luna",
            "/games/Luna.d64",
            "/games/thumbnails/luna.png",
        )
        .with_description("A space adventure with puzzle elements set on the moon.")
        .with_year(2022)
        .with_publisher("Indie Developer")
        .with_genre("Adventure")
        .with_players("1"),
        GameInfo::new(
            "runngun",
            "Run N Gun",
            "/games/runngun.d64",
            "/games/thumbnails/RunNGun.png",
        )
        .with_description("A fast-paced run and gun game for the C64.")
        .with_year(2019)
        .with_publisher("Shallan")
        .with_genre("Run n Gun")
        .with_players("1"),
        GameInfo::new(
            "showdown",
            "Showdown",
            "/games/showdown.d64",
            "/games/thumbnails/Showdown.png",
        )
        .with_description(
            "A cowboy gun duel: the first to knock the opponent down five times wins.",
        )
        .with_year(2020)
        .with_publisher("Badgerpunch Games")
        .with_genre("Action")
        .with_players("1-2"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_bundled_ids_are_unique() {
        let games = bundled_games();
        let ids: HashSet<_> = games.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids.len(), games.len());
    }

    #[test]
    fn test_deserialize_api_record() {
        let json = r#"{
            "id": 7,
            "name": "Showdown",
            "d64Path": "/games/showdown.d64",
            "thumbnailPath": "/games/thumbnails/Showdown.png",
            "year": 2020,
            "players": "1-2"
        }"#;
        let game: GameInfo = serde_json::from_str(json).unwrap();
        assert_eq!(game.id, "7");
        assert_eq!(game.image_path, "/games/showdown.d64");
        assert_eq!(game.year, Some(2020));
        assert_eq!(game.publisher, None);
    }

    #[test]
    fn test_deserialize_listing_without_id() {
        let json = r#"{"name": "Luna", "d64Path": "/games/Luna.d64", "thumbnailPath": "/games/thumbnails/luna.png"}"#;
        let game: GameInfo = serde_json::from_str(json).unwrap();
        assert_eq!(game.id, "");
        assert_eq!(game.ensure_id().id, "luna");
    }

    #[test]
    fn test_serialize_uses_api_field_names() {
        let json = serde_json::to_value(&bundled_games()[0]).unwrap();
        assert_eq!(json["d64Path"], "/games/Blockheads.d64");
        assert_eq!(json["thumbnailPath"], "/games/thumbnails/blockheads.png");
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Legacy of the Lost Spell Preview + [BLZ]"), "legacy-of-the-lost-spell-preview-blz");
        assert_eq!(slug("  Run N Gun!! "), "run-n-gun");
    }
}
