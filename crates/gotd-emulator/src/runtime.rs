//! Emulator library seam

use crate::EmulatorError;
use async_trait::async_trait;
use gotd_config::{ButtonVisibility, ControlMap, EmulatorConfig, OptionMap};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

/// Settings published to the emulator library before its loader runs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmulatorOptions {
    /// CSS selector of the mount point
    pub player: String,
    pub core: String,
    pub game_url: String,
    pub path_to_data: String,
    pub start_on_loaded: bool,
    pub default_controls: ControlMap,
    pub default_options: OptionMap,
    pub buttons: ButtonVisibility,
}

impl EmulatorOptions {
    pub fn from_config(config: &EmulatorConfig, game_url: impl Into<String>) -> Self {
        Self {
            player: config.player_selector(),
            core: config.core.clone(),
            game_url: game_url.into(),
            path_to_data: config.path_to_data.clone(),
            start_on_loaded: config.start_on_loaded,
            default_controls: config.controls.clone(),
            default_options: config.options.clone(),
            buttons: config.buttons.clone(),
        }
    }

    /// The `EJS_*` globals the loader reads, in assignment order
    pub fn globals(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("EJS_player", json!(self.player)),
            ("EJS_core", json!(self.core)),
            ("EJS_gameUrl", json!(self.game_url)),
            ("EJS_pathtodata", json!(self.path_to_data)),
            ("EJS_startOnLoaded", json!(self.start_on_loaded)),
            ("EJS_defaultControls", json!(self.default_controls)),
            ("EJS_defaultOptions", json!(self.default_options)),
            ("EJS_Buttons", json!(self.buttons)),
        ]
    }
}

/// A running emulator instance
#[async_trait]
pub trait EmulatorInstance: Send + Sync {
    /// Whether the instance exposes a stop operation
    fn can_stop(&self) -> bool {
        true
    }

    async fn stop(&self) -> Result<(), EmulatorError>;
}

/// The emulator library's global state
///
/// The library reads its configuration from globals and publishes the live
/// instance into one global slot once it has booted.
pub trait EmulatorRuntime: Send + Sync {
    /// Publish configuration for the next boot
    fn configure(&self, options: &EmulatorOptions);

    /// The instance in the global slot, if any
    fn instance(&self) -> Option<Arc<dyn EmulatorInstance>>;

    /// Empty the global slot
    fn clear_instance(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_config() {
        let config = EmulatorConfig::default();
        let options = EmulatorOptions::from_config(&config, "/games/Luna.d64");

        assert_eq!(options.player, "#emulator-container");
        assert_eq!(options.core, "vice_x64");
        assert_eq!(options.game_url, "/games/Luna.d64");
        assert!(options.start_on_loaded);
        assert_eq!(options.default_controls, config.controls);
    }

    #[test]
    fn test_globals_names_and_values() {
        let options = EmulatorOptions::from_config(&EmulatorConfig::default(), "/games/Luna.d64");
        let globals = options.globals();

        let names: Vec<_> = globals.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            vec![
                "EJS_player",
                "EJS_core",
                "EJS_gameUrl",
                "EJS_pathtodata",
                "EJS_startOnLoaded",
                "EJS_defaultControls",
                "EJS_defaultOptions",
                "EJS_Buttons",
            ]
        );
        assert_eq!(globals[2].1, json!("/games/Luna.d64"));
        assert_eq!(globals[4].1, json!(true));
        assert!(globals[5].1.get("0").is_some());
    }
}
