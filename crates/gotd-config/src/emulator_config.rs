//! External emulator configuration
//!
//! Well-known element ids, asset URLs and the default control, option and
//! button maps handed to the emulator library before its loader runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// One keyboard/gamepad binding, in the shape the emulator library expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlBinding {
    /// Keyboard key
    pub value: String,

    /// Gamepad button
    pub value2: String,
}

impl ControlBinding {
    pub fn new(value: impl Into<String>, value2: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            value2: value2.into(),
        }
    }
}

/// Player index -> button index -> binding
pub type ControlMap = BTreeMap<String, BTreeMap<String, ControlBinding>>;

/// Core option name -> value
pub type OptionMap = BTreeMap<String, String>;

/// Toolbar button name -> shown
pub type ButtonVisibility = BTreeMap<String, bool>;

/// Global emulator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmulatorConfig {
    /// Id of the page element the emulator mounts into
    #[serde(default = "default_container_id")]
    pub container_id: String,

    #[serde(default = "default_script_url")]
    pub script_url: String,

    #[serde(default = "default_script_id")]
    pub script_id: String,

    #[serde(default = "default_css_url")]
    pub css_url: String,

    #[serde(default = "default_css_id")]
    pub css_id: String,

    /// Emulator core identifier
    #[serde(default = "default_core")]
    pub core: String,

    /// Base URL for the core's data files
    #[serde(default = "default_path_to_data")]
    pub path_to_data: String,

    #[serde(default = "default_true")]
    pub start_on_loaded: bool,

    /// Host serving the disk images; catalog paths are used as-is when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub games_base_url: Option<String>,

    /// Readiness poll interval
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Overall readiness deadline
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,

    #[serde(default = "default_controls")]
    pub controls: ControlMap,

    #[serde(default = "default_options")]
    pub options: OptionMap,

    #[serde(default = "default_buttons")]
    pub buttons: ButtonVisibility,
}

fn default_container_id() -> String {
    "emulator-container".to_string()
}

fn default_script_url() -> String {
    "https://cdn.emulatorjs.org/stable/data/loader.js".to_string()
}

fn default_script_id() -> String {
    "emulatorjs-script".to_string()
}

fn default_css_url() -> String {
    "https://cdn.emulatorjs.org/stable/data/emulator.min.css".to_string()
}

fn default_css_id() -> String {
    "emulatorjs-css".to_string()
}

fn default_core() -> String {
    "vice_x64".to_string()
}

fn default_path_to_data() -> String {
    "https://cdn.emulatorjs.org/stable/data/".to_string()
}

fn default_true() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_ready_timeout_ms() -> u64 {
    50_000
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            container_id: default_container_id(),
            script_url: default_script_url(),
            script_id: default_script_id(),
            css_url: default_css_url(),
            css_id: default_css_id(),
            core: default_core(),
            path_to_data: default_path_to_data(),
            start_on_loaded: true,
            games_base_url: None,
            poll_interval_ms: default_poll_interval_ms(),
            ready_timeout_ms: default_ready_timeout_ms(),
            controls: default_controls(),
            options: default_options(),
            buttons: default_buttons(),
        }
    }
}

impl EmulatorConfig {
    /// CSS selector for the container element
    pub fn player_selector(&self) -> String {
        format!("#{}", self.container_id)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

/// Keyboard layout shared by both joystick ports
const PLAYER_BINDINGS: [(&str, &str); 14] = [
    ("space", "BUTTON_2"),
    ("s", "BUTTON_4"),
    ("v", "SELECT"),
    ("enter", "START"),
    ("up arrow", "DPAD_UP"),
    ("down arrow", "DPAD_DOWN"),
    ("left arrow", "DPAD_LEFT"),
    ("right arrow", "DPAD_RIGHT"),
    ("z", "BUTTON_1"),
    ("a", "BUTTON_3"),
    ("q", "LEFT_TOP_SHOULDER"),
    ("e", "RIGHT_TOP_SHOULDER"),
    ("tab", "LEFT_BOTTOM_SHOULDER"),
    ("r", "RIGHT_BOTTOM_SHOULDER"),
];

/// Default controls: players 0 and 1 bound, players 2 and 3 empty
pub fn default_controls() -> ControlMap {
    let bound: BTreeMap<String, ControlBinding> = PLAYER_BINDINGS
        .iter()
        .enumerate()
        .map(|(index, (key, button))| (index.to_string(), ControlBinding::new(*key, *button)))
        .collect();

    let mut controls = ControlMap::new();
    controls.insert("0".into(), bound.clone());
    controls.insert("1".into(), bound);
    controls.insert("2".into(), BTreeMap::new());
    controls.insert("3".into(), BTreeMap::new());
    controls
}

/// Default core options (warp on disk access, keyboard-as-gamepad)
pub fn default_options() -> OptionMap {
    [
        ("vice_warp_boost", "enabled"),
        ("vice_autoloadwarp", "enabled"),
        ("input_autodetect_enable", "true"),
        ("input_keyboard_gamepad_mapping_type", "1"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Default toolbar buttons
pub fn default_buttons() -> ButtonVisibility {
    [
        ("playPause", true),
        ("restart", true),
        ("mute", true),
        ("settings", true),
        ("fullscreen", true),
        ("saveState", false),
        ("loadState", false),
        ("screenRecord", false),
        ("gamepad", true),
        ("cheat", false),
        ("volume", true),
        ("saveSavFiles", false),
        ("loadSavFiles", false),
        ("quickSave", false),
        ("quickLoad", false),
        ("screenshot", false),
        ("cacheManager", false),
        ("exitEmulation", true),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}
