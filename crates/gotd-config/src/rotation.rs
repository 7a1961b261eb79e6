//! Game rotation policy

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ONE_DAY_SECS: u64 = 24 * 60 * 60;

/// Short window used when developing locally
pub const DEV_WINDOW_SECS: u64 = 60;

/// How long a selected game stays "today's" game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RotationPolicy {
    /// Same game until the calendar date changes
    #[default]
    CalendarDay,

    /// Same game until a fixed amount of wall-clock time has elapsed
    FixedWindow { window_secs: u64 },
}

impl RotationPolicy {
    /// 24 hour elapsed-time window
    pub fn daily_window() -> Self {
        RotationPolicy::FixedWindow {
            window_secs: ONE_DAY_SECS,
        }
    }

    /// One minute window for local testing
    pub fn development() -> Self {
        RotationPolicy::FixedWindow {
            window_secs: DEV_WINDOW_SECS,
        }
    }

    /// Window length, if the policy is time based
    pub fn window(&self) -> Option<Duration> {
        match self {
            RotationPolicy::CalendarDay => None,
            RotationPolicy::FixedWindow { window_secs } => Some(Duration::from_secs(*window_secs)),
        }
    }
}
