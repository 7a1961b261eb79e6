//! Emulator lifecycle management for the C64 game of the day
//!
//! Drives the third-party in-browser emulator through two seams:
//!
//! - [`DocumentHost`]: the page (container element, `<script>`/`<link>` tags,
//!   load state)
//! - [`EmulatorRuntime`]: the library's global configuration fields and its
//!   single global instance slot
//!
//! [`EmulatorManager`] owns the only active session and sequences teardown,
//! container setup, asset injection and readiness polling.

mod host;
mod manager;
pub mod mock;
mod page;
mod runtime;

pub use host::DocumentHost;
pub use manager::EmulatorManager;
pub use page::render_boot_page;
pub use runtime::{EmulatorInstance, EmulatorOptions, EmulatorRuntime};

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmulatorError {
    #[error("No game path provided")]
    NoGamePath,

    #[error("Document is not available")]
    DocumentUnavailable,

    #[error("Emulator container not found: #{0}")]
    ContainerNotFound(String),

    #[error("Failed to load emulator script: {0}")]
    ScriptLoad(String),

    #[error("Emulator initialization timed out after {0:?}")]
    ReadyTimeout(Duration),

    #[error("Error stopping emulator: {0}")]
    StopFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(EmulatorError::NoGamePath.to_string(), "No game path provided");
        assert_eq!(
            EmulatorError::ContainerNotFound("emulator-container".into()).to_string(),
            "Emulator container not found: #emulator-container"
        );
        assert!(
            EmulatorError::ReadyTimeout(Duration::from_secs(50))
                .to_string()
                .contains("50s")
        );
    }
}
