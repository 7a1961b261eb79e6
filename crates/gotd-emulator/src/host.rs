//! Page seam

use crate::EmulatorError;
use async_trait::async_trait;

/// The document the emulator is mounted into
///
/// Elements are addressed by id. Implementations never create the container
/// element; that belongs to the surrounding page.
#[async_trait]
pub trait DocumentHost: Send + Sync {
    /// False when running without a document (headless, tests)
    fn is_available(&self) -> bool {
        true
    }

    /// Whether the page finished loading
    fn is_loaded(&self) -> bool;

    /// Suspend until the one-shot load signal fires; returns at once if
    /// already loaded
    async fn wait_for_load(&self);

    fn has_element(&self, id: &str) -> bool;

    /// Remove all children of an element; false if it does not exist
    fn clear_element(&self, id: &str) -> bool;

    /// Make an element visible
    fn show_element(&self, id: &str);

    /// Remove an element from the page; false if it did not exist
    fn remove_element(&self, id: &str) -> bool;

    /// Append `<link rel="stylesheet">` to the head
    fn append_stylesheet(&self, id: &str, href: &str);

    /// Append `<script>` to the head and wait for its load or error event
    async fn append_script(&self, id: &str, src: &str) -> Result<(), EmulatorError>;

    /// Garbage collection hint, if the host exposes one
    fn request_gc(&self) {}
}
