//! In-memory document and emulator runtime
//!
//! Used by tests and by the headless launcher profile. The document keeps a
//! flat element map; the runtime publishes a fresh instance whenever the
//! loader script finishes loading.

use crate::{DocumentHost, EmulatorError, EmulatorInstance, EmulatorOptions, EmulatorRuntime};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// A page element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockElement {
    pub tag: String,
    /// `src` or `href`
    pub url: Option<String>,
    pub children: Vec<String>,
    pub visible: bool,
}

impl MockElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// How the loader script load ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptOutcome {
    Load,
    Fail,
}

#[derive(Debug, Default)]
struct DocumentState {
    loaded: bool,
    elements: BTreeMap<String, MockElement>,
    scripts_injected: usize,
    stylesheets_injected: usize,
    gc_requests: usize,
}

/// In-memory page
pub struct MockDocument {
    available: bool,
    state: Mutex<DocumentState>,
    load_signal: Notify,
    runtime: Option<Arc<MockRuntime>>,
    script_outcome: Mutex<ScriptOutcome>,
    script_delay: Duration,
}

impl MockDocument {
    /// A loaded page with no elements
    pub fn new() -> Self {
        Self {
            available: true,
            state: Mutex::new(DocumentState {
                loaded: true,
                ..Default::default()
            }),
            load_signal: Notify::new(),
            runtime: None,
            script_outcome: Mutex::new(ScriptOutcome::Load),
            script_delay: Duration::ZERO,
        }
    }

    /// No document at all
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    pub fn with_container(self, id: &str) -> Self {
        self.state
            .lock()
            .elements
            .insert(id.to_string(), MockElement::new("div"));
        self
    }

    /// Boot `runtime` whenever the loader script loads
    pub fn with_runtime(mut self, runtime: Arc<MockRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Page still loading until [`Self::fire_load`]
    pub fn not_loaded(self) -> Self {
        self.state.lock().loaded = false;
        self
    }

    pub fn with_script_delay(mut self, delay: Duration) -> Self {
        self.script_delay = delay;
        self
    }

    pub fn failing_scripts(self) -> Self {
        self.set_script_outcome(ScriptOutcome::Fail);
        self
    }

    pub fn set_script_outcome(&self, outcome: ScriptOutcome) {
        *self.script_outcome.lock() = outcome;
    }

    /// Fire the page load event
    pub fn fire_load(&self) {
        self.state.lock().loaded = true;
        self.load_signal.notify_waiters();
    }

    pub fn element(&self, id: &str) -> Option<MockElement> {
        self.state.lock().elements.get(id).cloned()
    }

    /// Put content into an element, as a running emulator would
    pub fn set_children(&self, id: &str, children: Vec<String>) {
        if let Some(element) = self.state.lock().elements.get_mut(id) {
            element.children = children;
        }
    }

    pub fn scripts_injected(&self) -> usize {
        self.state.lock().scripts_injected
    }

    pub fn stylesheets_injected(&self) -> usize {
        self.state.lock().stylesheets_injected
    }

    pub fn gc_requests(&self) -> usize {
        self.state.lock().gc_requests
    }
}

impl Default for MockDocument {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentHost for MockDocument {
    fn is_available(&self) -> bool {
        self.available
    }

    fn is_loaded(&self) -> bool {
        self.state.lock().loaded
    }

    async fn wait_for_load(&self) {
        let notified = self.load_signal.notified();
        if self.state.lock().loaded {
            return;
        }
        notified.await;
    }

    fn has_element(&self, id: &str) -> bool {
        self.state.lock().elements.contains_key(id)
    }

    fn clear_element(&self, id: &str) -> bool {
        match self.state.lock().elements.get_mut(id) {
            Some(element) => {
                element.children.clear();
                true
            }
            None => false,
        }
    }

    fn show_element(&self, id: &str) {
        if let Some(element) = self.state.lock().elements.get_mut(id) {
            element.visible = true;
        }
    }

    fn remove_element(&self, id: &str) -> bool {
        self.state.lock().elements.remove(id).is_some()
    }

    fn append_stylesheet(&self, id: &str, href: &str) {
        let mut state = self.state.lock();
        state.stylesheets_injected += 1;
        state
            .elements
            .insert(id.to_string(), MockElement::new("link").with_url(href));
    }

    async fn append_script(&self, id: &str, src: &str) -> Result<(), EmulatorError> {
        {
            let mut state = self.state.lock();
            state.scripts_injected += 1;
            state
                .elements
                .insert(id.to_string(), MockElement::new("script").with_url(src));
        }

        if !self.script_delay.is_zero() {
            tokio::time::sleep(self.script_delay).await;
        }

        let outcome = *self.script_outcome.lock();
        match outcome {
            ScriptOutcome::Fail => Err(EmulatorError::ScriptLoad(src.to_string())),
            ScriptOutcome::Load => {
                if let Some(runtime) = &self.runtime {
                    runtime.script_loaded();
                }
                Ok(())
            }
        }
    }

    fn request_gc(&self) {
        self.state.lock().gc_requests += 1;
    }
}

/// When the runtime publishes an instance after its script loads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootMode {
    Immediate,
    After(Duration),
    Never,
}

/// In-memory emulator library globals
pub struct MockRuntime {
    boot: BootMode,
    options: Mutex<Option<EmulatorOptions>>,
    configure_calls: AtomicUsize,
    slot: Mutex<Option<Arc<MockInstance>>>,
    instances: Mutex<Vec<Arc<MockInstance>>>,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self::with_boot(BootMode::Immediate)
    }

    pub fn with_boot(boot: BootMode) -> Self {
        Self {
            boot,
            options: Mutex::new(None),
            configure_calls: AtomicUsize::new(0),
            slot: Mutex::new(None),
            instances: Mutex::new(Vec::new()),
        }
    }

    /// Put a new instance into the global slot
    pub fn publish(&self) -> Arc<MockInstance> {
        let instance = Arc::new(MockInstance::new());
        *self.slot.lock() = Some(Arc::clone(&instance));
        self.instances.lock().push(Arc::clone(&instance));
        instance
    }

    fn script_loaded(self: &Arc<Self>) {
        match self.boot {
            BootMode::Immediate => {
                self.publish();
            }
            BootMode::After(delay) => {
                let runtime = Arc::clone(self);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    runtime.publish();
                });
            }
            BootMode::Never => {}
        }
    }

    /// Last published configuration
    pub fn options(&self) -> Option<EmulatorOptions> {
        self.options.lock().clone()
    }

    pub fn configure_calls(&self) -> usize {
        self.configure_calls.load(Ordering::SeqCst)
    }

    pub fn has_instance(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Every instance published so far, oldest first
    pub fn instances(&self) -> Vec<Arc<MockInstance>> {
        self.instances.lock().clone()
    }
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl EmulatorRuntime for MockRuntime {
    fn configure(&self, options: &EmulatorOptions) {
        self.configure_calls.fetch_add(1, Ordering::SeqCst);
        *self.options.lock() = Some(options.clone());
    }

    fn instance(&self) -> Option<Arc<dyn EmulatorInstance>> {
        self.slot
            .lock()
            .clone()
            .map(|instance| instance as Arc<dyn EmulatorInstance>)
    }

    fn clear_instance(&self) {
        *self.slot.lock() = None;
    }
}

/// In-memory emulator instance
#[derive(Debug, Default)]
pub struct MockInstance {
    stop_calls: AtomicUsize,
    fail_stop: AtomicBool,
}

impl MockInstance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next stops fail
    pub fn fail_stop(&self) {
        self.fail_stop.store(true, Ordering::SeqCst);
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmulatorInstance for MockInstance {
    async fn stop(&self) -> Result<(), EmulatorError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(EmulatorError::StopFailed("instance refused to stop".into()));
        }
        Ok(())
    }
}
