//! Emulator lifecycle management

use crate::{DocumentHost, EmulatorError, EmulatorInstance, EmulatorOptions, EmulatorRuntime};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use gotd_config::EmulatorConfig;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::time::MissedTickBehavior;

type ScriptLoad = Shared<BoxFuture<'static, Result<(), EmulatorError>>>;

/// Owns the single active emulator session
///
/// At most one session exists at a time. Any start first tears down the
/// previous session, and concurrent script loads share one in-flight load.
pub struct EmulatorManager {
    config: EmulatorConfig,
    document: Arc<dyn DocumentHost>,
    runtime: Arc<dyn EmulatorRuntime>,
    session: Mutex<Option<Arc<dyn EmulatorInstance>>>,
    script_load: Mutex<Option<ScriptLoad>>,
    script_loading: AtomicBool,
}

impl EmulatorManager {
    pub fn new(
        config: EmulatorConfig,
        document: Arc<dyn DocumentHost>,
        runtime: Arc<dyn EmulatorRuntime>,
    ) -> Self {
        Self {
            config,
            document,
            runtime,
            session: Mutex::new(None),
            script_load: Mutex::new(None),
            script_loading: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    /// Whether a session is held
    pub fn is_running(&self) -> bool {
        self.session.lock().is_some()
    }

    pub fn is_script_loading(&self) -> bool {
        self.script_loading.load(Ordering::SeqCst)
    }

    /// Empty and show the container element
    pub fn ensure_container(&self) -> Result<(), EmulatorError> {
        if !self.document.is_available() {
            return Err(EmulatorError::DocumentUnavailable);
        }

        let id = &self.config.container_id;
        if !self.document.clear_element(id) {
            tracing::error!("Emulator container #{} not found", id);
            return Err(EmulatorError::ContainerNotFound(id.clone()));
        }
        self.document.show_element(id);
        Ok(())
    }

    /// Empty the container and hint a GC; no-op without a document
    pub fn cleanup_container(&self) {
        if !self.document.is_available() {
            return;
        }

        self.document.clear_element(&self.config.container_id);
        self.document.request_gc();
    }

    /// Load the emulator loader script once
    ///
    /// Resolves immediately if the runtime already holds an instance.
    /// Concurrent callers await the same in-flight load, and
    /// [`Self::is_script_loading`] is true only until it settles. A failed
    /// load is forgotten so the next call retries.
    pub async fn load_emulator_script(&self) -> Result<(), EmulatorError> {
        if self.runtime.instance().is_some() {
            return Ok(());
        }

        let load = {
            let mut slot = self.script_load.lock();
            match slot.as_ref() {
                Some(load) => load.clone(),
                None => {
                    let load = self.begin_script_load();
                    *slot = Some(load.clone());
                    self.script_loading.store(true, Ordering::SeqCst);
                    load
                }
            }
        };

        let result = load.clone().await;
        if let Err(e) = &result {
            tracing::error!("{}", e);
        }

        // A stop or a newer load may have replaced the slot meanwhile
        let mut slot = self.script_load.lock();
        if slot.as_ref().is_some_and(|current| current.ptr_eq(&load)) {
            self.script_loading.store(false, Ordering::SeqCst);
            if result.is_err() {
                *slot = None;
            }
        }
        result
    }

    fn begin_script_load(&self) -> ScriptLoad {
        let document = Arc::clone(&self.document);
        let id = self.config.script_id.clone();
        let src = self.config.script_url.clone();

        async move {
            if document.remove_element(&id) {
                tracing::debug!("Removed stale emulator script #{}", id);
            }
            document.append_script(&id, &src).await
        }
        .boxed()
        .shared()
    }

    /// Stop the active session, if any, and release everything it held
    ///
    /// Release happens even when the instance fails to stop; the stop error
    /// is still returned to the caller.
    pub async fn stop_emulator(&self) -> Result<(), EmulatorError> {
        let session = self.session.lock().take();

        let result = match session {
            Some(instance) if instance.can_stop() => {
                tracing::info!("Stopping emulator");
                instance.stop().await
            }
            _ => Ok(()),
        };
        if let Err(e) = &result {
            tracing::error!("{}", e);
        }

        self.release();
        result
    }

    fn release(&self) {
        *self.session.lock() = None;
        self.runtime.clear_instance();
        self.script_loading.store(false, Ordering::SeqCst);
        *self.script_load.lock() = None;
        self.cleanup_container();
    }

    /// Start a game; see [`Self::initialize_emulator_with`]
    pub async fn initialize_emulator(&self, game_path: &str) -> Result<(), EmulatorError> {
        self.initialize_emulator_with(game_path, || {}).await
    }

    /// Start a game, replacing any running session
    ///
    /// `on_started` runs once the container is prepared, before the
    /// emulator loads. Any failure after that point tears the partial
    /// session down again.
    pub async fn initialize_emulator_with<F>(
        &self,
        game_path: &str,
        on_started: F,
    ) -> Result<(), EmulatorError>
    where
        F: FnOnce() + Send,
    {
        if game_path.is_empty() {
            tracing::error!("No game path provided");
            return Err(EmulatorError::NoGamePath);
        }

        tracing::info!("Initializing emulator for {}", game_path);
        self.stop_emulator().await?;
        self.cleanup_container();

        if !self.document.is_loaded() {
            tracing::debug!("Waiting for document load");
            self.document.wait_for_load().await;
        }

        self.ensure_container()?;
        on_started();

        match self.start_session(game_path).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!("Failed to initialize emulator: {}", e);
                self.release();
                Err(e)
            }
        }
    }

    async fn start_session(&self, game_path: &str) -> Result<(), EmulatorError> {
        let options = EmulatorOptions::from_config(&self.config, game_path);
        self.runtime.configure(&options);
        self.inject_stylesheet();

        self.load_emulator_script().await?;
        let instance = self.wait_until_ready().await?;

        *self.session.lock() = Some(instance);
        tracing::info!("Emulator running {}", game_path);
        Ok(())
    }

    fn inject_stylesheet(&self) {
        if !self.document.has_element(&self.config.css_id) {
            self.document
                .append_stylesheet(&self.config.css_id, &self.config.css_url);
        }
    }

    async fn wait_until_ready(&self) -> Result<Arc<dyn EmulatorInstance>, EmulatorError> {
        let deadline = self.config.ready_timeout();
        let mut ticker = tokio::time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let poll = async {
            loop {
                ticker.tick().await;
                if let Some(instance) = self.runtime.instance() {
                    return instance;
                }
            }
        };

        tokio::time::timeout(deadline, poll).await.map_err(|_| {
            tracing::warn!("Emulator not ready after {:?}", deadline);
            EmulatorError::ReadyTimeout(deadline)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDocument, MockRuntime};

    fn manager(document: MockDocument, runtime: Arc<MockRuntime>) -> EmulatorManager {
        EmulatorManager::new(EmulatorConfig::default(), Arc::new(document), runtime)
    }

    #[test]
    fn test_ensure_container_missing() {
        let runtime = Arc::new(MockRuntime::new());
        let manager = manager(MockDocument::new(), runtime);

        assert_eq!(
            manager.ensure_container(),
            Err(EmulatorError::ContainerNotFound("emulator-container".into()))
        );
    }

    #[test]
    fn test_ensure_container_without_document() {
        let runtime = Arc::new(MockRuntime::new());
        let manager = manager(MockDocument::unavailable(), runtime);

        assert_eq!(
            manager.ensure_container(),
            Err(EmulatorError::DocumentUnavailable)
        );
        manager.cleanup_container();
    }

    #[tokio::test]
    async fn test_script_skipped_when_instance_exists() {
        let runtime = Arc::new(MockRuntime::new());
        runtime.publish();
        let document = Arc::new(MockDocument::new().with_container("emulator-container"));
        let manager = EmulatorManager::new(
            EmulatorConfig::default(),
            document.clone(),
            runtime.clone(),
        );

        manager.load_emulator_script().await.unwrap();
        assert_eq!(document.scripts_injected(), 0);
        assert!(!manager.is_script_loading());
    }

    #[tokio::test]
    async fn test_stop_without_session() {
        let runtime = Arc::new(MockRuntime::new());
        let manager = manager(MockDocument::new(), runtime);

        assert!(manager.stop_emulator().await.is_ok());
        assert!(!manager.is_running());
    }
}
