//! Emulator lifecycle tests against the in-memory document and runtime

use gotd_config::EmulatorConfig;
use gotd_emulator::mock::{BootMode, MockDocument, MockRuntime, ScriptOutcome};
use gotd_emulator::{EmulatorError, EmulatorManager};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const CONTAINER: &str = "emulator-container";
const GAME: &str = "/games/Luna.d64";

/// Test environment wiring a manager to a mock page and runtime
struct EmulatorTestEnv {
    document: Arc<MockDocument>,
    runtime: Arc<MockRuntime>,
    manager: EmulatorManager,
}

impl EmulatorTestEnv {
    fn new() -> Self {
        Self::build(BootMode::Immediate, |doc| doc)
    }

    fn build(boot: BootMode, customize: impl FnOnce(MockDocument) -> MockDocument) -> Self {
        let runtime = Arc::new(MockRuntime::with_boot(boot));
        let document = customize(
            MockDocument::new()
                .with_container(CONTAINER)
                .with_runtime(runtime.clone()),
        );
        let document = Arc::new(document);
        let manager =
            EmulatorManager::new(EmulatorConfig::default(), document.clone(), runtime.clone());

        Self {
            document,
            runtime,
            manager,
        }
    }

    fn container_children(&self) -> Vec<String> {
        self.document
            .element(CONTAINER)
            .map(|e| e.children)
            .unwrap_or_default()
    }
}

#[tokio::test]
async fn test_empty_path_rejected_without_side_effects() {
    let env = EmulatorTestEnv::new();
    env.document
        .set_children(CONTAINER, vec!["placeholder".to_string()]);

    let result = env.manager.initialize_emulator("").await;

    assert_eq!(result, Err(EmulatorError::NoGamePath));
    assert_eq!(env.container_children(), vec!["placeholder".to_string()]);
    assert_eq!(env.document.scripts_injected(), 0);
    assert_eq!(env.document.stylesheets_injected(), 0);
    assert_eq!(env.runtime.configure_calls(), 0);
}

#[tokio::test]
async fn test_initialize_starts_session() {
    let env = EmulatorTestEnv::new();
    let started = Arc::new(AtomicUsize::new(0));
    let counter = started.clone();

    env.manager
        .initialize_emulator_with(GAME, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .unwrap();

    assert!(env.manager.is_running());
    assert_eq!(started.load(Ordering::SeqCst), 1);

    let options = env.runtime.options().unwrap();
    assert_eq!(options.game_url, GAME);
    assert_eq!(options.player, "#emulator-container");
    assert_eq!(options.core, "vice_x64");

    assert_eq!(env.document.scripts_injected(), 1);
    assert_eq!(env.document.stylesheets_injected(), 1);
    assert!(env.document.element(CONTAINER).unwrap().visible);
}

#[tokio::test]
async fn test_second_start_replaces_first_session() {
    let env = EmulatorTestEnv::new();

    env.manager.initialize_emulator(GAME).await.unwrap();
    env.manager
        .initialize_emulator("/games/Showdown.d64")
        .await
        .unwrap();

    let instances = env.runtime.instances();
    assert_eq!(instances.len(), 2);
    assert_eq!(instances[0].stop_calls(), 1);
    assert_eq!(instances[1].stop_calls(), 0);
    assert_eq!(env.runtime.options().unwrap().game_url, "/games/Showdown.d64");

    // Stylesheet stays in place across sessions
    assert_eq!(env.document.stylesheets_injected(), 1);
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let env = EmulatorTestEnv::new();
    env.manager.initialize_emulator(GAME).await.unwrap();
    env.document
        .set_children(CONTAINER, vec!["canvas".to_string()]);

    assert!(env.manager.stop_emulator().await.is_ok());
    assert!(env.manager.stop_emulator().await.is_ok());

    assert!(!env.manager.is_running());
    assert!(!env.runtime.has_instance());
    assert!(!env.manager.is_script_loading());
    assert!(env.container_children().is_empty());
    assert_eq!(env.runtime.instances()[0].stop_calls(), 1);
}

#[tokio::test]
async fn test_failed_stop_still_releases() {
    let env = EmulatorTestEnv::new();
    env.manager.initialize_emulator(GAME).await.unwrap();
    env.runtime.instances()[0].fail_stop();

    let result = env.manager.stop_emulator().await;

    assert!(matches!(result, Err(EmulatorError::StopFailed(_))));
    assert!(!env.manager.is_running());
    assert!(!env.runtime.has_instance());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_script_loads_share_one_tag() {
    let env = EmulatorTestEnv::build(BootMode::Never, |doc| {
        doc.with_script_delay(Duration::from_millis(500))
    });

    let (a, b, c) = tokio::join!(
        env.manager.load_emulator_script(),
        env.manager.load_emulator_script(),
        env.manager.load_emulator_script(),
    );

    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(env.document.scripts_injected(), 1);
    assert!(!env.manager.is_script_loading());
}

#[tokio::test(start_paused = true)]
async fn test_script_loading_only_while_pending() {
    let env = EmulatorTestEnv::build(BootMode::Never, |doc| {
        doc.with_script_delay(Duration::from_millis(500))
    });
    assert!(!env.manager.is_script_loading());

    let (result, midway) = tokio::join!(env.manager.load_emulator_script(), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        env.manager.is_script_loading()
    });

    assert!(result.is_ok());
    assert!(midway);
    assert!(!env.manager.is_script_loading());

    // A settled load is reused without another tag
    env.manager.load_emulator_script().await.unwrap();
    assert_eq!(env.document.scripts_injected(), 1);
    assert!(!env.manager.is_script_loading());
}

#[tokio::test]
async fn test_script_failure_allows_retry() {
    let env = EmulatorTestEnv::build(BootMode::Immediate, |doc| doc.failing_scripts());

    let result = env.manager.initialize_emulator(GAME).await;
    assert!(matches!(result, Err(EmulatorError::ScriptLoad(_))));
    assert!(!env.manager.is_running());
    assert!(!env.manager.is_script_loading());

    env.document.set_script_outcome(ScriptOutcome::Load);
    env.manager.initialize_emulator(GAME).await.unwrap();

    assert!(env.manager.is_running());
    assert_eq!(env.document.scripts_injected(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_readiness_timeout_cleans_up() {
    let env = EmulatorTestEnv::build(BootMode::Never, |doc| doc);

    let result = env.manager.initialize_emulator(GAME).await;

    assert_eq!(
        result,
        Err(EmulatorError::ReadyTimeout(Duration::from_millis(50_000)))
    );
    assert!(!env.manager.is_running());
    assert!(!env.manager.is_script_loading());
    assert!(env.container_children().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_readiness_polls_until_instance_appears() {
    let env = EmulatorTestEnv::build(BootMode::After(Duration::from_secs(3)), |doc| doc);

    env.manager.initialize_emulator(GAME).await.unwrap();

    assert!(env.manager.is_running());
    assert_eq!(env.runtime.instances().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_waits_for_document_load() {
    let env = EmulatorTestEnv::build(BootMode::Immediate, |doc| doc.not_loaded());
    let document = env.document.clone();

    let (result, ()) = tokio::join!(env.manager.initialize_emulator(GAME), async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        document.fire_load();
    });

    assert!(result.is_ok());
    assert!(env.manager.is_running());
}

#[tokio::test]
async fn test_missing_container_fails_before_callback() {
    let runtime = Arc::new(MockRuntime::new());
    let document = Arc::new(MockDocument::new().with_runtime(runtime.clone()));
    let manager = EmulatorManager::new(EmulatorConfig::default(), document.clone(), runtime);
    let started = Arc::new(AtomicUsize::new(0));
    let counter = started.clone();

    let result = manager
        .initialize_emulator_with(GAME, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .await;

    assert_eq!(
        result,
        Err(EmulatorError::ContainerNotFound(CONTAINER.to_string()))
    );
    assert_eq!(started.load(Ordering::SeqCst), 0);
    assert_eq!(document.scripts_injected(), 0);
}

#[tokio::test]
async fn test_cleanup_requests_gc() {
    let env = EmulatorTestEnv::new();
    env.document
        .set_children(CONTAINER, vec!["canvas".to_string()]);

    env.manager.cleanup_container();

    assert!(env.container_children().is_empty());
    assert_eq!(env.document.gc_requests(), 1);
}
