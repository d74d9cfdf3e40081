//! Integration tests for the companion store

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use companion_store::api::ProxyValue;
use companion_store::mock::{MockBackend, MockViewport, RecordingNotifier};
use companion_store::model::{AppInfoPatch, Config, ConfigPatch};
use companion_store::runtime::ReactiveRuntime;
use companion_store::{create_effect, AppStateStore, StoreError, StoreOptions};
use serde_json::json;

struct Harness {
    store: AppStateStore,
    runtime: Arc<ReactiveRuntime>,
    backend: Arc<MockBackend>,
    notifier: Arc<RecordingNotifier>,
    viewport: Arc<MockViewport>,
}

/// Build a store whose signals live in a runtime private to the test.
fn isolated<R>(runtime: &Arc<ReactiveRuntime>, f: impl FnOnce() -> R) -> R {
    ReactiveRuntime::with_runtime(Arc::clone(runtime), f)
}

fn harness(backend: MockBackend) -> Harness {
    let runtime = ReactiveRuntime::new();
    let backend = Arc::new(backend);
    let notifier = Arc::new(RecordingNotifier::default());
    let viewport = Arc::new(MockViewport::default());
    let store = isolated(&runtime, || {
        AppStateStore::new(backend.clone(), notifier.clone(), viewport.clone())
    });
    Harness {
        store,
        runtime,
        backend,
        notifier,
        viewport,
    }
}

fn without_recheck(backend: Arc<MockBackend>, viewport: Arc<MockViewport>) -> AppStateStore {
    isolated(&ReactiveRuntime::new(), || {
        AppStateStore::with_options(
            backend,
            Arc::new(RecordingNotifier::default()),
            viewport,
            StoreOptions {
                proxy_recheck_delay_ms: None,
                ..Default::default()
            },
        )
    })
}

#[tokio::test(start_paused = true)]
async fn init_merges_backend_values_over_defaults() {
    let h = harness(
        MockBackend::new()
            .with_app_info(AppInfoPatch {
                app_name: Some("res-downloader".into()),
                version: Some("3.0.5".into()),
                ..Default::default()
            })
            .with_config(ConfigPatch {
                theme: Some("darkTheme".into()),
                ..Default::default()
            })
            .with_proxy_status(true),
    );

    let handle = h.store.init().await.unwrap();

    let info = h.store.app_info().get();
    assert_eq!(info.app_name, "res-downloader");
    assert_eq!(info.version, "3.0.5");
    assert_eq!(info.platform, "");

    let config = h.store.config().get();
    assert_eq!(config.theme, "darkTheme");
    assert_eq!(config.task_number, 8);
    assert_eq!(config.quality, 0);
    assert!(h.store.is_proxy().get());

    assert!(handle.proxy_recheck().await.unwrap().unwrap());
    assert_eq!(h.backend.calls(), vec!["app_info", "get_config", "is_proxy"]);
}

#[tokio::test(start_paused = true)]
async fn init_measures_table_and_tracks_resizes() {
    let h = harness(MockBackend::new());
    h.viewport.set_height("content", 700);

    h.store.init().await.unwrap();
    assert_eq!(h.store.table_height().get(), 700);
    assert_eq!(h.viewport.listener_count(), 1);

    h.viewport.set_height("content", 1020);
    h.viewport.resize();
    assert_eq!(h.store.table_height().get(), 1020);

    h.viewport.remove_element("content");
    h.viewport.resize();
    assert_eq!(h.store.table_height().get(), 895);
}

#[tokio::test(start_paused = true)]
async fn resize_after_store_dropped_is_ignored() {
    let viewport = Arc::new(MockViewport::default());
    let store = without_recheck(Arc::new(MockBackend::new()), viewport.clone());
    let height = store.table_height();

    store.init().await.unwrap();
    drop(store);

    viewport.set_height("content", 10);
    viewport.resize();
    assert_eq!(height.get(), 895);
}

#[tokio::test(start_paused = true)]
async fn delayed_recheck_overwrites_status() {
    let h = harness(MockBackend::new().with_proxy_status(true));

    let handle = h.store.init().await.unwrap();
    assert!(h.store.is_proxy().get());

    h.backend.set_proxy_status(false);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(h.store.is_proxy().get());

    assert!(!handle.proxy_recheck().await.unwrap().unwrap());
    assert!(!h.store.is_proxy().get());
}

#[tokio::test(start_paused = true)]
async fn recheck_can_clobber_user_toggle_inside_window() {
    let h = harness(MockBackend::new());

    let handle = h.store.init().await.unwrap();
    let res = h.store.open_proxy().await.unwrap();
    assert!(res.data.value);
    assert!(h.store.is_proxy().get());

    // The backend flips back before the re-check lands
    h.backend.set_proxy_status(false);
    handle.proxy_recheck().await.unwrap().unwrap();
    assert!(!h.store.is_proxy().get());
}

#[tokio::test(start_paused = true)]
async fn disabled_recheck_leaves_status_alone() {
    let backend = Arc::new(MockBackend::new().with_proxy_status(true));
    let store = without_recheck(backend.clone(), Arc::new(MockViewport::default()));

    let handle = store.init().await.unwrap();
    assert!(!handle.has_proxy_recheck());
    assert!(handle.proxy_recheck().await.is_none());

    backend.set_proxy_status(false);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(store.is_proxy().get());
    assert!(!backend.calls().contains(&"is_proxy"));
}

#[tokio::test(start_paused = true)]
async fn failed_recheck_is_reported_on_handle_only() {
    let h = harness(MockBackend::new().with_proxy_status(true).failing("is_proxy"));

    let handle = h.store.init().await.unwrap();
    let outcome = handle.proxy_recheck().await.unwrap();

    assert!(matches!(outcome, Err(StoreError::Transport(_))));
    assert!(h.store.is_proxy().get());
    assert!(h.notifier.errors().is_empty());
}

#[tokio::test]
async fn init_failure_propagates_and_keeps_defaults() {
    let h = harness(MockBackend::new().failing("app_info"));

    let err = h.store.init().await.unwrap_err();

    assert!(matches!(err, StoreError::Transport(_)));
    assert_eq!(h.store.config().get(), Config::default());
    assert_eq!(h.store.table_height().get(), 800);
    assert_eq!(h.viewport.listener_count(), 0);
}

#[tokio::test]
async fn config_failure_keeps_app_info() {
    let h = harness(
        MockBackend::new()
            .with_app_info(AppInfoPatch {
                version: Some("1.2".into()),
                ..Default::default()
            })
            .failing("get_config"),
    );

    assert!(h.store.init().await.is_err());
    assert_eq!(h.store.app_info().get().version, "1.2");
    assert_eq!(h.store.config().get(), Config::default());
}

#[tokio::test]
async fn set_config_merges_and_pushes_full_config() {
    let h = harness(MockBackend::new());
    h.store
        .set_config(ConfigPatch {
            save_directory: Some("/tmp/res".into()),
            ..Default::default()
        })
        .unwrap();

    let push = h
        .store
        .set_config(ConfigPatch {
            task_number: Some(2),
            wx_action: Some(true),
            ..Default::default()
        })
        .unwrap();

    let config = h.store.config().get();
    assert_eq!(config.task_number, 2);
    assert!(config.wx_action);
    assert_eq!(config.save_directory, "/tmp/res");
    assert_eq!(config.theme, "lightTheme");

    push.await.unwrap().unwrap();
    let pushed = h.backend.pushed_configs();
    assert_eq!(pushed.last(), Some(&config));
}

#[tokio::test]
async fn set_config_push_failure_does_not_touch_state() {
    let h = harness(MockBackend::new().failing("set_config"));

    let push = h
        .store
        .set_config(ConfigPatch {
            locale: Some("en".into()),
            ..Default::default()
        })
        .unwrap();

    assert!(push.await.unwrap().is_err());
    assert_eq!(h.store.config().get().locale, "en");
    assert!(h.backend.pushed_configs().is_empty());
}

#[tokio::test]
async fn set_config_json_accepts_form_payload() {
    let h = harness(MockBackend::new());

    let push = h
        .store
        .set_config_json(json!({"Theme": "darkTheme", "MimeMap": {"video/mp4": "video"}}))
        .unwrap();
    push.await.unwrap().unwrap();

    let config = h.store.config().get();
    assert_eq!(config.theme, "darkTheme");
    assert_eq!(config.mime_map["video/mp4"], "video");

    assert!(h.store.set_config_json(json!({"Port": 8899})).is_err());
    assert_eq!(h.store.config().get().port, "8899");
    assert_eq!(h.backend.pushed_configs().len(), 1);
}

#[tokio::test]
async fn proxy_toggle_round_trip() {
    let h = harness(MockBackend::new());

    assert!(h.store.open_proxy().await.unwrap().data.value);
    assert!(h.store.is_proxy().get());

    let res = h.store.unset_proxy().await.unwrap();
    assert_eq!(res.code, 1);
    assert!(!h.store.is_proxy().get());
    assert!(h.notifier.errors().is_empty());
}

#[tokio::test]
async fn failed_toggle_notifies_and_returns_response() {
    let h = harness(MockBackend::new().with_proxy_failure("permission denied"));

    let res = h.store.open_proxy().await.unwrap();

    assert!(res.is_failure());
    assert_eq!(res.message, "permission denied");
    assert!(!h.store.is_proxy().get());
    assert_eq!(h.notifier.errors(), vec!["permission denied".to_string()]);
}

#[tokio::test]
async fn transport_failure_on_toggle_propagates_without_notification() {
    let h = harness(MockBackend::new().failing("unset_system_proxy"));
    h.store.update_proxy_status(ProxyValue::from(true));

    assert!(h.store.unset_proxy().await.is_err());
    assert!(h.store.is_proxy().get());
    assert!(h.notifier.errors().is_empty());
}

#[tokio::test]
async fn watchers_see_every_proxy_change() {
    let h = harness(MockBackend::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();

    let _guard = h
        .store
        .is_proxy()
        .watch(move |value| seen_clone.lock().unwrap().push(value));

    h.store.open_proxy().await.unwrap();
    h.store.update_proxy_status(ProxyValue::from(false));

    assert_eq!(*seen.lock().unwrap(), vec![false, true, false]);
}

#[tokio::test]
async fn effect_reruns_on_config_change() {
    let h = harness(MockBackend::new());
    let renders = Arc::new(AtomicUsize::new(0));

    let _effect = isolated(&h.runtime, || {
        create_effect({
            let config = h.store.config();
            let renders = renders.clone();
            move || {
                let _ = config.with(|c| c.theme.clone());
                renders.fetch_add(1, Ordering::SeqCst);
            }
        })
    });

    h.store
        .set_config(ConfigPatch {
            theme: Some("darkTheme".into()),
            ..Default::default()
        })
        .unwrap();
    h.store.update_proxy_status(ProxyValue::from(true));

    assert_eq!(renders.load(Ordering::SeqCst), 2);
}

#[test]
fn store_watchers_register_in_the_store_runtime() {
    let h = harness(MockBackend::new());

    let guard = h.store.table_height().watch(|_| {});
    assert_eq!(h.runtime.observer_count(), 1);
    assert_eq!(ReactiveRuntime::global().observer_count(), 0);

    h.store.update_proxy_status(ProxyValue::from(true));
    assert!(h.store.is_proxy().get());

    drop(guard);
    assert_eq!(h.runtime.observer_count(), 0);
}

#[test]
fn set_config_from_ui_thread_without_runtime_is_an_error() {
    let h = harness(MockBackend::new());

    let store = h.store.clone();
    let outcome = std::thread::spawn(move || {
        store.set_config(ConfigPatch {
            theme: Some("darkTheme".into()),
            ..Default::default()
        })
    })
    .join()
    .unwrap();

    assert!(matches!(outcome, Err(StoreError::NoRuntime)));
    assert_eq!(h.store.config().get(), Config::default());
}

#[test]
fn init_attaches_its_runtime_for_later_ui_calls() {
    let tokio_rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_time()
        .build()
        .unwrap();
    let h = harness(MockBackend::new());

    let handle = tokio_rt.block_on(h.store.init()).unwrap();
    drop(handle);

    let store = h.store.clone();
    let push = std::thread::spawn(move || {
        store.set_config(ConfigPatch {
            task_number: Some(3),
            ..Default::default()
        })
    })
    .join()
    .unwrap()
    .unwrap();

    tokio_rt.block_on(push).unwrap().unwrap();
    assert_eq!(h.backend.pushed_configs()[0].task_number, 3);
}
