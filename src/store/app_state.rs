use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::StoreOptions;
use crate::api::{ApiResponse, Backend, ProxyValue};
use crate::error::{Result, StoreError};
use crate::layout::Viewport;
use crate::model::{AppInfo, Config, ConfigPatch};
use crate::notify::Notifier;
use crate::signal::Signal;

/// Reactive application state synchronized with the backend.
///
/// Cloning is cheap and every clone shares the same fields. The UI reads
/// and watches the fields through the accessor signals.
#[derive(Clone)]
pub struct AppStateStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    app_info: Signal<AppInfo>,
    config: Signal<Config>,
    is_proxy: Signal<bool>,
    table_height: Signal<u32>,
    backend: Arc<dyn Backend>,
    notifier: Arc<dyn Notifier>,
    viewport: Arc<dyn Viewport>,
    options: StoreOptions,
    // Runtime background pushes and re-checks are spawned on
    spawner: OnceLock<Handle>,
}

impl StoreInner {
    fn spawner(&self) -> Result<&Handle> {
        self.spawner.get().ok_or(StoreError::NoRuntime)
    }

    fn handle_resize(&self) {
        let height = self
            .viewport
            .element_height(&self.options.content_element_id)
            .unwrap_or(self.options.fallback_table_height);
        self.table_height.set(height);
    }
}

/// Outcome of the background work started by [`AppStateStore::init`].
///
/// Dropping the handle leaves the work running.
#[derive(Debug)]
pub struct InitHandle {
    recheck: Option<JoinHandle<Result<bool>>>,
}

impl InitHandle {
    pub fn has_proxy_recheck(&self) -> bool {
        self.recheck.is_some()
    }

    /// Wait for the delayed proxy re-check and return the status it applied.
    ///
    /// `None` when the re-check is disabled.
    pub async fn proxy_recheck(self) -> Option<Result<bool>> {
        let handle = self.recheck?;
        Some(handle.await.map_err(StoreError::from).and_then(|applied| applied))
    }
}

impl AppStateStore {
    pub fn new(
        backend: Arc<dyn Backend>,
        notifier: Arc<dyn Notifier>,
        viewport: Arc<dyn Viewport>,
    ) -> Self {
        Self::with_options(backend, notifier, viewport, StoreOptions::default())
    }

    /// Build a store with custom options.
    ///
    /// When called inside a tokio runtime, that runtime runs the store's
    /// background work. Otherwise the runtime is taken from the first
    /// [`init`](Self::init) or set with [`attach_runtime`](Self::attach_runtime).
    pub fn with_options(
        backend: Arc<dyn Backend>,
        notifier: Arc<dyn Notifier>,
        viewport: Arc<dyn Viewport>,
        options: StoreOptions,
    ) -> Self {
        let inner = StoreInner {
            app_info: Signal::new(AppInfo::default()),
            config: Signal::new(Config::default()),
            is_proxy: Signal::new(false),
            table_height: Signal::new(options.initial_table_height),
            backend,
            notifier,
            viewport,
            options,
            spawner: OnceLock::new(),
        };
        let store = Self {
            inner: Arc::new(inner),
        };
        store.attach_current_runtime();
        store
    }

    /// Run background work on `handle`. The first runtime attached wins.
    pub fn attach_runtime(&self, handle: Handle) {
        let _ = self.inner.spawner.set(handle);
    }

    fn attach_current_runtime(&self) {
        if self.inner.spawner.get().is_none() {
            if let Ok(handle) = Handle::try_current() {
                self.attach_runtime(handle);
            }
        }
    }

    pub fn app_info(&self) -> Signal<AppInfo> {
        self.inner.app_info.clone()
    }

    pub fn config(&self) -> Signal<Config> {
        self.inner.config.clone()
    }

    pub fn is_proxy(&self) -> Signal<bool> {
        self.inner.is_proxy.clone()
    }

    pub fn table_height(&self) -> Signal<u32> {
        self.inner.table_height.clone()
    }

    /// Load app info and config, start tracking the window size, and
    /// schedule the delayed proxy re-check.
    ///
    /// Backend failures while loading are returned as-is; fields already
    /// merged keep their new values. The re-check runs after this returns
    /// and may overwrite a proxy status set in the meantime. It runs on the
    /// attached runtime, or the one polling `init`; with neither, `init`
    /// fails with [`StoreError::NoRuntime`] after loading.
    pub async fn init(&self) -> Result<InitHandle> {
        self.attach_current_runtime();

        let info = self.inner.backend.app_info().await?.data;
        self.inner.app_info.update(|app| app.merge(info.info));
        self.inner.is_proxy.set(info.is_proxy);

        let patch = self.inner.backend.get_config().await?.data;
        self.inner.config.update(|config| config.merge(patch));
        debug!(is_proxy = info.is_proxy, "app state loaded");

        let weak = Arc::downgrade(&self.inner);
        self.inner.viewport.on_resize(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.handle_resize();
            }
        }));
        self.handle_resize();

        let recheck = match self.inner.options.proxy_recheck_delay() {
            Some(delay) => Some(self.spawn_proxy_recheck(delay)?),
            None => None,
        };

        Ok(InitHandle { recheck })
    }

    fn spawn_proxy_recheck(&self, delay: Duration) -> Result<JoinHandle<Result<bool>>> {
        let inner = Arc::clone(&self.inner);
        let spawner = self.inner.spawner()?;
        Ok(spawner.spawn(async move {
            tokio::time::sleep(delay).await;
            match inner.backend.is_proxy().await {
                Ok(res) => {
                    inner.is_proxy.set(res.data.value);
                    Ok(res.data.value)
                }
                Err(err) => {
                    warn!(error = %err, "proxy status re-check failed");
                    Err(err)
                }
            }
        }))
    }

    /// Merge `patch` into the config, then push the merged config to the
    /// backend in the background.
    ///
    /// The returned handle may be dropped; the push outcome never touches
    /// local state. Safe to call from any thread; fails with
    /// [`StoreError::NoRuntime`], merging nothing, when no runtime is attached.
    pub fn set_config(&self, patch: ConfigPatch) -> Result<JoinHandle<Result<()>>> {
        let spawner = self.inner.spawner()?;
        let snapshot = self.inner.config.update(|config| {
            config.merge(patch);
            config.clone()
        });

        let backend = Arc::clone(&self.inner.backend);
        Ok(spawner.spawn(async move {
            debug!("pushing config");
            match backend.set_config(&snapshot).await {
                Ok(_) => Ok(()),
                Err(err) => {
                    warn!(error = %err, "config push failed");
                    Err(err)
                }
            }
        }))
    }

    /// [`set_config`](Self::set_config) for an untyped form payload.
    ///
    /// Nothing is merged when the payload does not decode.
    pub fn set_config_json(&self, form: serde_json::Value) -> Result<JoinHandle<Result<()>>> {
        let patch = ConfigPatch::from_json(form)?;
        self.set_config(patch)
    }

    pub async fn open_proxy(&self) -> Result<ApiResponse<ProxyValue>> {
        let res = self.inner.backend.open_system_proxy().await?;
        Ok(self.handle_proxy(res))
    }

    pub async fn unset_proxy(&self) -> Result<ApiResponse<ProxyValue>> {
        let res = self.inner.backend.unset_system_proxy().await?;
        Ok(self.handle_proxy(res))
    }

    /// Apply a status pushed from elsewhere in the UI. No notification.
    pub fn update_proxy_status(&self, status: ProxyValue) {
        self.inner.is_proxy.set(status.value);
    }

    // The status is applied even when the action failed.
    fn handle_proxy(&self, res: ApiResponse<ProxyValue>) -> ApiResponse<ProxyValue> {
        self.inner.is_proxy.set(res.data.value);
        if res.is_failure() {
            self.inner.notifier.error(&res.message);
        }
        res
    }

    pub(crate) fn handle_resize(&self) {
        self.inner.handle_resize();
    }
}
