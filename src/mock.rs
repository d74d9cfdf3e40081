//! In-memory collaborators for tests and demos.
//!
//! [`MockBackend`] keeps its own proxy flag and configuration and answers
//! the way the real backend does: toggles report the resulting status, and
//! a failed toggle reports `code == 0` together with the unchanged status.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;

use crate::api::{ApiResponse, Backend, ProxyValue};
use crate::error::{Result, StoreError};
use crate::layout::{ResizeListener, Viewport};
use crate::model::{AppInfoPatch, AppInfoPayload, Config, ConfigPatch};
use crate::notify::Notifier;

/// Scripted backend
#[derive(Default)]
pub struct MockBackend {
    app_info: AppInfoPatch,
    config: ConfigPatch,
    delay: Duration,
    proxy_failure: Option<String>,
    failing: HashSet<&'static str>,
    is_proxy: Mutex<bool>,
    calls: Mutex<Vec<&'static str>>,
    pushed: Mutex<Vec<Config>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_app_info(mut self, info: AppInfoPatch) -> Self {
        self.app_info = info;
        self
    }

    pub fn with_config(mut self, config: ConfigPatch) -> Self {
        self.config = config;
        self
    }

    /// Status reported by app info and by the status endpoint.
    pub fn with_proxy_status(self, enabled: bool) -> Self {
        *self.is_proxy.lock().unwrap() = enabled;
        self
    }

    /// Make proxy toggles fail with `message`, leaving the status unchanged.
    pub fn with_proxy_failure(mut self, message: &str) -> Self {
        self.proxy_failure = Some(message.to_string());
        self
    }

    /// Make `method` fail at the transport level.
    pub fn failing(mut self, method: &'static str) -> Self {
        self.failing.insert(method);
        self
    }

    /// Latency applied to every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Change the status behind the store's back.
    pub fn set_proxy_status(&self, enabled: bool) {
        *self.is_proxy.lock().unwrap() = enabled;
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn pushed_configs(&self) -> Vec<Config> {
        self.pushed.lock().unwrap().clone()
    }

    async fn enter(&self, method: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(method);
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        if self.failing.contains(method) {
            return Err(StoreError::transport(format!("{method}: connection refused")));
        }
        Ok(())
    }

    fn toggle(&self, enable: bool) -> ApiResponse<ProxyValue> {
        let mut status = self.is_proxy.lock().unwrap();
        match &self.proxy_failure {
            Some(message) => ApiResponse::failure(message.clone(), ProxyValue::from(*status)),
            None => {
                *status = enable;
                ApiResponse::success(ProxyValue::from(enable))
            }
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn app_info(&self) -> Result<ApiResponse<AppInfoPayload>> {
        self.enter("app_info").await?;
        Ok(ApiResponse::success(AppInfoPayload {
            info: self.app_info.clone(),
            is_proxy: *self.is_proxy.lock().unwrap(),
        }))
    }

    async fn get_config(&self) -> Result<ApiResponse<ConfigPatch>> {
        self.enter("get_config").await?;
        Ok(ApiResponse::success(self.config.clone()))
    }

    async fn set_config(&self, config: &Config) -> Result<ApiResponse<serde_json::Value>> {
        self.enter("set_config").await?;
        self.pushed.lock().unwrap().push(config.clone());
        Ok(ApiResponse::success(serde_json::Value::Null))
    }

    async fn is_proxy(&self) -> Result<ApiResponse<ProxyValue>> {
        self.enter("is_proxy").await?;
        Ok(ApiResponse::success(ProxyValue::from(*self.is_proxy.lock().unwrap())))
    }

    async fn open_system_proxy(&self) -> Result<ApiResponse<ProxyValue>> {
        self.enter("open_system_proxy").await?;
        Ok(self.toggle(true))
    }

    async fn unset_system_proxy(&self) -> Result<ApiResponse<ProxyValue>> {
        self.enter("unset_system_proxy").await?;
        Ok(self.toggle(false))
    }
}

/// Viewport with settable element heights and a manual resize trigger.
#[derive(Default)]
pub struct MockViewport {
    heights: Mutex<HashMap<String, u32>>,
    listeners: Mutex<Vec<ResizeListener>>,
}

impl MockViewport {
    pub fn set_height(&self, element_id: &str, height: u32) {
        self.heights.lock().unwrap().insert(element_id.to_string(), height);
    }

    pub fn remove_element(&self, element_id: &str) {
        self.heights.lock().unwrap().remove(element_id);
    }

    /// Fire a resize event.
    pub fn resize(&self) {
        for listener in self.listeners.lock().unwrap().iter() {
            listener();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }
}

impl Viewport for MockViewport {
    fn element_height(&self, element_id: &str) -> Option<u32> {
        self.heights.lock().unwrap().get(element_id).copied()
    }

    fn on_resize(&self, listener: ResizeListener) {
        self.listeners.lock().unwrap().push(listener);
    }
}

/// Notifier that keeps every message.
#[derive(Default)]
pub struct RecordingNotifier {
    errors: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}
