use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables of [`AppStateStore`](super::AppStateStore).
///
/// Deserializes from a partial document; missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Element whose height drives the table height.
    pub content_element_id: String,
    /// Table height used when the element cannot be measured.
    pub fallback_table_height: u32,
    /// Table height before the first measurement.
    pub initial_table_height: u32,
    /// Delay before init re-checks the proxy status. `None` skips the re-check.
    pub proxy_recheck_delay_ms: Option<u64>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            content_element_id: "content".to_string(),
            fallback_table_height: 895,
            initial_table_height: 800,
            proxy_recheck_delay_ms: Some(150),
        }
    }
}

impl StoreOptions {
    pub fn from_json(raw: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn proxy_recheck_delay(&self) -> Option<Duration> {
        self.proxy_recheck_delay_ms.map(Duration::from_millis)
    }
}
