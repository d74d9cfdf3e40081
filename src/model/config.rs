use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// User configuration mirrored from the backend.
///
/// Every field is always populated; merges only ever override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
    pub theme: String,
    pub locale: String,
    pub host: String,
    pub port: String,
    pub quality: i64,
    pub save_directory: String,
    pub upstream_proxy: String,
    pub filename_len: i64,
    pub filename_time: bool,
    pub open_proxy: bool,
    pub download_proxy: bool,
    pub auto_proxy: bool,
    pub wx_action: bool,
    pub task_number: i64,
    pub user_agent: String,
    pub use_headers: String,
    pub mime_map: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "lightTheme".to_string(),
            locale: "zh".to_string(),
            host: "0.0.0.0".to_string(),
            port: "8899".to_string(),
            quality: 0,
            save_directory: String::new(),
            upstream_proxy: String::new(),
            filename_len: 0,
            filename_time: false,
            open_proxy: false,
            download_proxy: false,
            auto_proxy: false,
            wx_action: false,
            task_number: 8,
            user_agent: String::new(),
            use_headers: String::new(),
            mime_map: BTreeMap::new(),
        }
    }
}

/// Partial [`Config`], as returned by the backend or submitted by a form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_proxy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename_len: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename_time: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_proxy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_proxy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_proxy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wx_action: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_headers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_map: Option<BTreeMap<String, String>>,
}

impl ConfigPatch {
    /// Parse an untyped form payload. Unknown keys are ignored.
    pub fn from_json(value: serde_json::Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

impl From<Config> for ConfigPatch {
    fn from(config: Config) -> Self {
        Self {
            theme: Some(config.theme),
            locale: Some(config.locale),
            host: Some(config.host),
            port: Some(config.port),
            quality: Some(config.quality),
            save_directory: Some(config.save_directory),
            upstream_proxy: Some(config.upstream_proxy),
            filename_len: Some(config.filename_len),
            filename_time: Some(config.filename_time),
            open_proxy: Some(config.open_proxy),
            download_proxy: Some(config.download_proxy),
            auto_proxy: Some(config.auto_proxy),
            wx_action: Some(config.wx_action),
            task_number: Some(config.task_number),
            user_agent: Some(config.user_agent),
            use_headers: Some(config.use_headers),
            mime_map: Some(config.mime_map),
        }
    }
}

impl Config {
    /// Shallow merge: each field present in `patch` replaces ours.
    /// `MimeMap` is replaced whole, never merged key by key.
    pub fn merge(&mut self, patch: ConfigPatch) {
        let ConfigPatch {
            theme,
            locale,
            host,
            port,
            quality,
            save_directory,
            upstream_proxy,
            filename_len,
            filename_time,
            open_proxy,
            download_proxy,
            auto_proxy,
            wx_action,
            task_number,
            user_agent,
            use_headers,
            mime_map,
        } = patch;

        override_with(&mut self.theme, theme);
        override_with(&mut self.locale, locale);
        override_with(&mut self.host, host);
        override_with(&mut self.port, port);
        override_with(&mut self.quality, quality);
        override_with(&mut self.save_directory, save_directory);
        override_with(&mut self.upstream_proxy, upstream_proxy);
        override_with(&mut self.filename_len, filename_len);
        override_with(&mut self.filename_time, filename_time);
        override_with(&mut self.open_proxy, open_proxy);
        override_with(&mut self.download_proxy, download_proxy);
        override_with(&mut self.auto_proxy, auto_proxy);
        override_with(&mut self.wx_action, wx_action);
        override_with(&mut self.task_number, task_number);
        override_with(&mut self.user_agent, user_agent);
        override_with(&mut self.use_headers, use_headers);
        override_with(&mut self.mime_map, mime_map);
    }

    pub fn merged(mut self, patch: ConfigPatch) -> Self {
        self.merge(patch);
        self
    }
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}
