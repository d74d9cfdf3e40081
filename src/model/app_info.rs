use serde::{Deserialize, Serialize};

/// Application metadata shown in the about panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppInfo {
    pub app_name: String,
    pub version: String,
    pub description: String,
    pub copyright: String,
    pub platform: String,
}

/// Partial [`AppInfo`]; absent fields keep their previous value on merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AppInfoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

/// Body of the backend's app-info response: the metadata plus the live
/// system-proxy flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfoPayload {
    #[serde(flatten)]
    pub info: AppInfoPatch,
    /// Missing reads as `false`.
    #[serde(rename = "IsProxy", default)]
    pub is_proxy: bool,
}

impl AppInfo {
    pub fn merge(&mut self, patch: AppInfoPatch) {
        if let Some(app_name) = patch.app_name {
            self.app_name = app_name;
        }
        if let Some(version) = patch.version {
            self.version = version;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(copyright) = patch.copyright {
            self.copyright = copyright;
        }
        if let Some(platform) = patch.platform {
            self.platform = platform;
        }
    }
}
