//! Contract of the backend the store talks to.
//!
//! Every call answers with an [`ApiResponse`] envelope. Transport problems
//! come back as `Err`; application failures come back as `Ok` with
//! [`ApiResponse::code`] set to [`FAILURE_CODE`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{AppInfoPayload, Config, ConfigPatch};

/// Envelope code the backend uses for a failed action.
pub const FAILURE_CODE: i64 = 0;
/// Envelope code the backend uses for a successful action.
pub const SUCCESS_CODE: i64 = 1;

/// `{code, message, data}` envelope wrapping every backend answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: SUCCESS_CODE,
            message: "ok".to_string(),
            data,
        }
    }

    pub fn failure(message: impl Into<String>, data: T) -> Self {
        Self {
            code: FAILURE_CODE,
            message: message.into(),
            data,
        }
    }

    /// `code == 0` is failure; any other code is not.
    pub fn is_failure(&self) -> bool {
        self.code == FAILURE_CODE
    }
}

/// Payload of the proxy status and proxy toggle endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyValue {
    pub value: bool,
}

impl From<bool> for ProxyValue {
    fn from(value: bool) -> Self {
        Self { value }
    }
}

/// Backend the store synchronizes with.
///
/// Implementations own transport and authentication.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn app_info(&self) -> Result<ApiResponse<AppInfoPayload>>;

    async fn get_config(&self) -> Result<ApiResponse<ConfigPatch>>;

    /// Persist the full configuration. The store never reads the answer.
    async fn set_config(&self, config: &Config) -> Result<ApiResponse<serde_json::Value>>;

    async fn is_proxy(&self) -> Result<ApiResponse<ProxyValue>>;

    async fn open_system_proxy(&self) -> Result<ApiResponse<ProxyValue>>;

    async fn unset_system_proxy(&self) -> Result<ApiResponse<ProxyValue>>;
}
