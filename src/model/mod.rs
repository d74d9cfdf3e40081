//! Payload models shared with the backend.
//!
//! Field names on the wire are PascalCase (`AppName`, `TaskNumber`, ...),
//! matching what the backend serves and accepts.

mod app_info;
mod config;

pub use app_info::{AppInfo, AppInfoPatch, AppInfoPayload};
pub use config::{Config, ConfigPatch};
