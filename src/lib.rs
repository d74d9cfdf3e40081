//! # Companion Store
//!
//! Reactive application state for the desktop companion UI.
//!
//! The crate has two layers:
//!
//! ## Signals (Low-level primitives)
//!
//! Fine-grained reactive primitives the UI subscribes to:
//! - `Signal<T>` - Reactive values that notify watchers when changed
//! - `Effect` - Side effects that run when dependencies change
//!
//! ## Store (Application state)
//!
//! [`AppStateStore`] holds the app metadata, the user configuration, the
//! system-proxy flag and the resource table height, and keeps them in sync
//! with the backend through the [`Backend`](api::Backend) trait.
//!
//! ```
//! use std::sync::Arc;
//! use companion_store::mock::{MockBackend, MockViewport, RecordingNotifier};
//! use companion_store::model::ConfigPatch;
//! use companion_store::AppStateStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> companion_store::Result<()> {
//! let store = AppStateStore::new(
//!     Arc::new(MockBackend::new()),
//!     Arc::new(RecordingNotifier::default()),
//!     Arc::new(MockViewport::default()),
//! );
//! store.init().await?;
//!
//! store.set_config(ConfigPatch {
//!     theme: Some("darkTheme".to_string()),
//!     ..Default::default()
//! })?;
//! assert_eq!(store.config().get().theme, "darkTheme");
//! assert_eq!(store.config().get().task_number, 8);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod error;
pub mod layout;
pub mod mock;
pub mod model;
pub mod notify;
pub mod runtime;
pub mod signal;
pub mod store;

// Re-export main types for convenience
pub use error::{Result, StoreError};
pub use signal::{create_effect, Effect, Signal, WatchGuard};
pub use store::{AppStateStore, InitHandle, StoreOptions};
