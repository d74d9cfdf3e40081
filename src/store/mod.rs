//! Application state store.
//!
//! [`AppStateStore`] owns the reactive fields the UI renders from and keeps
//! them in sync with the backend.

mod app_state;
mod options;

pub use app_state::{AppStateStore, InitHandle};
pub use options::StoreOptions;
