//! User-visible notifications.

/// Toast/notification surface of the UI.
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

/// Notifier that only writes a log event. Used when no UI surface is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn error(&self, message: &str) {
        tracing::error!(target: "companion_store::notify", "{message}");
    }
}
