use crate::runtime::ReactiveRuntime;
use std::sync::{Arc, Weak};

/// A side effect that runs when its dependencies change.
///
/// Effects track the signals they read on their first run and re-run
/// whenever one of those signals is written. Dropping the effect
/// unsubscribes it.
///
/// # Examples
///
/// ```
/// use companion_store::{Effect, Signal};
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
///
/// let count = Signal::new(0);
/// let counter = Arc::new(AtomicUsize::new(0));
/// let counter_clone = counter.clone();
///
/// let _effect = Effect::new({
///     let count = count.clone();
///     move || {
///         let _ = count.get();
///         counter_clone.fetch_add(1, Ordering::SeqCst);
///     }
/// });
///
/// // Effect runs immediately
/// assert_eq!(counter.load(Ordering::SeqCst), 1);
///
/// count.set(1);
/// assert_eq!(counter.load(Ordering::SeqCst), 2);
/// ```
#[must_use = "dropping the effect unsubscribes it"]
pub struct Effect {
    id: usize,
    runtime: Weak<ReactiveRuntime>,
}

impl Effect {
    /// Create a new effect in the current runtime.
    pub fn new<F>(effect: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let runtime = ReactiveRuntime::current();
        let id = runtime.next_id();
        let effect = Arc::new(effect);
        let effect_clone = Arc::clone(&effect);

        runtime.create_observer(id, move || {
            effect_clone();
        });

        // First run establishes the dependencies
        runtime.with_observer(id, || {
            effect();
        });

        Self {
            id,
            runtime: Arc::downgrade(&runtime),
        }
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.remove_observer(self.id);
        }
    }
}

/// Create a new effect that runs when dependencies change.
pub fn create_effect<F>(effect: F) -> Effect
where
    F: Fn() + Send + Sync + 'static,
{
    Effect::new(effect)
}
