use crate::runtime::ReactiveRuntime;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, Weak};

/// A reactive signal that holds a value and notifies subscribers when changed.
#[derive(Clone)]
pub struct Signal<T> {
    value: Arc<RwLock<T>>,
    id: usize,
    runtime: Arc<ReactiveRuntime>,
    _dependencies: Arc<Mutex<Vec<WatchGuard>>>,
}

impl<T: Clone + Send + Sync + 'static> Signal<T> {
    /// Create a new signal in the current runtime.
    pub fn new(initial: T) -> Self {
        let runtime = ReactiveRuntime::current();
        let id = runtime.next_id();

        Self {
            value: Arc::new(RwLock::new(initial)),
            id,
            runtime,
            _dependencies: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, T> {
        self.value.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the current value of the signal.
    pub fn get(&self) -> T {
        self.runtime.track_read(self.id);
        self.read().clone()
    }

    /// Set a new value for the signal.
    pub fn set(&self, new_value: T) {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = new_value;
        self.runtime.notify_observers(self.id);
    }

    /// Update the value in place, returning whatever `f` returns.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = {
            let mut value = self.value.write().unwrap_or_else(PoisonError::into_inner);
            f(&mut *value)
        };
        self.runtime.notify_observers(self.id);
        result
    }

    /// Read the value with a function without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.runtime.track_read(self.id);
        f(&*self.read())
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Watch this signal for changes.
    ///
    /// The callback runs once right away with the current value, then after
    /// every write. Dropping the returned guard unsubscribes.
    pub fn watch<F>(&self, callback: F) -> WatchGuard
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let observer_id = self.runtime.next_id();
        let value = Arc::clone(&self.value);
        let callback = Arc::new(callback);
        let callback_clone = Arc::clone(&callback);

        self.runtime.create_observer(observer_id, move || {
            let val = value.read().unwrap_or_else(PoisonError::into_inner).clone();
            callback_clone(val);
        });

        self.runtime.with_observer(observer_id, || {
            self.runtime.track_read(self.id);
        });

        callback(self.read().clone());

        WatchGuard {
            observer_id,
            runtime: Arc::downgrade(&self.runtime),
        }
    }

    /// Create a derived signal by applying a function to this signal's value.
    ///
    /// The derived signal unsubscribes from this one once its last clone is
    /// dropped.
    pub fn map<U, F>(&self, f: F) -> Signal<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        let derived = Signal {
            value: Arc::new(RwLock::new(self.with(&f))),
            id: self.runtime.next_id(),
            runtime: Arc::clone(&self.runtime),
            _dependencies: Arc::new(Mutex::new(Vec::new())),
        };

        // Observer holds only weak references to the derived value and runtime
        let target = Arc::downgrade(&derived.value);
        let runtime = Arc::downgrade(&self.runtime);
        let derived_id = derived.id;
        let guard = self.watch(move |value| {
            let (Some(target), Some(runtime)) = (target.upgrade(), runtime.upgrade()) else {
                return;
            };
            *target.write().unwrap_or_else(PoisonError::into_inner) = f(&value);
            runtime.notify_observers(derived_id);
        });

        derived
            ._dependencies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(guard);
        derived
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = self.value.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Signal")
            .field("id", &self.id)
            .field("value", &*value)
            .finish()
    }
}

/// RAII guard for signal watchers.
#[must_use = "dropping the guard unsubscribes the watcher"]
pub struct WatchGuard {
    observer_id: usize,
    runtime: Weak<ReactiveRuntime>,
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.remove_observer(self.observer_id);
        }
    }
}
