use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

type Observer = Arc<dyn Fn() + Send + Sync>;

/// Dependency graph shared by every primitive created in a runtime.
struct ReactiveContext {
    // Map from signal ID to set of observer IDs that depend on it
    dependencies: HashMap<usize, HashSet<usize>>,
    // Map from observer ID to set of signal IDs it depends on
    observer_deps: HashMap<usize, HashSet<usize>>,
    observers: HashMap<usize, Observer>,
}

impl ReactiveContext {
    fn new() -> Self {
        Self {
            dependencies: HashMap::new(),
            observer_deps: HashMap::new(),
            observers: HashMap::new(),
        }
    }

    fn unlink(&mut self, observer_id: usize) {
        if let Some(old_deps) = self.observer_deps.remove(&observer_id) {
            for signal_id in old_deps {
                if let Some(deps) = self.dependencies.get_mut(&signal_id) {
                    deps.remove(&observer_id);
                    if deps.is_empty() {
                        self.dependencies.remove(&signal_id);
                    }
                }
            }
        }
    }

    fn clear(&mut self) {
        self.dependencies.clear();
        self.observer_deps.clear();
        self.observers.clear();
    }
}

/// Reactive runtime that links signals to the observers reading them.
///
/// Supports both a global runtime (default) and scoped runtimes for isolation.
/// Signals remember the runtime they were created in, so a write issued from
/// a background task on another thread still reaches the right observers.
///
/// # Examples
///
/// Using the default global runtime:
///
/// ```
/// use companion_store::Signal;
///
/// let signal = Signal::new(42);
/// assert_eq!(signal.get(), 42);
/// ```
///
/// Using scoped runtimes for isolation:
///
/// ```
/// use companion_store::runtime::ReactiveRuntime;
/// use companion_store::Signal;
///
/// ReactiveRuntime::scope(|| {
///     let signal = Signal::new(0);
///     assert_eq!(signal.get(), 0);
/// });
/// ```
pub struct ReactiveRuntime {
    runtime_id: usize,
    next_id: AtomicUsize,
    context: Mutex<ReactiveContext>,
}

static NEXT_RUNTIME_ID: AtomicUsize = AtomicUsize::new(0);

// Thread-local stack for scoped runtimes
thread_local! {
    static RUNTIME_STACK: RefCell<Vec<Arc<ReactiveRuntime>>> = const { RefCell::new(Vec::new()) };
}

// Observers running on this thread, as (runtime id, observer id), innermost last
thread_local! {
    static OBSERVER_STACK: RefCell<Vec<(usize, usize)>> = const { RefCell::new(Vec::new()) };
}

/// Pops the observer pushed by `with_observer`, even on unwind.
struct ObserverFrame;

impl Drop for ObserverFrame {
    fn drop(&mut self) {
        OBSERVER_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

impl ReactiveRuntime {
    /// Create a new isolated runtime with its own dependency graph.
    pub fn new() -> Arc<Self> {
        Arc::new(ReactiveRuntime {
            runtime_id: NEXT_RUNTIME_ID.fetch_add(1, Ordering::Relaxed),
            next_id: AtomicUsize::new(0),
            context: Mutex::new(ReactiveContext::new()),
        })
    }

    /// Run a function with a fresh isolated runtime.
    ///
    /// Everything created inside `f` is tracked by the fresh runtime, which
    /// is dropped once the last primitive referencing it goes away.
    pub fn scope<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        Self::with_runtime(Self::new(), f)
    }

    /// Get or create the global runtime (fallback).
    pub fn global() -> Arc<Self> {
        static RUNTIME: OnceLock<Arc<ReactiveRuntime>> = OnceLock::new();
        Arc::clone(RUNTIME.get_or_init(Self::new))
    }

    /// Get the current reactive runtime (scoped or global fallback).
    pub fn current() -> Arc<Self> {
        RUNTIME_STACK.with(|stack| stack.borrow().last().cloned().unwrap_or_else(Self::global))
    }

    /// Run a function with a specific runtime as the current context.
    pub fn with_runtime<F, R>(runtime: Arc<Self>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().push(runtime);
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });

        match result {
            Ok(r) => r,
            Err(e) => std::panic::resume_unwind(e),
        }
    }

    /// Drop every observer and dependency tracked by this runtime.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of observers currently registered.
    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }

    fn lock(&self) -> MutexGuard<'_, ReactiveContext> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Innermost observer of this runtime running on the calling thread.
    fn current_observer(&self) -> Option<usize> {
        OBSERVER_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .rev()
                .find(|(runtime_id, _)| *runtime_id == self.runtime_id)
                .map(|(_, observer_id)| *observer_id)
        })
    }

    /// Record a read of `signal_id` by the observer running on this thread, if any.
    pub(crate) fn track_read(&self, signal_id: usize) {
        let Some(current_observer) = self.current_observer() else {
            return;
        };
        let mut ctx = self.lock();
        ctx.dependencies
            .entry(signal_id)
            .or_default()
            .insert(current_observer);
        ctx.observer_deps
            .entry(current_observer)
            .or_default()
            .insert(signal_id);
    }

    /// Run every observer that depends on `signal_id`.
    ///
    /// The graph lock is released before observers run, so they may read
    /// and write signals freely.
    pub(crate) fn notify_observers(&self, signal_id: usize) {
        let pending: Vec<Observer> = {
            let ctx = self.lock();
            match ctx.dependencies.get(&signal_id) {
                Some(ids) => ids
                    .iter()
                    .filter_map(|id| ctx.observers.get(id).cloned())
                    .collect(),
                None => return,
            }
        };

        for observer in pending {
            observer();
        }
    }

    /// Register (or replace) the callback run when an observer's dependencies change.
    pub(crate) fn create_observer<F>(&self, observer_id: usize, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut ctx = self.lock();
        ctx.unlink(observer_id);
        ctx.observers.insert(observer_id, Arc::new(f));
    }

    pub(crate) fn remove_observer(&self, observer_id: usize) {
        let mut ctx = self.lock();
        ctx.observers.remove(&observer_id);
        ctx.unlink(observer_id);
    }

    /// Run a function with a specific observer as the current context of
    /// the calling thread. Reads made on other threads meanwhile are not
    /// attributed to it.
    pub(crate) fn with_observer<F, R>(&self, observer_id: usize, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        OBSERVER_STACK.with(|stack| {
            stack.borrow_mut().push((self.runtime_id, observer_id));
        });
        let _frame = ObserverFrame;
        f()
    }
}
