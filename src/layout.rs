//! Window and element measurement used for the resource table height.

/// Callback run on every window resize.
pub type ResizeListener = Box<dyn Fn() + Send + Sync>;

/// Windowing collaborator: element measurement and resize events.
pub trait Viewport: Send + Sync {
    /// Rendered height of the element with `element_id`, if it exists.
    fn element_height(&self, element_id: &str) -> Option<u32>;

    /// Register a listener for window resize events.
    fn on_resize(&self, listener: ResizeListener);
}
