//! Runtime support for reactive primitives.
//!
//! This module provides the infrastructure for dependency tracking,
//! observer registration, and scoped execution contexts.

mod context;

pub use context::ReactiveRuntime;
