//! The thread-affine resource the shim keeps alive.

use std::sync::Arc;

use crate::error::InitError;

/// A per-thread resource context, such as a multi-threaded COM apartment.
///
/// Both methods are only ever called from the shim's dedicated worker thread,
/// and always in pairs: every successful `initialize` is followed by exactly
/// one `uninitialize` on the same thread. When `initialize` fails with
/// [`InitError::AlreadyInitialized`] the worker still calls `uninitialize`
/// once to balance the platform's own per-thread count.
///
/// 线程亲和的资源上下文（例如多线程 COM apartment）。两个方法都只会在 shim 的专用工作线程上调用。
pub trait Apartment: Send + Sync + 'static {
    /// Initialize the resource context on the calling thread.
    fn initialize(&self) -> Result<(), InitError>;

    /// Release the calling thread's resource context.
    fn uninitialize(&self);
}

impl<A: Apartment + ?Sized> Apartment for Arc<A> {
    #[inline]
    fn initialize(&self) -> Result<(), InitError> {
        (**self).initialize()
    }

    #[inline]
    fn uninitialize(&self) {
        (**self).uninitialize()
    }
}

impl<A: Apartment + ?Sized> Apartment for Box<A> {
    #[inline]
    fn initialize(&self) -> Result<(), InitError> {
        (**self).initialize()
    }

    #[inline]
    fn uninitialize(&self) {
        (**self).uninitialize()
    }
}
