//! One-shot blocking handshake between a starter and its worker.
//!
//! The worker reports exactly one value (its initialization outcome); the
//! starter parks until that value arrives or the worker goes away without
//! sending.
//!
//! 启动者与工作线程之间的一次性阻塞握手。

use std::fmt;

use crate::primitives::sync::{self, Arc, Condvar, Mutex};

/// The worker went away without reporting its initialization outcome.
///
/// 工作线程未报告初始化结果就已退出。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RecvError;

impl fmt::Display for RecvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handshake sender dropped")
    }
}

impl std::error::Error for RecvError {}

enum Slot<T> {
    Pending,
    Ready(T),
    Closed,
}

struct Inner<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T> Inner<T> {
    fn settle(&self, next: Slot<T>) {
        let mut slot = sync::lock(&self.slot);
        if matches!(*slot, Slot::Pending) {
            *slot = next;
            self.ready.notify_one();
        }
    }
}

/// Sending half, owned by the worker.
pub(crate) struct Sender<T> {
    inner: Arc<Inner<T>>,
}

/// Receiving half, owned by the starter.
pub(crate) struct Receiver<T> {
    inner: Arc<Inner<T>>,
}

/// Create a handshake pair.
pub(crate) fn channel<T>() -> (Sender<T>, Receiver<T>) {
    let inner = Arc::new(Inner {
        slot: Mutex::new(Slot::Pending),
        ready: Condvar::new(),
    });
    let sender = Sender {
        inner: inner.clone(),
    };
    (sender, Receiver { inner })
}

impl<T> Sender<T> {
    /// Deliver the value and wake the receiver.
    pub(crate) fn send(self, value: T) {
        self.inner.settle(Slot::Ready(value));
    }
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        // No-op after a successful send; the slot is no longer pending.
        self.inner.settle(Slot::Closed);
    }
}

impl<T> Receiver<T> {
    /// Park the current thread until the worker reports.
    pub(crate) fn blocking_recv(self) -> Result<T, RecvError> {
        let mut slot = sync::lock(&self.inner.slot);
        loop {
            match std::mem::replace(&mut *slot, Slot::Closed) {
                Slot::Ready(value) => return Ok(value),
                Slot::Closed => return Err(RecvError),
                Slot::Pending => {
                    *slot = Slot::Pending;
                    slot = sync::wait(&self.inner.ready, slot);
                }
            }
        }
    }
}

impl<T> fmt::Debug for Sender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender").finish_non_exhaustive()
    }
}

impl<T> fmt::Debug for Receiver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver").finish_non_exhaustive()
    }
}
