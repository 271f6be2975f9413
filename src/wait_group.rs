//! Blocking completion tracker for worker threads.
//!
//! 工作线程的阻塞式完成跟踪器。

use crate::primitives::sync::{self, Arc, Condvar, Mutex};

/// Counts live workers and lets callers block until none remain.
pub(crate) struct WaitGroup {
    live: Mutex<usize>,
    drained: Condvar,
}

impl WaitGroup {
    pub(crate) fn new() -> Self {
        Self {
            live: Mutex::new(0),
            drained: Condvar::new(),
        }
    }

    /// Register one more live worker.
    ///
    /// The returned token must be moved into the worker; dropping it (including
    /// during unwinding) marks that worker as exited.
    pub(crate) fn enter(group: &Arc<Self>) -> Token {
        *sync::lock(&group.live) += 1;
        Token {
            group: Arc::clone(group),
        }
    }

    /// Block until every registered worker has exited.
    pub(crate) fn wait(&self) {
        let mut live = sync::lock(&self.live);
        while *live > 0 {
            live = sync::wait(&self.drained, live);
        }
    }

    #[cfg(all(test, not(feature = "loom")))]
    pub(crate) fn live(&self) -> usize {
        *sync::lock(&self.live)
    }

    fn leave(&self) {
        let mut live = sync::lock(&self.live);
        *live -= 1;
        if *live == 0 {
            self.drained.notify_all();
        }
    }
}

impl std::fmt::Debug for WaitGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaitGroup").finish_non_exhaustive()
    }
}

/// Liveness token for a single worker.
pub(crate) struct Token {
    group: Arc<WaitGroup>,
}

impl Drop for Token {
    fn drop(&mut self) {
        self.group.leave();
    }
}
