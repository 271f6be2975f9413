//! Facade over `std` and `loom` synchronization primitives.
//!
//! Every module in the crate reaches its atomics, locks, condition variables
//! and threads through here, so building with `--features loom` swaps the whole
//! crate onto loom's model checker without touching the call sites.
//!
//! std 与 loom 同步原语的统一门面。启用 `loom` feature 时整个 crate 切换到 loom 模型检查。

#[cfg(not(feature = "loom"))]
pub(crate) mod atomic {
    pub(crate) use std::sync::atomic::{AtomicI64, AtomicU8, Ordering};
}

#[cfg(feature = "loom")]
pub(crate) mod atomic {
    pub(crate) use loom::sync::atomic::{AtomicI64, AtomicU8, Ordering};
}

#[cfg(not(feature = "loom"))]
pub(crate) mod sync {
    pub(crate) use std::sync::{Arc, Condvar, Mutex, MutexGuard};

    use std::sync::{LockResult, PoisonError};

    /// Lock ignoring poison.
    ///
    /// A panic inside the collaborator must not wedge every later caller; the
    /// guarded state is always left consistent between statements.
    #[inline]
    pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        recover(mutex.lock())
    }

    #[inline]
    pub(crate) fn wait<'a, T>(condvar: &Condvar, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        recover(condvar.wait(guard))
    }

    #[inline]
    fn recover<G>(result: LockResult<G>) -> G {
        result.unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(feature = "loom")]
pub(crate) mod sync {
    pub(crate) use loom::sync::{Arc, Condvar, Mutex, MutexGuard};

    use std::sync::{LockResult, PoisonError};

    #[inline]
    pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        recover(mutex.lock())
    }

    #[inline]
    pub(crate) fn wait<'a, T>(condvar: &Condvar, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        recover(condvar.wait(guard))
    }

    #[inline]
    fn recover<G>(result: LockResult<G>) -> G {
        result.unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(not(feature = "loom"))]
pub(crate) mod thread {
    use std::io;

    /// Spawn a detached, dedicated OS thread.
    ///
    /// The thread is never joined through its handle; its lifetime is tracked
    /// by the caller's [`WaitGroup`](crate::wait_group::WaitGroup) instead.
    pub(crate) fn spawn_dedicated<F>(name: &str, stack_size: Option<usize>, f: F) -> io::Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut builder = std::thread::Builder::new().name(name.to_owned());
        if let Some(size) = stack_size {
            builder = builder.stack_size(size);
        }
        builder.spawn(f).map(drop)
    }
}

#[cfg(feature = "loom")]
pub(crate) mod thread {
    use std::io;

    // loom threads carry neither names nor stack sizes.
    pub(crate) fn spawn_dedicated<F>(_name: &str, _stack_size: Option<usize>, f: F) -> io::Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        loom::thread::spawn(f);
        Ok(())
    }
}
