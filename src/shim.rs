//! Reference-counted keep-alive controller.
//!
//! A [`Shim`] behaves like a wait group wrapped around a dedicated worker
//! thread. While its demand counter is above zero, exactly one worker holds an
//! initialized [`Apartment`]. When the counter returns to zero the worker
//! uninitializes and exits; raising demand again starts a fresh worker.
//!
//! 引用计数的保活控制器。需求计数器大于零时，恰好有一个工作线程持有已初始化的 [`Apartment`]。
//!
//! # Example
//!
//! ```
//! use lite_apartment::{Apartment, InitError, Shim};
//!
//! struct Noop;
//!
//! impl Apartment for Noop {
//!     fn initialize(&self) -> Result<(), InitError> {
//!         Ok(())
//!     }
//!
//!     fn uninitialize(&self) {}
//! }
//!
//! let shim = Shim::new(Noop);
//!
//! shim.add(1);
//! assert!(shim.is_running());
//!
//! shim.done();
//! shim.wait_done();
//! assert!(!shim.is_running());
//! ```

use std::fmt;

use tracing::error;

use crate::apartment::Apartment;
use crate::config::ShimConfig;
use crate::error::ShimError;
use crate::primitives::atomic::{AtomicI64, Ordering};
use crate::primitives::sync::{self, Arc, Condvar, Mutex, MutexGuard};
use crate::wait_group::WaitGroup;
use crate::worker::{self, StateCell, WorkerState};

/// State guarded by the signal lock.
pub(crate) struct Signal {
    /// True exactly while a worker holds an initialized context.
    pub(crate) running: bool,
}

pub(crate) struct Shared<A> {
    pub(crate) apartment: A,
    pub(crate) config: ShimConfig,
    /// Serializes start decisions against each other and against drains.
    start: Mutex<()>,
    pub(crate) signal: Mutex<Signal>,
    /// Signalled whenever the counter reaches zero.
    pub(crate) zero: Condvar,
    /// Only written under `signal`; read lock-free for snapshots.
    pub(crate) count: AtomicI64,
    pub(crate) state: StateCell,
    pub(crate) workers: Arc<WaitGroup>,
}

impl<A> Shared<A> {
    /// Apply `delta` to the counter while holding the signal lock.
    ///
    /// Rejects mutations that would go negative or overflow and leaves the
    /// counter as it was. Broadcasts when the new value is exactly zero.
    fn adjust(&self, _signal: &MutexGuard<'_, Signal>, delta: i64) -> Result<i64, ShimError> {
        let current = self.count.load(Ordering::Acquire);
        let Some(value) = current.checked_add(delta) else {
            return Err(ShimError::CounterOverflow { current, delta });
        };
        if value < 0 {
            return Err(ShimError::NegativeCounter { current, delta });
        }
        self.count.store(value, Ordering::Release);
        if value == 0 {
            self.zero.notify_all();
        }
        Ok(value)
    }
}

/// Keeps an [`Apartment`] initialized on a dedicated thread while demand is
/// above zero.
///
/// `Shim` is a cheap handle: clones share the same counter and worker.
///
/// 在需求大于零期间，于专用线程上保持 [`Apartment`] 处于初始化状态。`Shim` 的克隆共享同一计数器与工作线程。
pub struct Shim<A: Apartment> {
    shared: Arc<Shared<A>>,
}

impl<A: Apartment> Shim<A> {
    /// Create a shim with the default [`ShimConfig`].
    ///
    /// No worker is started until demand first rises above zero.
    pub fn new(apartment: A) -> Self {
        Self::with_config(apartment, ShimConfig::default())
    }

    /// Create a shim with a custom worker configuration.
    pub fn with_config(apartment: A, config: ShimConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                apartment,
                config,
                start: Mutex::new(()),
                signal: Mutex::new(Signal { running: false }),
                zero: Condvar::new(),
                count: AtomicI64::new(0),
                state: StateCell::new(),
                workers: Arc::new(WaitGroup::new()),
            }),
        }
    }

    /// Add `delta`, which may be negative, to the demand counter.
    ///
    /// If no worker holds the apartment and the resulting count is positive,
    /// a worker is started and this call blocks until it has finished
    /// `Apartment::initialize`.
    ///
    /// Demand is recorded even when the start fails, so every call must still
    /// be balanced by releases.
    ///
    /// # Errors
    ///
    /// - [`ShimError::NegativeCounter`] if the counter would go below zero, or
    ///   [`ShimError::CounterOverflow`] if it would exceed `i64::MAX`; the
    ///   counter is left unchanged in both cases.
    /// - [`ShimError::AlreadyInitialized`], [`ShimError::Initialization`],
    ///   [`ShimError::Spawn`] or [`ShimError::WorkerLost`] if the worker could
    ///   not be brought up.
    ///
    /// 将 `delta`（可为负）加到需求计数器上；必要时启动工作线程并同步等待其初始化结果。
    pub fn try_add(&self, delta: i64) -> Result<(), ShimError> {
        let _start = sync::lock(&self.shared.start);

        let count = {
            let signal = sync::lock(&self.shared.signal);
            let count = self.shared.adjust(&signal, delta)?;
            if signal.running {
                return Ok(());
            }
            count
        };

        if count == 0 {
            return Ok(());
        }

        worker::start(&self.shared)
    }

    /// Add `delta`, which may be negative, to the demand counter.
    ///
    /// # Panics
    ///
    /// Panics on any error [`Shim::try_add`] would return.
    #[track_caller]
    pub fn add(&self, delta: i64) {
        if let Err(err) = self.try_add(delta) {
            panic!("{err}");
        }
    }

    /// Decrement the demand counter by one.
    ///
    /// # Panics
    ///
    /// Panics if the counter would go negative.
    #[track_caller]
    pub fn done(&self) {
        if let Err(err) = self.try_done() {
            panic!("{err}");
        }
    }

    /// Decrement the demand counter by one, returning an error instead of
    /// panicking when the counter would go negative.
    pub fn try_done(&self) -> Result<(), ShimError> {
        let signal = sync::lock(&self.shared.signal);
        self.shared.adjust(&signal, -1).map(drop)
    }

    /// Block until every worker ever started by this shim has exited.
    ///
    /// Demand must already be zero for this to return; otherwise it waits for
    /// the remaining holders to release.
    pub fn wait_done(&self) {
        let _start = sync::lock(&self.shared.start);
        self.shared.workers.wait();
    }

    /// Raise demand by one and return a guard that releases it on drop.
    ///
    /// If the worker fails to start, the unit of demand is released again
    /// before the error is returned.
    ///
    /// 将需求加一，并返回一个在 drop 时释放该需求的守卫。
    pub fn acquire(&self) -> Result<ShimGuard<'_, A>, ShimError> {
        self.acquire_unit()?;
        Ok(ShimGuard { shim: self })
    }

    /// Like [`Shim::acquire`], but the guard owns a handle to the shim.
    pub fn acquire_owned(&self) -> Result<OwnedShimGuard<A>, ShimError> {
        self.acquire_unit()?;
        Ok(OwnedShimGuard { shim: self.clone() })
    }

    /// Current value of the demand counter.
    pub fn count(&self) -> i64 {
        self.shared.count.load(Ordering::Acquire)
    }

    /// True while a worker holds an initialized apartment.
    pub fn is_running(&self) -> bool {
        sync::lock(&self.shared.signal).running
    }

    /// Lifecycle state of the most recent worker.
    pub fn state(&self) -> WorkerState {
        self.shared.state.get()
    }

    /// The wrapped apartment.
    pub fn apartment(&self) -> &A {
        &self.shared.apartment
    }

    /// The worker configuration.
    pub fn config(&self) -> &ShimConfig {
        &self.shared.config
    }

    fn acquire_unit(&self) -> Result<(), ShimError> {
        self.try_add(1).inspect_err(|err| {
            if !err.is_misuse() {
                self.release();
            }
        })
    }

    // Releases never panic; they run from Drop.
    fn release(&self) {
        if let Err(err) = self.try_done() {
            error!(error = %err, "unbalanced shim release");
        }
    }
}

impl<A: Apartment> Clone for Shim<A> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A: Apartment> fmt::Debug for Shim<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shim")
            .field("count", &self.count())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Releases one unit of demand when dropped.
///
/// 在 drop 时释放一个单位的需求。
#[must_use = "dropping the guard releases the demand immediately"]
pub struct ShimGuard<'a, A: Apartment> {
    shim: &'a Shim<A>,
}

impl<A: Apartment> ShimGuard<'_, A> {
    /// The shim this guard holds demand on.
    pub fn shim(&self) -> &Shim<A> {
        self.shim
    }
}

impl<A: Apartment> Drop for ShimGuard<'_, A> {
    fn drop(&mut self) {
        self.shim.release();
    }
}

impl<A: Apartment> fmt::Debug for ShimGuard<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShimGuard").finish_non_exhaustive()
    }
}

/// Owned variant of [`ShimGuard`], usable across `'static` boundaries.
#[must_use = "dropping the guard releases the demand immediately"]
pub struct OwnedShimGuard<A: Apartment> {
    shim: Shim<A>,
}

impl<A: Apartment> OwnedShimGuard<A> {
    /// The shim this guard holds demand on.
    pub fn shim(&self) -> &Shim<A> {
        &self.shim
    }
}

impl<A: Apartment> Drop for OwnedShimGuard<A> {
    fn drop(&mut self) {
        self.shim.release();
    }
}

impl<A: Apartment> fmt::Debug for OwnedShimGuard<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedShimGuard").finish_non_exhaustive()
    }
}
