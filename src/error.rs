//! Error types for the shim and its apartment collaborator.
//!
//! shim 及其 apartment 协作者的错误类型。

use std::error::Error as StdError;
use std::io;

use thiserror::Error;

/// Opaque error payload produced by an [`Apartment`](crate::Apartment) implementation.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Failure reported by [`Apartment::initialize`](crate::Apartment::initialize).
///
/// [`Apartment::initialize`](crate::Apartment::initialize) 报告的失败。
#[derive(Error, Debug)]
pub enum InitError {
    /// The calling thread was already initialized by someone outside the shim.
    ///
    /// The platform still bumped its own per-thread reference count, so the
    /// worker balances it with one `uninitialize` before giving up.
    ///
    /// 调用线程已被 shim 之外的代码初始化。
    #[error("resource context already initialized on this thread")]
    AlreadyInitialized,

    /// Any other initialization failure. No compensation is performed.
    ///
    /// 其他初始化失败，不做补偿。
    #[error(transparent)]
    Other(BoxError),
}

impl InitError {
    /// Wrap an arbitrary error as [`InitError::Other`].
    pub fn other<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        InitError::Other(error.into())
    }
}

/// Errors returned by [`Shim`](crate::Shim) operations.
///
/// [`Shim`](crate::Shim) 操作返回的错误。
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ShimError {
    /// Applying `delta` to `current` would drive the demand counter below zero.
    ///
    /// This is a bookkeeping bug in the caller (more releases than acquires).
    /// The counter is left at `current`.
    ///
    /// 需求计数器将变为负数，说明调用方的获取/释放不配对。计数器保持 `current` 不变。
    #[error("negative shim counter: {current} {delta:+} < 0")]
    NegativeCounter {
        /// Counter value before the rejected mutation.
        current: i64,
        /// The rejected delta.
        delta: i64,
    },

    /// Applying `delta` to `current` would overflow the demand counter.
    ///
    /// Treated like [`ShimError::NegativeCounter`]: the counter is left at
    /// `current`.
    ///
    /// 需求计数器将溢出，计数器保持 `current` 不变。
    #[error("shim counter overflow: {current} {delta:+} > i64::MAX")]
    CounterOverflow {
        /// Counter value before the rejected mutation.
        current: i64,
        /// The rejected delta.
        delta: i64,
    },

    /// The worker thread was already initialized by someone else.
    ///
    /// The compensating `uninitialize` has already been performed.
    ///
    /// 工作线程已被其他代码初始化，补偿性的 `uninitialize` 已执行。
    #[error("worker thread was already initialized outside the shim")]
    AlreadyInitialized,

    /// The apartment failed to initialize on the worker thread.
    ///
    /// apartment 在工作线程上初始化失败。
    #[error("apartment initialization failed: {0}")]
    Initialization(#[source] BoxError),

    /// The operating system refused to create the worker thread.
    ///
    /// 操作系统无法创建工作线程。
    #[error("failed to spawn shim worker thread: {0}")]
    Spawn(#[source] io::Error),

    /// The worker exited without reporting an initialization result.
    ///
    /// This happens when the apartment panics inside `initialize`, or inside
    /// the compensating `uninitialize` that follows an
    /// [`InitError::AlreadyInitialized`] report. The panic wins over the
    /// already-initialized outcome because the platform's per-thread count
    /// may not have been balanced.
    ///
    /// 工作线程未报告初始化结果就退出了（例如 `initialize` 内部 panic）。
    #[error("shim worker exited before reporting initialization")]
    WorkerLost,
}

impl ShimError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use lite_apartment::ShimError;
    ///
    /// let err = ShimError::NegativeCounter { current: 0, delta: -1 };
    /// assert_eq!(err.as_label(), "negative_counter");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ShimError::NegativeCounter { .. } => "negative_counter",
            ShimError::CounterOverflow { .. } => "counter_overflow",
            ShimError::AlreadyInitialized => "already_initialized",
            ShimError::Initialization(_) => "initialization_failed",
            ShimError::Spawn(_) => "spawn_failed",
            ShimError::WorkerLost => "worker_lost",
        }
    }

    /// True for errors that indicate a caller bookkeeping bug rather than a
    /// failure of the apartment or the platform.
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            ShimError::NegativeCounter { .. } | ShimError::CounterOverflow { .. }
        )
    }
}

impl From<InitError> for ShimError {
    fn from(error: InitError) -> Self {
        match error {
            InitError::AlreadyInitialized => ShimError::AlreadyInitialized,
            InitError::Other(source) => ShimError::Initialization(source),
        }
    }
}
