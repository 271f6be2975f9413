//! The dedicated worker thread that owns the resource context.
//!
//! 持有资源上下文的专用工作线程。

use tracing::{debug, error, warn};

use crate::apartment::Apartment;
use crate::error::{InitError, ShimError};
use crate::handshake::{self, Sender};
use crate::primitives::atomic::{AtomicU8, Ordering};
use crate::primitives::sync::{self, Arc};
use crate::primitives::thread;
use crate::shim::Shared;
use crate::wait_group::{Token, WaitGroup};

/// Lifecycle of the most recent worker instance.
///
/// 最近一个工作线程实例的生命周期状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// No worker has been started yet.
    NotStarted,
    /// The worker is running `Apartment::initialize`.
    Initializing,
    /// The context is live and the worker is waiting for demand to reach zero.
    Active,
    /// Demand reached zero and the worker is running `Apartment::uninitialize`.
    Draining,
    /// The worker has released the context (or failed to acquire it) and exited.
    Terminated,
}

impl WorkerState {
    #[inline]
    fn to_u8(self) -> u8 {
        match self {
            WorkerState::NotStarted => 0,
            WorkerState::Initializing => 1,
            WorkerState::Active => 2,
            WorkerState::Draining => 3,
            WorkerState::Terminated => 4,
        }
    }

    #[inline]
    fn from_u8(value: u8) -> Self {
        match value {
            1 => WorkerState::Initializing,
            2 => WorkerState::Active,
            3 => WorkerState::Draining,
            4 => WorkerState::Terminated,
            _ => WorkerState::NotStarted,
        }
    }
}

/// Atomic cell holding a [`WorkerState`].
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        StateCell(AtomicU8::new(WorkerState::NotStarted.to_u8()))
    }

    #[inline]
    pub(crate) fn get(&self) -> WorkerState {
        WorkerState::from_u8(self.0.load(Ordering::Acquire))
    }

    #[inline]
    fn set(&self, state: WorkerState) {
        self.0.store(state.to_u8(), Ordering::Release);
    }
}

type Report = Sender<Result<(), ShimError>>;

/// Spawn a worker and block until it reports its initialization outcome.
///
/// Must be called with the start guard held.
pub(crate) fn start<A: Apartment>(shared: &Arc<Shared<A>>) -> Result<(), ShimError> {
    let (report, outcome) = handshake::channel();
    let token = WaitGroup::enter(&shared.workers);
    let worker = Arc::clone(shared);

    debug!(thread = %shared.config.thread_name, "starting apartment worker");

    // On spawn failure the closure is dropped, which releases the token and
    // closes the handshake.
    thread::spawn_dedicated(
        &shared.config.thread_name,
        shared.config.stack_size,
        move || run(worker, report, token),
    )
    .map_err(|err| {
        error!(error = %err, "failed to spawn apartment worker");
        ShimError::Spawn(err)
    })?;

    match outcome.blocking_recv() {
        Ok(result) => result,
        Err(_) => {
            // The worker unwound before reporting. No other worker can start
            // while the start guard is held, so this write cannot clobber one.
            shared.state.set(WorkerState::Terminated);
            error!("apartment worker exited before reporting initialization");
            Err(ShimError::WorkerLost)
        }
    }
}

fn run<A: Apartment>(shared: Arc<Shared<A>>, report: Report, _token: Token) {
    shared.state.set(WorkerState::Initializing);

    if let Err(err) = shared.apartment.initialize() {
        let err = match err {
            InitError::AlreadyInitialized => {
                // Balance the platform's per-thread count before giving up.
                warn!("worker thread already initialized outside the shim; compensating");
                shared.apartment.uninitialize();
                ShimError::AlreadyInitialized
            }
            InitError::Other(source) => {
                error!(error = %source, "apartment initialization failed");
                ShimError::Initialization(source)
            }
        };
        shared.state.set(WorkerState::Terminated);
        report.send(Err(err));
        return;
    }

    let mut signal = sync::lock(&shared.signal);
    signal.running = true;
    shared.state.set(WorkerState::Active);
    report.send(Ok(()));
    debug!("apartment active");

    while shared.count.load(Ordering::Acquire) > 0 {
        signal = sync::wait(&shared.zero, signal);
    }

    // Still under the signal lock: a concurrent try_add either raised the
    // count before we looked, or waits here and then sees running == false.
    shared.state.set(WorkerState::Draining);
    signal.running = false;
    shared.apartment.uninitialize();
    shared.state.set(WorkerState::Terminated);
    drop(signal);

    debug!("apartment released");
}
