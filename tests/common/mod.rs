#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};
use std::time::Duration;

use lite_apartment::{Apartment, InitError};

/// How the next `initialize` call should behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeed,
    AlreadyInitialized,
    Fail,
    Panic,
}

/// Apartment double that records every call and the thread it came from.
pub struct Recording {
    outcomes: Mutex<Vec<Outcome>>,
    init_delay: Duration,
    pub inits: AtomicUsize,
    pub uninits: AtomicUsize,
    live: AtomicUsize,
    pub max_live: AtomicUsize,
    threads: Mutex<Vec<(&'static str, ThreadId)>>,
}

impl Recording {
    pub fn new() -> Arc<Self> {
        Self::scripted(Vec::new())
    }

    /// Outcomes are consumed in order; once exhausted every call succeeds.
    pub fn scripted(outcomes: Vec<Outcome>) -> Arc<Self> {
        Self::build(outcomes, Duration::ZERO)
    }

    pub fn slow(init_delay: Duration) -> Arc<Self> {
        Self::build(Vec::new(), init_delay)
    }

    fn build(mut outcomes: Vec<Outcome>, init_delay: Duration) -> Arc<Self> {
        outcomes.reverse();
        Arc::new(Self {
            outcomes: Mutex::new(outcomes),
            init_delay,
            inits: AtomicUsize::new(0),
            uninits: AtomicUsize::new(0),
            live: AtomicUsize::new(0),
            max_live: AtomicUsize::new(0),
            threads: Mutex::new(Vec::new()),
        })
    }

    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn uninits(&self) -> usize {
        self.uninits.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }

    /// (call, thread) pairs in call order.
    pub fn calls(&self) -> Vec<(&'static str, ThreadId)> {
        self.threads.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.threads
            .lock()
            .unwrap()
            .push((call, thread::current().id()));
    }
}

impl Apartment for Recording {
    fn initialize(&self) -> Result<(), InitError> {
        self.record("initialize");
        self.inits.fetch_add(1, Ordering::SeqCst);
        if !self.init_delay.is_zero() {
            thread::sleep(self.init_delay);
        }

        let outcome = self.outcomes.lock().unwrap().pop().unwrap_or(Outcome::Succeed);
        match outcome {
            Outcome::Succeed => {
                let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_live.fetch_max(live, Ordering::SeqCst);
                Ok(())
            }
            Outcome::AlreadyInitialized => {
                // The platform counted this call even though it reported S_FALSE.
                self.live.fetch_add(1, Ordering::SeqCst);
                Err(InitError::AlreadyInitialized)
            }
            Outcome::Fail => Err(InitError::other("access denied")),
            Outcome::Panic => panic!("apartment exploded"),
        }
    }

    fn uninitialize(&self) {
        self.record("uninitialize");
        self.uninits.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Recording {
    /// Platform-side reference count for the apartment.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}
