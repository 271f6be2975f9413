#![cfg(not(feature = "loom"))]

mod common;

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use common::{Outcome, Recording};
use lite_apartment::{Shim, ShimConfig, ShimError, WorkerState};

#[test]
fn two_callers_share_one_worker() {
    let apartment = Recording::new();
    let shim = Shim::new(apartment.clone());

    // Caller A
    shim.add(1);
    assert!(shim.is_running());
    assert_eq!(apartment.inits(), 1);

    // Caller B joins the existing worker.
    shim.add(1);
    assert_eq!(shim.count(), 2);
    assert_eq!(apartment.inits(), 1);

    shim.done();
    assert_eq!(shim.count(), 1);
    assert!(shim.is_running());
    assert_eq!(apartment.uninits(), 0);

    shim.done();
    shim.wait_done();
    assert_eq!(shim.count(), 0);
    assert!(!shim.is_running());
    assert_eq!(apartment.uninits(), 1);
    assert_eq!(apartment.live(), 0);
}

#[test]
#[should_panic(expected = "negative shim counter")]
fn add_negative_at_zero_panics() {
    let shim = Shim::new(Recording::new());
    shim.add(-1);
}

#[test]
fn negative_counter_leaves_running_worker_alone() {
    let apartment = Recording::new();
    let shim = Shim::new(apartment.clone());

    shim.add(2);
    let err = shim.try_add(-3).unwrap_err();
    assert!(matches!(err, ShimError::NegativeCounter { current: 2, delta: -3 }));
    assert_eq!(shim.count(), 2);
    assert!(shim.is_running());

    shim.add(-2);
    shim.wait_done();
    assert_eq!(apartment.uninits(), 1);
}

#[test]
fn worker_is_pinned_to_one_thread() {
    let apartment = Recording::new();
    let shim = Shim::new(apartment.clone());

    shim.add(1);
    let caller = thread::current().id();
    shim.done();
    shim.wait_done();

    let calls = apartment.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, "initialize");
    assert_eq!(calls[1].0, "uninitialize");
    assert_eq!(calls[0].1, calls[1].1);
    assert_ne!(calls[0].1, caller);
}

#[test]
fn restart_after_drain_uses_fresh_worker() {
    let apartment = Recording::new();
    let shim = Shim::new(apartment.clone());

    shim.add(1);
    shim.done();
    shim.wait_done();
    assert_eq!(shim.state(), WorkerState::Terminated);

    shim.add(1);
    assert!(shim.is_running());
    assert_eq!(shim.state(), WorkerState::Active);
    shim.done();
    shim.wait_done();

    assert_eq!(apartment.inits(), 2);
    assert_eq!(apartment.uninits(), 2);

    let calls = apartment.calls();
    assert_ne!(calls[0].1, calls[2].1);
}

#[test]
fn already_initialized_is_compensated() {
    let apartment = Recording::scripted(vec![Outcome::AlreadyInitialized]);
    let shim = Shim::new(apartment.clone());

    let err = shim.try_add(1).unwrap_err();
    assert!(matches!(err, ShimError::AlreadyInitialized));
    assert!(!shim.is_running());
    shim.wait_done();

    assert_eq!(apartment.inits(), 1);
    assert_eq!(apartment.uninits(), 1);
    assert_eq!(apartment.live(), 0);
    assert_eq!(shim.state(), WorkerState::Terminated);

    // Demand from the failed start was kept.
    assert_eq!(shim.count(), 1);
    shim.done();
}

#[test]
fn other_init_failure_is_not_compensated() {
    let apartment = Recording::scripted(vec![Outcome::Fail]);
    let shim = Shim::new(apartment.clone());

    let err = shim.try_add(1).unwrap_err();
    assert!(matches!(err, ShimError::Initialization(_)));
    assert_eq!(err.to_string(), "apartment initialization failed: access denied");
    shim.wait_done();

    assert_eq!(apartment.inits(), 1);
    assert_eq!(apartment.uninits(), 0);
    assert!(!shim.is_running());
    assert_eq!(shim.count(), 1);
}

#[test]
fn failed_start_is_retried_by_next_raise() {
    let apartment = Recording::scripted(vec![Outcome::Fail]);
    let shim = Shim::new(apartment.clone());

    assert!(shim.try_add(1).is_err());
    // Next raise sees running == false and starts a new worker.
    shim.add(1);
    assert!(shim.is_running());
    assert_eq!(shim.count(), 2);

    shim.add(-2);
    shim.wait_done();
    assert_eq!(apartment.inits(), 2);
    assert_eq!(apartment.uninits(), 1);
}

#[test]
#[should_panic(expected = "apartment initialization failed")]
fn add_panics_on_start_failure() {
    let shim = Shim::new(Recording::scripted(vec![Outcome::Fail]));
    shim.add(1);
}

#[test]
fn panicking_apartment_reports_worker_lost() {
    let apartment = Recording::scripted(vec![Outcome::Panic]);
    let shim = Shim::new(apartment.clone());

    let err = shim.try_add(1).unwrap_err();
    assert!(matches!(err, ShimError::WorkerLost));
    shim.wait_done();
    assert!(!shim.is_running());
    assert_eq!(shim.state(), WorkerState::Terminated);

    // The shim is still usable afterwards.
    shim.add(1);
    assert!(shim.is_running());
    shim.add(-2);
    shim.wait_done();
}

#[test]
fn release_during_initialize_drains_after_start() {
    let apartment = Recording::slow(Duration::from_millis(50));
    let shim = Shim::new(apartment.clone());

    let releaser = {
        let shim = shim.clone();
        thread::spawn(move || {
            // Wait until the starter's unit is recorded and the worker is
            // inside initialize.
            while shim.state() != WorkerState::Initializing {
                thread::sleep(Duration::from_millis(1));
            }
            shim.try_done()
        })
    };

    shim.try_add(1).unwrap();
    assert!(releaser.join().unwrap().is_ok());

    shim.wait_done();
    assert_eq!(shim.count(), 0);
    assert!(!shim.is_running());
    assert_eq!(shim.state(), WorkerState::Terminated);
    assert_eq!(apartment.inits(), 1);
    assert_eq!(apartment.uninits(), 1);
    assert_eq!(apartment.live(), 0);
}

#[test]
fn acquire_releases_demand_when_start_fails() {
    let apartment = Recording::scripted(vec![Outcome::Fail]);
    let shim = Shim::new(apartment.clone());

    assert!(shim.acquire().is_err());
    assert_eq!(shim.count(), 0);

    let guard = shim.acquire().unwrap();
    assert_eq!(shim.count(), 1);
    drop(guard);
    shim.wait_done();
    assert_eq!(apartment.uninits(), 1);
}

#[test]
fn concurrent_raises_start_one_worker() {
    let apartment = Recording::slow(Duration::from_millis(20));
    let shim = Shim::new(apartment.clone());
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let shim = shim.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                shim.add(1);
                assert!(shim.is_running());
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(shim.count(), 8);
    assert_eq!(apartment.inits(), 1);

    shim.add(-8);
    shim.wait_done();
    assert_eq!(apartment.uninits(), 1);
}

#[test]
fn churn_never_overlaps_workers() {
    let apartment = Recording::new();
    let shim = Shim::new(apartment.clone());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shim = shim.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    let _guard = shim.acquire().unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    shim.wait_done();
    assert_eq!(shim.count(), 0);
    assert_eq!(apartment.max_live(), 1);
    assert_eq!(apartment.inits(), apartment.uninits());
    assert_eq!(apartment.live(), 0);
}

#[test]
fn wait_done_blocks_until_demand_released() {
    let apartment = Recording::new();
    let shim = Shim::new(apartment.clone());
    shim.add(1);

    let releaser = {
        let shim = shim.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            shim.done();
        })
    };

    shim.wait_done();
    assert_eq!(apartment.uninits(), 1);
    assert_eq!(shim.count(), 0);
    releaser.join().unwrap();
}

#[test]
fn configured_stack_size_is_accepted() {
    let apartment = Recording::new();
    let config = ShimConfig::default()
        .with_thread_name("recording-mta")
        .with_stack_size(128 * 1024);
    let shim = Shim::with_config(apartment.clone(), config);

    let guard = shim.acquire_owned().unwrap();
    assert!(guard.shim().is_running());
    drop(guard);
    shim.wait_done();
    assert_eq!(apartment.uninits(), 1);
}
