//! # lite-apartment
//!
//! Reference-counted keep-alive for thread-affine resource contexts.
//!
//! 线程亲和资源上下文的引用计数保活。
//!
//! ## Overview / 概述
//!
//! Some platform subsystems must be initialized per thread, are reference
//! counted by the platform itself, and are expensive to tear down and bring
//! back. The multi-threaded COM apartment is the classic case: as soon as the
//! last thread in a process calls `CoUninitialize`, COM unloads its resources
//! and the next caller pays to load them again.
//!
//! `lite-apartment` keeps one dedicated thread initialized for as long as at
//! least one logical consumer needs it. Consumers raise and lower a demand
//! counter, much like a wait group; the [`Shim`] starts its worker lazily on
//! the first raise and lets it exit once the counter returns to zero.
//!
//! 某些平台子系统必须按线程初始化，由平台自身进行引用计数，且拆除与重建代价高昂（典型例子是多线程 COM apartment）。
//! `lite-apartment` 在至少有一个逻辑使用者需要时，保持一个专用线程处于初始化状态。
//!
//! ## Lifecycle / 生命周期
//!
//! ```text
//!  try_add(+n) from 0          count > 0             count == 0
//! ─────────────────────► Initializing ──► Active ────────────────► Draining ──► Terminated
//!                             │                                                   ▲
//!                             └──────────── initialize() failed ──────────────────┘
//! ```
//!
//! - At most one worker holds the apartment at a time.
//! - The worker is the only thread that ever calls [`Apartment::initialize`] or
//!   [`Apartment::uninitialize`].
//! - Demand recorded by a call whose start failed is kept; every `add` must be
//!   balanced by a release regardless of its outcome.
//!
//! ## Modules / 模块
//!
//! - [`Shim`]: the controller (`try_add`, `add`, `done`, `wait_done`, guards).
//! - [`Apartment`]: the collaborator trait implemented by the wrapped resource.
//! - [`ShimConfig`]: worker thread naming and stack size.
//! - `com` (Windows only): [`Apartment`] over `CoInitializeEx(COINIT_MULTITHREADED)`.
//!
//! ## Example / 示例
//!
//! ```
//! use lite_apartment::{Apartment, InitError, Shim};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! #[derive(Default)]
//! struct Tracked {
//!     live: AtomicUsize,
//! }
//!
//! impl Apartment for Tracked {
//!     fn initialize(&self) -> Result<(), InitError> {
//!         self.live.fetch_add(1, Ordering::SeqCst);
//!         Ok(())
//!     }
//!
//!     fn uninitialize(&self) {
//!         self.live.fetch_sub(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let shim = Shim::new(Tracked::default());
//!
//! {
//!     let _a = shim.acquire().unwrap();
//!     let _b = shim.acquire().unwrap();
//!     assert_eq!(shim.count(), 2);
//!     assert_eq!(shim.apartment().live.load(Ordering::SeqCst), 1);
//! }
//!
//! shim.wait_done();
//! assert_eq!(shim.apartment().live.load(Ordering::SeqCst), 0);
//! ```
//!
//! ## Testing / 测试
//!
//! All synchronization goes through an internal facade that switches to
//! [`loom`](https://docs.rs/loom) when the `loom` feature is enabled:
//!
//! ```text
//! cargo test --release --features loom --test loom_shim
//! ```

mod apartment;
mod config;
mod error;
mod handshake;
mod primitives;
mod shim;
mod wait_group;
mod worker;

#[cfg(windows)]
pub mod com;

pub use crate::apartment::Apartment;
pub use crate::config::{ShimConfig, DEFAULT_THREAD_NAME};
pub use crate::error::{BoxError, InitError, ShimError};
pub use crate::shim::{OwnedShimGuard, Shim, ShimGuard};
pub use crate::worker::WorkerState;
