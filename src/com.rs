//! Multi-threaded COM apartment backed by `CoInitializeEx`.
//!
//! 基于 `CoInitializeEx` 的多线程 COM apartment。
//!
//! ```no_run
//! use lite_apartment::com::MultiThreaded;
//! use lite_apartment::Shim;
//!
//! let shim = Shim::new(MultiThreaded);
//! let _guard = shim.acquire().expect("COM unavailable");
//! // COM stays loaded in this process until the guard is dropped.
//! ```

use std::ffi::c_void;

use thiserror::Error;
use windows_sys::core::HRESULT;
use windows_sys::Win32::Foundation::S_FALSE;
use windows_sys::Win32::System::Com::{CoInitializeEx, CoUninitialize, COINIT_MULTITHREADED};

use crate::apartment::Apartment;
use crate::error::InitError;

/// A failing `HRESULT` from `CoInitializeEx`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("CoInitializeEx failed with HRESULT {hresult:#010x}")]
pub struct ComError {
    /// The raw status code.
    pub hresult: HRESULT,
}

/// Joins the worker thread to the process's multi-threaded apartment.
#[derive(Debug, Default, Clone, Copy)]
pub struct MultiThreaded;

impl Apartment for MultiThreaded {
    fn initialize(&self) -> Result<(), InitError> {
        // SAFETY: reserved pointer must be null; called on the worker thread
        // that will also call CoUninitialize.
        let hresult = unsafe { CoInitializeEx(std::ptr::null::<c_void>(), COINIT_MULTITHREADED as _) };
        match hresult {
            S_FALSE => Err(InitError::AlreadyInitialized),
            hresult if hresult >= 0 => Ok(()),
            hresult => Err(InitError::other(ComError { hresult })),
        }
    }

    fn uninitialize(&self) {
        // SAFETY: paired with a CoInitializeEx call on this thread.
        unsafe { CoUninitialize() }
    }
}
