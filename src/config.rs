//! Worker thread configuration.
//!
//! [`ShimConfig`] controls how the dedicated worker thread is created. The
//! defaults are fine for most processes; override them when the thread name
//! should show up in a debugger or when the apartment's `initialize` needs a
//! larger stack.
//!
//! # Example
//! ```
//! use lite_apartment::ShimConfig;
//!
//! let mut cfg = ShimConfig::default();
//! cfg.thread_name = "com-keepalive".to_string();
//! cfg.stack_size = Some(256 * 1024);
//!
//! assert_eq!(cfg.thread_name, "com-keepalive");
//! ```

/// Default name given to worker threads.
pub const DEFAULT_THREAD_NAME: &str = "lite-apartment";

/// Configuration for the shim's worker thread.
///
/// shim 工作线程的配置。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShimConfig {
    /// Name assigned to every worker thread.
    pub thread_name: String,
    /// Worker stack size in bytes (`None` = platform default).
    pub stack_size: Option<usize>,
}

impl Default for ShimConfig {
    /// Provides a default configuration:
    /// - `thread_name = "lite-apartment"`
    /// - `stack_size = None`
    fn default() -> Self {
        Self {
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            stack_size: None,
        }
    }
}

impl ShimConfig {
    /// Set the worker thread name.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set the worker stack size in bytes.
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }
}
