//! Log macros that stay quiet unless the calling module opts in.
//!
//! A module declares `const ENABLE_LOGS: bool` and imports the macros from the
//! crate root:
//! ```rust,ignore
//! const ENABLE_LOGS: bool = true;
//! use crate::{log_info, log_warn};
//!
//! log_warn!("barcode detection timeout; frame skipped");
//! ```
//!
//! The capture loop runs once per frame, so its per-frame chatter goes through
//! `log_debug!` and needs both the flag and `RUST_LOG=debug`.

/// Logs at `$level` when the caller's `ENABLE_LOGS` is set.
#[macro_export]
macro_rules! log_gated {
    ($level:expr, $($arg:tt)*) => {
        if ENABLE_LOGS {
            log::log!($level, $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::log_gated!(log::Level::Debug, $($arg)*) };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::log_gated!(log::Level::Info, $($arg)*) };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::log_gated!(log::Level::Warn, $($arg)*) };
}

/// Persistence failures go through this one; modules that report them keep
/// `ENABLE_LOGS = true`.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::log_gated!(log::Level::Error, $($arg)*) };
}
