//! Logging macros gated by a per-module `ENABLE_LOGS` flag.
//!
//! The tick and rotation workers fire every second or so; each worker module
//! declares its own flag so its chatter can be switched off without touching
//! the global `RUST_LOG` filter:
//!
//! ```ignore
//! const ENABLE_LOGS: bool = false;
//! use crate::log_debug;
//!
//! log_debug!("tick {}", remaining);
//! ```

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}
