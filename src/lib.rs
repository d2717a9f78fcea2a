//! Concurrency and memory-management substrate for latency-sensitive
//! trading systems: a pre-allocated object pool, zero-copy SPSC and
//! CAS-published MPMC ring buffers, an asynchronous logger, thread
//! placement/scheduling, and a cache-line alignment wrapper.
//!
//! Every hot-path operation here is lock-free (or wait-free, for the SPSC
//! ring) and allocates nothing after construction. Exchange adapters,
//! order books, and configuration loading are deliberately out of scope —
//! this crate is the substrate those build on.

mod backoff;
pub mod cache;
pub mod error;
pub(crate) mod invariants;
pub mod logger;
pub mod pool;
pub mod ring;
pub mod thread_placement;
pub mod time;

pub use cache::CacheAligned;
pub use error::{LoggerInitError, PlacementError};
pub use logger::{Level, Logger, LoggerConfig, LoggerStats};
pub use pool::{NoZero, Pool, ZeroOnAcquire, ZeroOnRelease, ZeroPolicy};
pub use ring::{Mpmc, Spsc};
pub use thread_placement::{pin, set_realtime, set_thread_name, JoinReceipt, ThreadPlacement, ThreadPool};
pub use time::now_ns;

/// Logs at [`Level::Debug`] through the process-wide logger, if
/// [`logger::init_global`] has been called. No-op otherwise.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if let Some(logger) = $crate::logger::global() {
            logger.log($crate::Level::Debug, format_args!($($arg)*));
        }
    };
}

/// Logs at [`Level::Info`] through the process-wide logger.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if let Some(logger) = $crate::logger::global() {
            logger.log($crate::Level::Info, format_args!($($arg)*));
        }
    };
}

/// Logs at [`Level::Warn`] through the process-wide logger.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if let Some(logger) = $crate::logger::global() {
            logger.log($crate::Level::Warn, format_args!($($arg)*));
        }
    };
}

/// Logs at [`Level::Error`] through the process-wide logger.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if let Some(logger) = $crate::logger::global() {
            logger.log($crate::Level::Error, format_args!($($arg)*));
        }
    };
}

/// Logs at [`Level::Fatal`] through the process-wide logger.
#[macro_export]
macro_rules! log_fatal {
    ($($arg:tt)*) => {
        if let Some(logger) = $crate::logger::global() {
            logger.log($crate::Level::Fatal, format_args!($($arg)*));
        }
    };
}
