//! Error taxonomy.
//!
//! Exhaustion (pool empty, ring full/empty) is never a [`Result`] — it is
//! reported via `Option`/`bool` at the call site, as required throughout
//! this crate. The types here cover only the *invalid argument* and
//! *privilege* kinds, which are worth a caller-visible `Result`.

pub use crate::thread_placement::PlacementError;

/// Errors a [`crate::logger::Logger`] can surface to `init`.
#[derive(Debug, thiserror::Error)]
pub enum LoggerInitError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open log file {path}: {source}")]
    OpenFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
