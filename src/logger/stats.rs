//! Observable logger counters.
//!
//! These are the only way callers learn about dropped records or write
//! failures — the logger never calls back into application code.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct LoggerStats {
    written: AtomicU64,
    dropped: AtomicU64,
    bytes: AtomicU64,
    errors: AtomicU64,
}

impl LoggerStats {
    pub(super) fn record_write(&self, count: u64, bytes: u64) {
        self.written.fetch_add(count, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(super) fn record_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Records successfully written to the output file.
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    /// Records dropped because the ring was full at enqueue time.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Bytes successfully written to the output file.
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    /// Write failures encountered by the writer thread.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// `written + dropped`, which must equal the number of `log` calls
    /// accepted while the logger was `Running`.
    pub fn attempted(&self) -> u64 {
        self.written() + self.dropped()
    }
}
