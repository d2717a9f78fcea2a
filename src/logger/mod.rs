//! Asynchronous logger: lock-free producer-side enqueue, dedicated writer
//! thread, batched vectored I/O.
//!
//! A [`Logger`] is a process-scoped resource with explicit `init`/`shutdown`
//! rather than a hidden global: construct one, share it via `Arc` (or use
//! [`init_global`]/[`global`] for the common single-instance case), and
//! call [`Logger::shutdown`] before the process exits to drain pending
//! records.

mod config;
mod record;
mod ring;
mod stats;
mod writer;

pub use config::LoggerConfig;
pub use record::{Level, LogRecord};
pub use stats::LoggerStats;

use crate::error::LoggerInitError;
use ring::RuntimeMpmc;
use std::cell::RefCell;
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::JoinHandle;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Before `Logger::init` returns a value, there is no `Logger` to hold
/// this state at all; it exists only for documentation of the full state
/// machine `Uninitialized -> Running -> Drained -> Closed`.
#[allow(dead_code)]
const STATE_UNINITIALIZED: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_DRAINED: u8 = 2;
const STATE_CLOSED: u8 = 3;

thread_local! {
    static THREAD_PREFIX: RefCell<Option<String>> = const { RefCell::new(None) };
}

fn cached_thread_prefix() -> String {
    THREAD_PREFIX.with(|cell| {
        let mut cell = cell.borrow_mut();
        if let Some(prefix) = cell.as_ref() {
            return prefix.clone();
        }
        let prefix = std::thread::current()
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{:?}", std::thread::current().id()));
        *cell = Some(prefix.clone());
        prefix
    })
}

/// The async logger. Cheap to share via `Arc`; every method takes `&self`.
pub struct Logger {
    state: AtomicU8,
    ring: Option<Arc<RuntimeMpmc<LogRecord>>>,
    stats: Arc<LoggerStats>,
    shutdown_flag: Arc<AtomicBool>,
    writer_handle: parking_lot::Mutex<Option<JoinHandle<()>>>,
    fastpath_file: Option<parking_lot::Mutex<File>>,
}

impl Logger {
    /// Opens `file_path` (creating parent directories with mode `0755` and
    /// the file with mode `0644` if absent), allocates the ring, and
    /// starts the writer thread. Intended to be called once per process.
    pub fn init(file_path: impl AsRef<Path>, config: LoggerConfig) -> Result<Self, LoggerInitError> {
        let file_path = file_path.as_ref();

        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| LoggerInitError::CreateDir {
                    path: parent.display().to_string(),
                    source,
                })?;
                #[cfg(unix)]
                {
                    if let Ok(metadata) = fs::metadata(parent) {
                        let mut perms = metadata.permissions();
                        perms.set_mode(0o755);
                        let _ = fs::set_permissions(parent, perms);
                    }
                }
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)
            .map_err(|source| LoggerInitError::OpenFile {
                path: file_path.display().to_string(),
                source,
            })?;

        #[cfg(unix)]
        {
            if let Ok(metadata) = file.metadata() {
                let mut perms = metadata.permissions();
                perms.set_mode(0o644);
                let _ = file.set_permissions(perms);
            }
        }

        let stats = Arc::new(LoggerStats::default());
        let shutdown_flag = Arc::new(AtomicBool::new(false));

        if config.test_fastpath {
            return Ok(Self {
                state: AtomicU8::new(STATE_RUNNING),
                ring: None,
                stats,
                shutdown_flag,
                writer_handle: parking_lot::Mutex::new(None),
                fastpath_file: Some(parking_lot::Mutex::new(file)),
            });
        }

        let ring = Arc::new(RuntimeMpmc::new(config.queue_capacity_pow2()));
        let handle = writer::spawn(
            Arc::clone(&ring),
            Arc::clone(&stats),
            file,
            config,
            Arc::clone(&shutdown_flag),
        );

        Ok(Self {
            state: AtomicU8::new(STATE_RUNNING),
            ring: Some(ring),
            stats,
            shutdown_flag,
            writer_handle: parking_lot::Mutex::new(Some(handle)),
            fastpath_file: None,
        })
    }

    /// Formats `args` and enqueues a record. Never blocks, never fails
    /// observably; if the ring is full the record is dropped and the
    /// dropped counter is incremented. No-op outside the `Running` state.
    pub fn log(&self, level: Level, args: std::fmt::Arguments<'_>) {
        if self.state.load(Ordering::Acquire) != STATE_RUNNING {
            return;
        }

        let timestamp_ns = crate::time::now_ns();
        let prefix = cached_thread_prefix();

        if let Some(fastpath) = &self.fastpath_file {
            use std::io::Write;
            let record = LogRecord::new(timestamp_ns, level, &prefix, args);
            let mut line = Vec::new();
            record.format_line(&mut line);
            let mut file = fastpath.lock();
            if file.write_all(&line).is_ok() {
                self.stats.record_write(1, line.len() as u64);
            } else {
                self.stats.record_error();
            }
            return;
        }

        let record = LogRecord::new(timestamp_ns, level, &prefix, args);
        if let Some(ring) = &self.ring {
            if !ring.enqueue(record) {
                self.stats.record_drop();
            }
        }
    }

    /// Read-only access to the logger's counters.
    pub fn stats(&self) -> &LoggerStats {
        &self.stats
    }

    /// Signals the writer thread to drain remaining records and exit,
    /// then joins it. Idempotent.
    pub fn shutdown(&self) {
        if self
            .state
            .compare_exchange(STATE_RUNNING, STATE_DRAINED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        self.shutdown_flag.store(true, Ordering::Release);
        if let Some(handle) = self.writer_handle.lock().take() {
            let _ = handle.join();
        }

        self.state.store(STATE_CLOSED, Ordering::Release);
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.shutdown();
    }
}

static GLOBAL_LOGGER: OnceLock<Arc<Logger>> = OnceLock::new();

/// Initializes the process-wide logger. Returns the existing instance
/// (ignoring `file_path`/`config`) if one was already installed.
pub fn init_global(file_path: impl AsRef<Path>, config: LoggerConfig) -> Result<Arc<Logger>, LoggerInitError> {
    if let Some(existing) = GLOBAL_LOGGER.get() {
        return Ok(Arc::clone(existing));
    }
    let logger = Arc::new(Logger::init(file_path, config)?);
    Ok(Arc::clone(GLOBAL_LOGGER.get_or_init(|| logger)))
}

/// Returns the process-wide logger, if [`init_global`] has been called.
pub fn global() -> Option<Arc<Logger>> {
    GLOBAL_LOGGER.get().cloned()
}
