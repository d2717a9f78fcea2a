//! Thread placement and a bounded, work-stealing-free thread pool.
//!
//! CPU pinning and real-time priority are POSIX-only; on non-Unix targets
//! both degrade to no-ops that report failure, consistent with
//! "non-fatal for callers that tolerate default scheduling."

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;

/// Failure reported by a placement operation. Never fatal to the caller;
/// the thread continues running with its prior affinity/priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlacementError {
    /// `pin()` could not set the thread's CPU affinity.
    #[error("failed to pin thread to core {core_id} (errno {errno})")]
    PinFailed { core_id: usize, errno: i32 },
    /// `set_realtime()` could not install the requested scheduling policy,
    /// typically for lack of `CAP_SYS_NICE` / root.
    #[error("failed to set real-time priority {priority} (errno {errno})")]
    RealtimeFailed { priority: i32, errno: i32 },
}

/// Pins the calling thread to `core_id`.
///
/// On failure the thread's affinity is left unchanged and the error is
/// returned for the caller to log or ignore.
#[cfg(target_os = "linux")]
pub fn pin(core_id: usize) -> Result<(), PlacementError> {
    // SAFETY: `cpu_set_t` is a POD type; zeroing it is always valid, and
    // `CPU_SET`/`sched_setaffinity` are called with a correctly sized,
    // fully initialized set.
    unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_SET(core_id, &mut set);
        let rc = libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set);
        if rc == 0 {
            Ok(())
        } else {
            Err(PlacementError::PinFailed {
                core_id,
                errno: *libc::__errno_location(),
            })
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub fn pin(core_id: usize) -> Result<(), PlacementError> {
    Err(PlacementError::PinFailed { core_id, errno: 0 })
}

/// Sets the calling thread's scheduling policy to `SCHED_FIFO` with the
/// given real-time priority (1–99). Requires `CAP_SYS_NICE` or root;
/// failure degrades to the default (non-real-time) scheduling policy.
#[cfg(target_os = "linux")]
pub fn set_realtime(priority: i32) -> Result<(), PlacementError> {
    let param = libc::sched_param { sched_priority: priority };
    // SAFETY: `param` is fully initialized and `SCHED_FIFO` is a valid
    // policy constant; the call only affects the calling thread (pid 0).
    let rc = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if rc == 0 {
        Ok(())
    } else {
        Err(PlacementError::RealtimeFailed {
            priority,
            errno: unsafe { *libc::__errno_location() },
        })
    }
}

#[cfg(not(target_os = "linux"))]
pub fn set_realtime(priority: i32) -> Result<(), PlacementError> {
    Err(PlacementError::RealtimeFailed { priority, errno: 0 })
}

/// Sets the calling thread's human-readable name (truncated to 15 bytes on
/// Linux, the `pthread_setname_np` limit).
#[cfg(target_os = "linux")]
pub fn set_thread_name(name: &str) {
    let truncated: String = name.chars().take(15).collect();
    if let Ok(c_name) = std::ffi::CString::new(truncated) {
        // SAFETY: c_name is a valid, NUL-terminated C string for the
        // lifetime of this call; pthread_self() always returns a valid
        // handle for the calling thread.
        unsafe {
            libc::pthread_setname_np(libc::pthread_self(), c_name.as_ptr());
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub fn set_thread_name(_name: &str) {}

/// Placement directive applied when a pool worker starts.
///
/// `logger`, if set via [`with_logger`](Self::with_logger), receives a
/// [`Level::Warn`](crate::logger::Level::Warn) record for any pin/priority
/// failure instead of silently swallowing it — the degrade-to-default
/// behavior itself is unchanged either way.
#[derive(Clone)]
pub struct ThreadPlacement {
    pub core_id: Option<usize>,
    pub realtime_priority: Option<i32>,
    pub name: String,
    logger: Option<Arc<crate::logger::Logger>>,
}

impl std::fmt::Debug for ThreadPlacement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPlacement")
            .field("core_id", &self.core_id)
            .field("realtime_priority", &self.realtime_priority)
            .field("name", &self.name)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl ThreadPlacement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            core_id: None,
            realtime_priority: None,
            name: name.into(),
            logger: None,
        }
    }

    pub fn with_core(mut self, core_id: usize) -> Self {
        self.core_id = Some(core_id);
        self
    }

    pub fn with_realtime_priority(mut self, priority: i32) -> Self {
        self.realtime_priority = Some(priority);
        self
    }

    /// Attaches a logger: pin/priority failures at [`apply_self`](Self::apply_self)
    /// time are reported through it at [`Level::Warn`](crate::logger::Level::Warn)
    /// instead of only being swallowed.
    pub fn with_logger(mut self, logger: Arc<crate::logger::Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Applies the placement to the calling thread. Failures are non-fatal:
    /// the thread continues with default affinity/priority. If a logger was
    /// attached via [`with_logger`](Self::with_logger), failures are
    /// reported through it; otherwise they are silently swallowed, matching
    /// "failure to pin is logged... operation proceeds with defaults."
    pub(crate) fn apply_self(&self) {
        set_thread_name(&self.name);
        if let Some(core_id) = self.core_id {
            if let Err(err) = pin(core_id) {
                self.report(&err);
            }
        }
        if let Some(priority) = self.realtime_priority {
            if let Err(err) = set_realtime(priority) {
                self.report(&err);
            }
        }
    }

    fn report(&self, err: &PlacementError) {
        if let Some(logger) = &self.logger {
            logger.log(crate::logger::Level::Warn, format_args!("{}: {err}", self.name));
        }
    }
}

type Task = Box<dyn FnOnce() + Send + 'static>;

struct SharedState {
    queue: Mutex<VecDeque<Task>>,
    not_empty: Condvar,
    stop: AtomicBool,
}

/// A fixed-size, work-stealing-free thread pool.
///
/// Each worker is pinned at construction and named; `submit` briefly takes
/// an internal lock on the bounded task queue (non-hot-path, per §5) and
/// notifies one idle worker. Workers block on a condition variable while
/// idle; `submit` never blocks on worker availability.
pub struct ThreadPool {
    shared: Arc<SharedState>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    /// Spawns one worker per entry in `placements`, each pinned/named per
    /// its `ThreadPlacement`.
    pub fn new(placements: Vec<ThreadPlacement>) -> Self {
        let shared = Arc::new(SharedState {
            queue: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
            stop: AtomicBool::new(false),
        });

        let workers = placements
            .into_iter()
            .map(|placement| {
                let shared = Arc::clone(&shared);
                std::thread::Builder::new()
                    .name(placement.name.clone())
                    .spawn(move || worker_loop(&shared, &placement))
                    .expect("failed to spawn thread pool worker")
            })
            .collect();

        Self { shared, workers }
    }

    /// Submits a task for execution by whichever worker wakes first.
    ///
    /// Returns a [`JoinReceipt`] the caller can block on to retrieve the
    /// task's return value; dropping the receipt without joining simply
    /// discards the result.
    pub fn submit<F, R>(&self, task: F) -> JoinReceipt<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let receipt = JoinReceipt::new();
        let slot = receipt.slot.clone();

        let boxed: Task = Box::new(move || {
            let result = task();
            let mut guard = slot.result.lock();
            *guard = Some(result);
            slot.ready.notify_one();
        });

        self.shared.queue.lock().push_back(boxed);
        self.shared.not_empty.notify_one();
        receipt
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shared.stop.store(true, Ordering::Release);
        self.shared.not_empty.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(shared: &Arc<SharedState>, placement: &ThreadPlacement) {
    placement.apply_self();

    loop {
        let task = {
            let mut queue = shared.queue.lock();
            loop {
                if shared.stop.load(Ordering::Acquire) {
                    break None;
                }
                if let Some(task) = queue.pop_front() {
                    break Some(task);
                }
                shared.not_empty.wait(&mut queue);
            }
        };

        match task {
            Some(task) => task(),
            None => return,
        }
    }
}

struct ReceiptSlot<R> {
    result: Mutex<Option<R>>,
    ready: Condvar,
}

/// A handle to a task's eventual result, returned by [`ThreadPool::submit`].
pub struct JoinReceipt<R> {
    slot: Arc<ReceiptSlot<R>>,
}

impl<R> JoinReceipt<R> {
    fn new() -> Self {
        Self {
            slot: Arc::new(ReceiptSlot {
                result: Mutex::new(None),
                ready: Condvar::new(),
            }),
        }
    }

    /// Blocks until the submitted task completes and returns its result.
    pub fn join(self) -> R {
        let mut guard = self.slot.result.lock();
        loop {
            if let Some(result) = guard.take() {
                return result;
            }
            self.slot.ready.wait(&mut guard);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[test]
    fn submit_and_join_returns_result() {
        let pool = ThreadPool::new(vec![ThreadPlacement::new("worker-0")]);
        let receipt = pool.submit(|| 2 + 2);
        assert_eq!(receipt.join(), 4);
    }

    #[test]
    fn multiple_workers_drain_queue() {
        let pool = ThreadPool::new(vec![
            ThreadPlacement::new("worker-0"),
            ThreadPlacement::new("worker-1"),
        ]);
        let counter = Arc::new(AtomicUsize::new(0));
        let receipts: Vec<_> = (0..100)
            .map(|_| {
                let counter = Arc::clone(&counter);
                pool.submit(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();
        for receipt in receipts {
            receipt.join();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn drop_stops_workers_without_draining_further_submits() {
        let pool = ThreadPool::new(vec![ThreadPlacement::new("worker-0")]);
        let receipt = pool.submit(|| 1);
        assert_eq!(receipt.join(), 1);
        drop(pool);
    }

    #[test]
    fn drop_abandons_queued_but_unstarted_tasks() {
        use std::sync::mpsc;
        use std::time::Duration;

        let pool = ThreadPool::new(vec![ThreadPlacement::new("worker-0")]);
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let (started_tx, started_rx) = mpsc::channel::<()>();

        // Occupies the pool's only worker until released, so the tasks
        // submitted below remain queued (never popped) while it runs.
        let _in_flight = pool.submit(move || {
            started_tx.send(()).unwrap();
            release_rx.recv().unwrap();
        });
        started_rx.recv().unwrap();

        let counter = Arc::new(AtomicUsize::new(0));
        let _queued: Vec<_> = (0..10)
            .map(|_| {
                let counter = Arc::clone(&counter);
                pool.submit(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        // Releases the in-flight task only after `drop` below has already
        // observed the queue and set the stop flag, so the worker's next
        // poll sees `stop` before it sees the backlog.
        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            let _ = release_tx.send(());
        });

        drop(pool);
        releaser.join().unwrap();

        assert_eq!(
            counter.load(Ordering::SeqCst),
            0,
            "queued tasks must be abandoned on drop, not executed"
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn pin_to_current_core_succeeds_or_reports_failure() {
        // Core 0 exists on every Linux host; either this succeeds or we get
        // a well-formed error, never a panic.
        let _ = pin(0);
    }

    #[test]
    fn pin_failure_with_attached_logger_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("placement.log");
        let logger = Arc::new(crate::logger::Logger::init(&path, crate::logger::LoggerConfig::default()).unwrap());

        // No core with this id exists on any real host; `pin` must fail,
        // and `apply_self` must still return rather than panic.
        let placement = ThreadPlacement::new("bogus-worker")
            .with_core(usize::MAX / 2)
            .with_logger(Arc::clone(&logger));
        placement.apply_self();

        logger.shutdown();
        assert!(logger.stats().written() >= 1 || logger.stats().attempted() >= 1);
    }
}
