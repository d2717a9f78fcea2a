//! The logger's dedicated writer thread: batched, vectored I/O.

use super::config::LoggerConfig;
use super::record::LogRecord;
use super::ring::RuntimeMpmc;
use super::stats::LoggerStats;
use crate::thread_placement::ThreadPlacement;
use std::fs::File;
use std::io::{IoSlice, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

pub(super) fn spawn(
    ring: Arc<RuntimeMpmc<LogRecord>>,
    stats: Arc<LoggerStats>,
    mut file: File,
    config: LoggerConfig,
    shutdown: Arc<AtomicBool>,
) -> JoinHandle<()> {
    let placement = {
        let mut p = ThreadPlacement::new("logger-writer");
        if config.writer_cpu >= 0 {
            p = p.with_core(config.writer_cpu as usize);
        }
        p
    };

    std::thread::Builder::new()
        .name("logger-writer".to_string())
        .spawn(move || {
            placement.apply_self();
            run(&ring, &stats, &mut file, &config, &shutdown);
        })
        .expect("failed to spawn logger writer thread")
}

fn run(
    ring: &RuntimeMpmc<LogRecord>,
    stats: &LoggerStats,
    file: &mut File,
    config: &LoggerConfig,
    shutdown: &AtomicBool,
) {
    let flush_interval = Duration::from_millis(config.flush_ms.max(1));
    let idle_lock = parking_lot::Mutex::new(());
    let idle_cv = parking_lot::Condvar::new();

    loop {
        let mut spins = 0u32;
        while ring.is_empty() && spins < config.spin_before_wait {
            std::hint::spin_loop();
            spins += 1;
        }

        if ring.is_empty() {
            if shutdown.load(Ordering::Acquire) {
                break;
            }
            let mut guard = idle_lock.lock();
            idle_cv.wait_for(&mut guard, flush_interval);
            continue;
        }

        let mut batch = Vec::with_capacity(config.batch_size);
        while batch.len() < config.batch_size {
            match ring.dequeue() {
                Some(record) => batch.push(record),
                None => break,
            }
        }

        if !batch.is_empty() {
            write_batch(file, &batch, stats);
        }
    }

    // Drain anything still pending (producers may have enqueued between
    // the shutdown check and the break above).
    loop {
        let mut batch = Vec::with_capacity(config.batch_size);
        while batch.len() < config.batch_size {
            match ring.dequeue() {
                Some(record) => batch.push(record),
                None => break,
            }
        }
        if batch.is_empty() {
            break;
        }
        write_batch(file, &batch, stats);
    }
}

fn write_batch(file: &mut File, records: &[LogRecord], stats: &LoggerStats) {
    let mut lines: Vec<Vec<u8>> = Vec::with_capacity(records.len());
    for record in records {
        let mut line = Vec::new();
        record.format_line(&mut line);
        lines.push(line);
    }
    let expected_total: usize = lines.iter().map(Vec::len).sum();

    let slices: Vec<IoSlice<'_>> = lines.iter().map(|line| IoSlice::new(line)).collect();
    match file.write_vectored(&slices) {
        Ok(written) if written == expected_total => {
            stats.record_write(records.len() as u64, written as u64);
        }
        // Short write: the kernel accepted a prefix of the batch. Resume
        // from the first unwritten byte instead of re-emitting lines
        // already on disk, which would duplicate them.
        Ok(written) => write_remainder(file, &lines, written, stats),
        // Vectored write unsupported on this platform/fd; fall back to
        // sequential writes from the start of the batch.
        Err(_) => write_remainder(file, &lines, 0, stats),
    }
}

/// Writes `lines` sequentially, skipping the first `already_written` bytes
/// already persisted by a preceding short vectored write. Tolerates the
/// file descriptor having gone bad mid-batch.
fn write_remainder(file: &mut File, lines: &[Vec<u8>], already_written: usize, stats: &LoggerStats) {
    let mut skip = already_written;
    let mut total_written = already_written as u64;
    let mut io_failed = false;

    for line in lines {
        if skip >= line.len() {
            skip -= line.len();
            continue;
        }
        let remainder = &line[skip..];
        skip = 0;
        match file.write_all(remainder) {
            Ok(()) => total_written += remainder.len() as u64,
            Err(_) => {
                io_failed = true;
                break;
            }
        }
    }

    if io_failed {
        stats.record_error();
    } else {
        stats.record_write(lines.len() as u64, total_written);
    }
}
