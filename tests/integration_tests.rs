//! Cross-thread integration scenarios exercising the pool, both ring
//! variants, and the logger together, the way a consumer of this crate
//! would combine them.

use hft_core::pool::{NoZero, Pool};
use hft_core::ring::{Mpmc, Spsc};
use hft_core::thread_placement::{ThreadPlacement, ThreadPool};
use hft_core::{Level, Logger, LoggerConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn pool_feeds_spsc_ring_end_to_end() {
    let pool: Arc<Pool<[u64; 8], 256, NoZero>> = Arc::new(Pool::new());
    // Ring slots carry the pool slot's address as a `usize`: raw pointers
    // are not `Send`, and the pool itself already guarantees exclusive
    // access to whichever thread currently holds a given slot.
    let ring: Arc<Spsc<usize, 1024>> = Arc::new(Spsc::new());

    let producer = {
        let pool = Arc::clone(&pool);
        let ring = Arc::clone(&ring);
        thread::spawn(move || {
            for i in 0..5_000u64 {
                loop {
                    if let Some(slot) = pool.acquire() {
                        unsafe {
                            (*slot)[0] = i;
                        }
                        loop {
                            if let Some(ring_slot) = ring.producer_slot() {
                                *ring_slot = slot as usize;
                                ring.publish();
                                break;
                            }
                            thread::yield_now();
                        }
                        break;
                    }
                    thread::yield_now();
                }
            }
        })
    };

    let consumer = {
        let pool = Arc::clone(&pool);
        let ring = Arc::clone(&ring);
        thread::spawn(move || {
            let mut sum = 0u64;
            let mut received = 0u64;
            while received < 5_000 {
                if let Some(slot_ref) = ring.consumer_slot() {
                    let ptr = *slot_ref as *mut [u64; 8];
                    sum += unsafe { (*ptr)[0] };
                    ring.consume();
                    pool.release(ptr);
                    received += 1;
                } else {
                    thread::yield_now();
                }
            }
            sum
        })
    };

    producer.join().unwrap();
    let sum = consumer.join().unwrap();
    assert_eq!(sum, (0..5_000u64).sum::<u64>());
    assert_eq!(pool.allocated_count(), 0);
}

#[test]
fn thread_pool_fans_out_work_onto_an_mpmc_ring() {
    let ring: Arc<Mpmc<u64, 1024>> = Arc::new(Mpmc::new());
    let pool = ThreadPool::new(vec![
        ThreadPlacement::new("pool-0"),
        ThreadPlacement::new("pool-1"),
        ThreadPlacement::new("pool-2"),
        ThreadPlacement::new("pool-3"),
    ]);

    let receipts: Vec<_> = (0..1000u64)
        .map(|i| {
            let ring = Arc::clone(&ring);
            pool.submit(move || {
                while !ring.enqueue(i) {
                    thread::yield_now();
                }
            })
        })
        .collect();
    for r in receipts {
        r.join();
    }

    let mut seen = Vec::new();
    while let Some(v) = ring.dequeue() {
        seen.push(v);
    }
    seen.sort_unstable();
    assert_eq!(seen, (0..1000u64).collect::<Vec<_>>());
}

#[test]
fn logger_and_pool_share_a_running_system() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("combined.log");
    let logger = Arc::new(Logger::init(&path, LoggerConfig::default()).unwrap());
    let pool: Arc<Pool<u64, 64>> = Arc::new(Pool::new());
    let total_dropped = Arc::new(AtomicU64::new(0));

    let handles: Vec<_> = (0..4)
        .map(|tid| {
            let logger = Arc::clone(&logger);
            let pool = Arc::clone(&pool);
            let total_dropped = Arc::clone(&total_dropped);
            thread::spawn(move || {
                for i in 0..200 {
                    if let Some(slot) = pool.acquire() {
                        unsafe {
                            *slot = i;
                        }
                        pool.release(slot);
                    }
                    logger.log(Level::Info, format_args!("thread {tid} iter {i}"));
                }
                total_dropped.fetch_add(0, Ordering::Relaxed);
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    logger.shutdown();
    assert_eq!(pool.allocated_count(), 0);
    assert_eq!(logger.stats().attempted(), 800);
}
