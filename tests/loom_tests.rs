//! Loom-based concurrency model checks.
//!
//! Run with: `cargo test --features loom --test loom_tests --release`
//!
//! The crate's production types use `std::sync` atomics directly, which
//! loom cannot intercept, so these tests model the same cursor protocols
//! with loom's atomics over a small, loom-tractable state space.

#![cfg(feature = "loom")]

use loom::cell::UnsafeCell;
use loom::sync::atomic::{AtomicU64, Ordering};
use loom::sync::Arc;
use loom::thread;

struct LoomSpsc {
    write_idx: AtomicU64,
    read_idx: AtomicU64,
    buffer: UnsafeCell<[u64; 4]>,
}

unsafe impl Send for LoomSpsc {}
unsafe impl Sync for LoomSpsc {}

impl LoomSpsc {
    fn new() -> Self {
        Self {
            write_idx: AtomicU64::new(0),
            read_idx: AtomicU64::new(0),
            buffer: UnsafeCell::new([0; 4]),
        }
    }

    fn push(&self, value: u64) -> bool {
        let w = self.write_idx.load(Ordering::Relaxed);
        let r = self.read_idx.load(Ordering::Acquire);
        if w - r >= 4 {
            return false;
        }
        let idx = (w % 4) as usize;
        // SAFETY: single producer; slot at `w` is not yet visible to the
        // consumer until the release store below.
        unsafe {
            self.buffer.with_mut(|p| (*p)[idx] = value);
        }
        self.write_idx.store(w + 1, Ordering::Release);
        true
    }

    fn pop(&self) -> Option<u64> {
        let r = self.read_idx.load(Ordering::Relaxed);
        let w = self.write_idx.load(Ordering::Acquire);
        if r >= w {
            return None;
        }
        let idx = (r % 4) as usize;
        // SAFETY: `r < w` means the producer's release store happened
        // before this acquire load observed it.
        let value = unsafe { self.buffer.with(|p| (*p)[idx]) };
        self.read_idx.store(r + 1, Ordering::Release);
        Some(value)
    }
}

#[test]
fn spsc_single_item_round_trip_has_no_data_race() {
    loom::model(|| {
        let ring = Arc::new(LoomSpsc::new());

        let producer = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                ring.push(7);
            })
        };

        let consumer = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || ring.pop())
        };

        producer.join().unwrap();
        let popped = consumer.join().unwrap();
        // Either the consumer raced ahead of the producer (sees nothing)
        // or it sees exactly the value the producer published — never a
        // torn or out-of-thin-air value.
        assert!(popped.is_none() || popped == Some(7));
    });
}

#[test]
fn spsc_sequential_publish_is_observed_in_order() {
    loom::model(|| {
        let ring = Arc::new(LoomSpsc::new());

        let producer = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                assert!(ring.push(1));
                assert!(ring.push(2));
            })
        };

        let consumer = {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                let mut seen = Vec::new();
                for _ in 0..2 {
                    if let Some(v) = ring.pop() {
                        seen.push(v);
                    }
                }
                seen
            })
        };

        producer.join().unwrap();
        let seen = consumer.join().unwrap();
        // Whatever prefix the consumer managed to observe must be in
        // publish order, never [2] or [2, 1].
        assert!(seen == Vec::<u64>::new() || seen == vec![1] || seen == vec![1, 2]);
    });
}
