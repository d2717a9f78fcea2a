//! Multi-producer/multi-consumer ring with ABA-safe CAS-published tickets.
//!
//! Each slot carries its own sequence counter (Vyukov's bounded MPMC queue
//! design); a slot is writable when its sequence equals the producer's
//! ticket and readable when its sequence equals the consumer's ticket plus
//! one. Slots are individually cache-line padded so producers and
//! consumers touching adjacent slots never invalidate each other's line.

use crate::backoff::Backoff;
use crate::cache::CacheAligned;
use crate::invariants::debug_assert_no_wrap;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU64, Ordering};

struct Slot<T> {
    sequence: AtomicU64,
    value: UnsafeCell<MaybeUninit<T>>,
}

/// A bounded MPMC ring of capacity `CAP` (must be a power of two).
pub struct Mpmc<T, const CAP: usize> {
    slots: Box<[CacheAligned<Slot<T>>]>,
    enqueue_pos: CacheAligned<AtomicU64>,
    dequeue_pos: CacheAligned<AtomicU64>,
}

// SAFETY: every slot is guarded by its own sequence counter; a slot's
// value is written only by the producer that won the CAS on
// `enqueue_pos` for that position, and read only by the consumer that won
// the matching CAS on `dequeue_pos`. No two threads ever touch the same
// slot's `UnsafeCell` concurrently.
unsafe impl<T: Send, const CAP: usize> Send for Mpmc<T, CAP> {}
unsafe impl<T: Send, const CAP: usize> Sync for Mpmc<T, CAP> {}

impl<T, const CAP: usize> Mpmc<T, CAP> {
    pub fn new() -> Self {
        assert!(CAP.is_power_of_two() && CAP > 0, "capacity must be a nonzero power of two");
        let slots = (0..CAP)
            .map(|i| {
                CacheAligned::new(Slot {
                    sequence: AtomicU64::new(i as u64),
                    value: UnsafeCell::new(MaybeUninit::uninit()),
                })
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            slots,
            enqueue_pos: CacheAligned::new(AtomicU64::new(0)),
            dequeue_pos: CacheAligned::new(AtomicU64::new(0)),
        }
    }

    const MASK: u64 = (CAP - 1) as u64;

    /// Attempts to enqueue `value`. Returns `false` if the ring is full.
    /// Never blocks; spins with CPU-pause hints under contention.
    pub fn enqueue(&self, value: T) -> bool {
        let mut pos = self.enqueue_pos.load(Ordering::Relaxed);
        let mut backoff = Backoff::new();

        loop {
            let slot = &self.slots[(pos & Self::MASK) as usize];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq as i64 - pos as i64;

            if diff == 0 {
                if self
                    .enqueue_pos
                    .compare_exchange_weak(pos, pos + 1, Ordering::Relaxed, Ordering::Relaxed)
                    .is_ok()
                {
                    debug_assert_no_wrap!("enqueue_pos", pos, pos + 1);
                    // SAFETY: winning this CAS grants exclusive access to
                    // this slot's value cell until sequence is published.
                    unsafe {
                        (*slot.value.get()).write(value);
                    }
                    slot.sequence.store(pos + 1, Ordering::Release);
                    return true;
                }
                pos = self.enqueue_pos.load(Ordering::Relaxed);
            } else if diff < 0 {
                return false;
            } else {
                pos = self.enqueue_pos.load(Ordering::Relaxed);
                backoff.spin();
            }
        }
    }

    /// Attempts to dequeue a value. Returns `None` if the ring is empty.
    /// Never blocks; spins with CPU-pause hints under contention.
    pub fn dequeue(&self) -> Option<T> {
        let mut pos = self.dequeue_pos.load(Ordering::Relaxed);
        let mut backoff = Backoff::new();

        loop {
            let slot = &self.slots[(pos & Self::MASK) as usize];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq as i64 - (pos as i64 + 1);

            if diff == 0 {
                if self
                    .dequeue_pos
                    .compare_exchange_weak(pos, pos + 1, Ordering::Relaxed, Ordering::Relaxed)
                    .is_ok()
                {
                    debug_assert_no_wrap!("dequeue_pos", pos, pos + 1);
                    // SAFETY: winning this CAS grants exclusive access to
                    // this slot's value cell; the producer published it
                    // before advancing sequence past `pos`.
                    let value = unsafe { (*slot.value.get()).assume_init_read() };
                    slot.sequence.store(pos + CAP as u64, Ordering::Release);
                    return Some(value);
                }
                pos = self.dequeue_pos.load(Ordering::Relaxed);
            } else if diff < 0 {
                return None;
            } else {
                pos = self.dequeue_pos.load(Ordering::Relaxed);
                backoff.spin();
            }
        }
    }

    pub const fn capacity(&self) -> usize {
        CAP
    }
}

impl<T, const CAP: usize> Default for Mpmc<T, CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const CAP: usize> Drop for Mpmc<T, CAP> {
    fn drop(&mut self) {
        while self.dequeue().is_some() {}
    }
}
