//! Runtime-capacity MPMC ring backing the logger.
//!
//! Identical protocol to [`crate::ring::mpmc::Mpmc`], but sized at
//! construction from [`super::config::LoggerConfig`] rather than fixed by
//! a const generic — the logger's capacity is a deployment knob read from
//! an external config map, not known at compile time.

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

pub struct RuntimeMpmc<T> {
    slots: Box<[CacheAligned<Slot<T>>]>,
    mask: u64,
    enqueue_pos: CacheAligned<AtomicU64>,
    dequeue_pos: CacheAligned<AtomicU64>,
}

// SAFETY: same slot-sequence discipline as `crate::ring::mpmc::Mpmc`.
unsafe impl<T: Send> Send for RuntimeMpmc<T> {}
unsafe impl<T: Send> Sync for RuntimeMpmc<T> {}

impl<T> RuntimeMpmc<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity.is_power_of_two() && capacity > 0);
        let slots = (0..capacity)
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
            mask: (capacity - 1) as u64,
            enqueue_pos: CacheAligned::new(AtomicU64::new(0)),
            dequeue_pos: CacheAligned::new(AtomicU64::new(0)),
        }
    }

    pub fn enqueue(&self, value: T) -> bool {
        let mut pos = self.enqueue_pos.load(Ordering::Relaxed);
        let mut backoff = Backoff::new();
        loop {
            let slot = &self.slots[(pos & self.mask) as usize];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq as i64 - pos as i64;
            if diff == 0 {
                if self
                    .enqueue_pos
                    .compare_exchange_weak(pos, pos + 1, Ordering::Relaxed, Ordering::Relaxed)
                    .is_ok()
                {
                    debug_assert_no_wrap!("enqueue_pos", pos, pos + 1);
                    // SAFETY: winning the CAS grants exclusive access until
                    // sequence publication below.
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

    pub fn dequeue(&self) -> Option<T> {
        let mut pos = self.dequeue_pos.load(Ordering::Relaxed);
        let mut backoff = Backoff::new();
        loop {
            let slot = &self.slots[(pos & self.mask) as usize];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq as i64 - (pos as i64 + 1);
            if diff == 0 {
                if self
                    .dequeue_pos
                    .compare_exchange_weak(pos, pos + 1, Ordering::Relaxed, Ordering::Relaxed)
                    .is_ok()
                {
                    debug_assert_no_wrap!("dequeue_pos", pos, pos + 1);
                    // SAFETY: winning the CAS grants exclusive access; the
                    // producer published before advancing sequence.
                    let value = unsafe { (*slot.value.get()).assume_init_read() };
                    slot.sequence.store(pos + self.slots.len() as u64, Ordering::Release);
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

    pub fn is_empty(&self) -> bool {
        self.dequeue_pos.load(Ordering::Acquire) == self.enqueue_pos.load(Ordering::Acquire)
    }
}

impl<T> Drop for RuntimeMpmc<T> {
    fn drop(&mut self) {
        while self.dequeue().is_some() {}
    }
}
