//! Cache-line alignment wrapper.
//!
//! Every cross-thread shared atomic in this crate (pool free-list head, ring
//! cursors, logger ring cursors) is wrapped in [`CacheAligned`] so that two
//! independently-written fields never share a coherence unit.

use std::ops::{Deref, DerefMut};

/// Pads and aligns `T` to its own 64-byte cache line.
///
/// Guarantees `addr_of(inner) % 64 == 0`, and that two adjacent
/// `CacheAligned<T>` fields in any struct land on distinct cache lines
/// regardless of `size_of::<T>()`.
#[repr(C)]
#[repr(align(64))]
pub struct CacheAligned<T> {
    value: T,
}

impl<T> CacheAligned<T> {
    /// Wraps `value`, placing it on its own cache line.
    pub const fn new(value: T) -> Self {
        Self { value }
    }

    /// Unwraps back to the inner value.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for CacheAligned<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for CacheAligned<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for CacheAligned<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheAligned").field("value", &self.value).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, size_of};
    use std::sync::atomic::AtomicU64;

    #[test]
    fn aligned_to_64_bytes() {
        assert_eq!(align_of::<CacheAligned<u8>>(), 64);
        assert_eq!(size_of::<CacheAligned<u8>>(), 64);
    }

    #[test]
    fn adjacent_fields_on_distinct_lines() {
        struct Pair {
            a: CacheAligned<AtomicU64>,
            b: CacheAligned<AtomicU64>,
        }
        let pair = Pair {
            a: CacheAligned::new(AtomicU64::new(0)),
            b: CacheAligned::new(AtomicU64::new(0)),
        };
        let addr_a = std::ptr::addr_of!(pair.a) as usize;
        let addr_b = std::ptr::addr_of!(pair.b) as usize;
        assert_eq!(addr_a % 64, 0);
        assert_eq!(addr_b % 64, 0);
        assert_ne!(addr_a / 64, addr_b / 64);
    }

    #[test]
    fn deref_reaches_inner_value() {
        let wrapped = CacheAligned::new(AtomicU64::new(7));
        assert_eq!(wrapped.load(std::sync::atomic::Ordering::Relaxed), 7);
    }
}
