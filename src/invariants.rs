//! Debug-only assertion macros for the pool and ring-buffer invariants.
//!
//! Active only under `#[cfg(debug_assertions)]`, so there is zero overhead in
//! release builds. Shared by [`crate::pool`], [`crate::ring::spsc`],
//! [`crate::ring::mpmc`] and the logger's runtime-sized MPMC ring.

/// Asserts that the number of occupied slots never exceeds capacity.
///
/// `0 <= (tail - head) <= capacity` must hold after every commit.
macro_rules! debug_assert_bounded_count {
    ($count:expr, $capacity:expr) => {
        debug_assert!(
            $count <= $capacity,
            "occupied count {} exceeds capacity {}",
            $count,
            $capacity
        )
    };
}

/// Asserts that a consumer cursor never advances past the producer cursor.
macro_rules! debug_assert_head_not_past_tail {
    ($new_head:expr, $tail:expr) => {
        debug_assert!(
            $new_head <= $tail,
            "consumer cursor {} advanced past producer cursor {}",
            $new_head,
            $tail
        )
    };
}

/// Asserts that a cursor only moves forward (wrapping comparisons aside).
macro_rules! debug_assert_monotonic {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new >= $old,
            "{} moved backwards: {} -> {}",
            $name,
            $old,
            $new
        )
    };
}

/// Asserts a u64 sequence counter has not silently wrapped.
///
/// At 10B ops/sec a u64 counter wraps after roughly 58 years; any apparent
/// decrease this large indicates a logic bug rather than real wraparound.
macro_rules! debug_assert_no_wrap {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new > $old || $old.wrapping_sub($new) > (1u64 << 32),
            "{} shows an implausible jump: {} -> {} (delta {})",
            $name,
            $old,
            $new,
            $new.wrapping_sub($old)
        )
    };
}

/// Asserts that a free-list index is within the pool's slot range.
macro_rules! debug_assert_valid_slot_index {
    ($index:expr, $capacity:expr) => {
        debug_assert!(
            $index < $capacity,
            "slot index {} outside pool capacity {}",
            $index,
            $capacity
        )
    };
}

pub(crate) use debug_assert_bounded_count;
pub(crate) use debug_assert_head_not_past_tail;
pub(crate) use debug_assert_monotonic;
pub(crate) use debug_assert_no_wrap;
pub(crate) use debug_assert_valid_slot_index;
