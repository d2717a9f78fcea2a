//! Nanosecond-precision time source.
//!
//! `now_ns()` is non-decreasing across calls on the same thread, never
//! suspends, and never fails. On `x86_64` it reads the CPU cycle counter
//! (`rdtsc`) and converts to nanoseconds using a ratio calibrated once
//! against [`std::time::Instant`] at first use; on other architectures it
//! falls back directly to `Instant`, which is still cheaper than a raw
//! syscall on every supported host.
//!
//! Calibration happens lazily on first call from any thread (a `OnceLock`
//! guards the one-time measurement), so steady-state reads never pay for
//! it and never touch the kernel.

use std::sync::OnceLock;
use std::time::Instant;

struct Calibration {
    epoch_instant: Instant,
    epoch_tsc: u64,
    ns_per_cycle: f64,
}

static CALIBRATION: OnceLock<Calibration> = OnceLock::new();

/// Length of the busy-spin calibration window, in microseconds.
#[cfg(target_arch = "x86_64")]
const CALIBRATION_WINDOW_US: u64 = 200;

/// Returns a monotonically non-decreasing nanosecond count since an
/// arbitrary (process-local) epoch.
///
/// Suitable as a total-order tiebreaker within a single process on a single
/// socket. Cross-socket ordering is not guaranteed: the TSC is not
/// synchronized across sockets on all platforms.
#[inline]
pub fn now_ns() -> u64 {
    let cal = CALIBRATION.get_or_init(calibrate);

    #[cfg(target_arch = "x86_64")]
    {
        let delta_cycles = read_tsc().wrapping_sub(cal.epoch_tsc) as f64;
        (delta_cycles * cal.ns_per_cycle) as u64
    }

    #[cfg(not(target_arch = "x86_64"))]
    {
        cal.epoch_instant.elapsed().as_nanos() as u64
    }
}

#[cfg(target_arch = "x86_64")]
#[inline(always)]
fn read_tsc() -> u64 {
    // SAFETY: `_rdtsc` is available on all x86_64 targets unconditionally;
    // it has no preconditions beyond the target_arch check above.
    unsafe { std::arch::x86_64::_rdtsc() }
}

fn calibrate() -> Calibration {
    #[cfg(target_arch = "x86_64")]
    {
        let start_instant = Instant::now();
        let start_tsc = read_tsc();

        // Busy-spin a short, fixed window so the ratio is derived from the
        // same conditions (turbo/frequency state) steady-state reads run
        // under; a few hundred microseconds is enough for a stable ratio
        // without meaningfully delaying startup.
        while start_instant.elapsed().as_micros() < u128::from(CALIBRATION_WINDOW_US) {
            std::hint::spin_loop();
        }

        let end_instant = Instant::now();
        let end_tsc = read_tsc();

        let elapsed_ns = end_instant.saturating_duration_since(start_instant).as_nanos() as f64;
        let elapsed_cycles = end_tsc.wrapping_sub(start_tsc) as f64;
        let ns_per_cycle = if elapsed_cycles > 0.0 {
            elapsed_ns / elapsed_cycles
        } else {
            1.0
        };

        Calibration {
            epoch_instant: start_instant,
            epoch_tsc: start_tsc,
            ns_per_cycle,
        }
    }

    #[cfg(not(target_arch = "x86_64"))]
    {
        Calibration {
            epoch_instant: Instant::now(),
            epoch_tsc: 0,
            ns_per_cycle: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_across_calls() {
        let mut last = now_ns();
        for _ in 0..10_000 {
            let next = now_ns();
            assert!(next >= last, "now_ns() went backwards: {} -> {}", last, next);
            last = next;
        }
    }

    #[test]
    fn roughly_tracks_wall_clock() {
        let start = now_ns();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let end = now_ns();
        let delta_ms = (end - start) / 1_000_000;
        // Generous bounds: calibration error should not be off by an order
        // of magnitude on any supported CI host.
        assert!(delta_ms >= 5, "delta too small: {delta_ms}ms");
        assert!(delta_ms <= 100, "delta too large: {delta_ms}ms");
    }
}
