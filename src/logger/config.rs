//! Logger configuration, read from an external key-value map.
//!
//! The map itself is populated by an out-of-scope loader (file, env,
//! whatever); this module only knows how to interpret the keys it cares
//! about and silently ignores everything else.

use std::collections::HashMap;

/// Tuning knobs for [`super::Logger::init`]. Defaults are chosen for
/// interactive/development use; production deployments should set all of
/// these explicitly via [`LoggerConfig::from_map`].
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Ring capacity in records; rounded up to the next power of two.
    pub queue_capacity: usize,
    /// Max records drained per writer iteration before flushing.
    pub batch_size: usize,
    /// CPU-pause iterations before the writer blocks on a condition.
    pub spin_before_wait: u32,
    /// Upper bound, in milliseconds, between flushes regardless of fill.
    pub flush_ms: u64,
    /// Core id to pin the writer thread to; `-1` disables pinning.
    pub writer_cpu: i32,
    /// Test-only synchronous fast path. Never safe in production: `log`
    /// writes directly instead of enqueuing, defeating the async design.
    pub test_fastpath: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 16384,
            batch_size: 256,
            spin_before_wait: 1000,
            flush_ms: 10,
            writer_cpu: -1,
            test_fastpath: false,
        }
    }
}

impl LoggerConfig {
    /// Builds a config from recognized keys, falling back to defaults for
    /// anything missing or unparsable. Unknown keys are ignored.
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = map.get("queue_capacity").and_then(|s| s.parse().ok()) {
            config.queue_capacity = v;
        }
        if let Some(v) = map.get("batch_size").and_then(|s| s.parse().ok()) {
            config.batch_size = v;
        }
        if let Some(v) = map.get("spin_before_wait").and_then(|s| s.parse().ok()) {
            config.spin_before_wait = v;
        }
        if let Some(v) = map.get("flush_ms").and_then(|s| s.parse().ok()) {
            config.flush_ms = v;
        }
        if let Some(v) = map.get("writer_cpu").and_then(|s| s.parse().ok()) {
            config.writer_cpu = v;
        }
        if let Some(v) = map.get("test_fastpath").and_then(|s| s.parse().ok()) {
            config.test_fastpath = v;
        }

        config
    }

    pub(crate) fn queue_capacity_pow2(&self) -> usize {
        self.queue_capacity.next_power_of_two().max(2)
    }
}
