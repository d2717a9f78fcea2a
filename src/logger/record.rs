//! Fixed-size log record carried through the logger's ring.

use std::fmt::Write as _;

/// Maximum bytes retained from a formatted message. Longer messages are
/// truncated; truncation is silent, matching the "never blocks, never
/// fails observably" contract of `log`.
pub const MAX_MESSAGE_LEN: usize = 256;
/// Maximum bytes retained from a cached thread-id prefix.
pub const MAX_THREAD_PREFIX_LEN: usize = 24;

/// Severity of a log record, ordered `Debug < Info < Warn < Error < Fatal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }
}

/// A fixed-size record: timestamp, severity, cached thread-id prefix, and a
/// bounded pre-formatted message. Copy/inline so it can live directly in a
/// ring slot without heap allocation.
#[derive(Clone)]
pub struct LogRecord {
    pub timestamp_ns: u64,
    pub level: Level,
    thread_prefix: [u8; MAX_THREAD_PREFIX_LEN],
    thread_prefix_len: u8,
    message: [u8; MAX_MESSAGE_LEN],
    message_len: u16,
}

impl LogRecord {
    pub fn new(timestamp_ns: u64, level: Level, thread_prefix: &str, args: std::fmt::Arguments<'_>) -> Self {
        let mut scratch = String::with_capacity(MAX_MESSAGE_LEN);
        let _ = scratch.write_fmt(args);

        let mut message = [0u8; MAX_MESSAGE_LEN];
        let message_bytes = scratch.as_bytes();
        let message_len = message_bytes.len().min(MAX_MESSAGE_LEN);
        message[..message_len].copy_from_slice(&message_bytes[..message_len]);

        let mut prefix = [0u8; MAX_THREAD_PREFIX_LEN];
        let prefix_bytes = thread_prefix.as_bytes();
        let prefix_len = prefix_bytes.len().min(MAX_THREAD_PREFIX_LEN);
        prefix[..prefix_len].copy_from_slice(&prefix_bytes[..prefix_len]);

        Self {
            timestamp_ns,
            level,
            thread_prefix: prefix,
            thread_prefix_len: prefix_len as u8,
            message,
            message_len: message_len as u16,
        }
    }

    pub fn thread_prefix(&self) -> &str {
        std::str::from_utf8(&self.thread_prefix[..self.thread_prefix_len as usize]).unwrap_or("")
    }

    pub fn message(&self) -> &str {
        std::str::from_utf8(&self.message[..self.message_len as usize]).unwrap_or("")
    }

    /// Formats the record as `<timestamp_ns> <LEVEL> [<thread_id_prefix>] <message>\n`.
    pub fn format_line(&self, out: &mut Vec<u8>) {
        let _ = write!(
            OutAdapter(out),
            "{} {} [{}] {}\n",
            self.timestamp_ns,
            self.level.as_str(),
            self.thread_prefix(),
            self.message()
        );
    }
}

struct OutAdapter<'a>(&'a mut Vec<u8>);

impl std::fmt::Write for OutAdapter<'_> {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.0.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_line_matches_external_interface_layout() {
        let record = LogRecord::new(42, Level::Info, "worker-0", format_args!("hello {}", 1));
        let mut out = Vec::new();
        record.format_line(&mut out);
        assert_eq!(String::from_utf8(out).unwrap(), "42 INFO [worker-0] hello 1\n");
    }

    #[test]
    fn overlong_message_is_truncated_not_panicking() {
        let huge = "x".repeat(MAX_MESSAGE_LEN * 4);
        let record = LogRecord::new(0, Level::Debug, "t", format_args!("{}", huge));
        assert!(record.message().len() <= MAX_MESSAGE_LEN);
    }
}
