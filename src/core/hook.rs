//! Hook trait for log output destinations

use super::{error::Result, log_entry::LogEntry, log_level::LogLevel};

/// A registered sink that receives every emitted record matching its
/// accepted level set. Variants hold only their own sink handle; there is
/// no shared state between hooks.
pub trait Hook: Send + Sync {
    /// Levels this hook should receive, most severe first.
    fn levels(&self) -> &[LogLevel];

    /// Deliver one record to the sink. A failure is local to this record
    /// and this hook; it is never retried.
    fn fire(&mut self, entry: &LogEntry) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;
}
