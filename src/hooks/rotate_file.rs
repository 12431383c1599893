//! Rotating-file hook, the mandatory local sink

use crate::core::error::{LoggerError, Result};
use crate::core::format::Formatter;
use crate::core::hook::Hook;
use crate::core::log_entry::LogEntry;
use crate::core::log_level::LogLevel;
use crate::rotate::{RotatingWriter, RotationPolicy};
use std::io::Write;
use std::path::PathBuf;

/// Configuration of the file to be rotated: rotation limits, level
/// threshold, and the formatter applied before writing.
pub struct RotateFileConfig {
    pub filename: PathBuf,
    /// Megabytes before the active file rotates.
    pub max_size: u64,
    pub max_backups: usize,
    /// Days before rotated files are pruned; 0 keeps them.
    pub max_age: u64,
    pub level: LogLevel,
    pub formatter: Box<dyn Formatter>,
}

pub struct RotateFileHook {
    level: LogLevel,
    formatter: Box<dyn Formatter>,
    writer: RotatingWriter,
}

impl RotateFileHook {
    /// Construction is argument wiring only and cannot fail; the underlying
    /// file is opened lazily, so errors surface at write time.
    pub fn new(config: RotateFileConfig) -> Self {
        let policy = RotationPolicy::new()
            .with_max_size(config.max_size)
            .with_max_backups(config.max_backups)
            .with_max_age_days(config.max_age);
        Self {
            level: config.level,
            formatter: config.formatter,
            writer: RotatingWriter::new(config.filename, policy),
        }
    }
}

impl Hook for RotateFileHook {
    fn levels(&self) -> &[LogLevel] {
        self.level.enabled_levels()
    }

    fn fire(&mut self, entry: &LogEntry) -> Result<()> {
        let bytes = self.formatter.format(entry)?;
        self.writer.write_all(&bytes).map_err(|e| {
            LoggerError::file_sink(self.writer.path().display().to_string(), e.to_string())
        })?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "rotate_file"
    }
}
