//! Console hook

use crate::core::error::Result;
use crate::core::hook::Hook;
use crate::core::log_entry::LogEntry;
use crate::core::log_level::{LogLevel, ALL_LEVELS};
use colored::Colorize;

const TIMESTAMP_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Color-capable console sink. Receives every level; the logger's own
/// threshold gates emission. Construction has no failure path.
pub struct ConsoleHook {
    use_colors: bool,
}

impl ConsoleHook {
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn format_text(&self, entry: &LogEntry) -> String {
        let level_str = if self.use_colors {
            format!("{:7}", entry.level.as_str())
                .color(entry.level.color_code())
                .to_string()
        } else {
            format!("{:7}", entry.level.as_str())
        };

        let base = format!(
            "[{}] [{}] {}",
            entry.timestamp.format(TIMESTAMP_LAYOUT),
            level_str,
            entry.message
        );

        if entry.fields.is_empty() {
            base
        } else {
            format!("{} {}", base, entry.fields.format_fields())
        }
    }
}

impl Default for ConsoleHook {
    fn default() -> Self {
        Self::new()
    }
}

impl Hook for ConsoleHook {
    fn levels(&self) -> &[LogLevel] {
        &ALL_LEVELS
    }

    fn fire(&mut self, entry: &LogEntry) -> Result<()> {
        let output = self.format_text(entry);

        // Error and worse route to stderr, the rest to stdout.
        match entry.level {
            LogLevel::Panic | LogLevel::Fatal | LogLevel::Error => eprintln!("{}", output),
            _ => println!("{}", output),
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        use std::io::Write;
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
