//! Log-shipping hook
//!
//! Forwards every record as one newline-delimited JSON document over a
//! persistent TCP connection to a log-aggregation endpoint. Shipping is
//! synchronous and best-effort: a failed write is surfaced, not retried.

use crate::core::error::{LoggerError, Result};
use crate::core::format::{Formatter, JsonFormatter};
use crate::core::hook::Hook;
use crate::core::log_entry::LogEntry;
use crate::core::log_level::{LogLevel, ALL_LEVELS};
use std::io::Write;
use std::net::TcpStream;
use std::time::Duration;

const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct LogstashHook {
    stream: TcpStream,
    formatter: JsonFormatter,
    service_name: String,
}

impl LogstashHook {
    /// Fails when the address is empty or the connection cannot be
    /// established. Assembly treats either as a recoverable warning.
    pub fn connect(address: &str, service_name: &str) -> Result<Self> {
        if address.is_empty() {
            return Err(LoggerError::EmptyAddress { hook: "logstash" });
        }

        let stream = TcpStream::connect(address)
            .map_err(|e| LoggerError::hook_build("logstash", e.to_string()))?;
        stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
        stream.set_nodelay(true)?;

        Ok(Self {
            stream,
            formatter: JsonFormatter::default(),
            service_name: service_name.to_string(),
        })
    }
}

impl Hook for LogstashHook {
    fn levels(&self) -> &[LogLevel] {
        &ALL_LEVELS
    }

    fn fire(&mut self, entry: &LogEntry) -> Result<()> {
        // Tag shipped records with the owning service.
        let tagged;
        let entry = if self.service_name.is_empty() {
            entry
        } else {
            tagged = entry
                .clone()
                .with_field("service_name", self.service_name.as_str());
            &tagged
        };

        let bytes = self.formatter.format(entry)?;
        self.stream.write_all(&bytes)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.stream.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "logstash"
    }
}
