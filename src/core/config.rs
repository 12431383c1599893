//! Logger configuration model
//!
//! `LoggerConfig` is an immutable snapshot supplied once at startup,
//! commonly deserialized from a JSON config file. It is read-only input;
//! the assembled logger owns its hooks and is never reconfigured.

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

fn default_max_size() -> u64 {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggerConfig {
    /// Path of the primary log file. The only fatal misconfiguration:
    /// assembly refuses an empty filename.
    pub filename: String,

    /// Maximum size of the active file in megabytes before rotation.
    #[serde(default = "default_max_size")]
    pub max_size: u64,

    /// Rotated files to retain; 0 keeps all.
    #[serde(default)]
    pub max_backups: usize,

    /// Maximum age of rotated files in days; 0 disables age pruning.
    #[serde(default)]
    pub max_age: u64,

    /// Active level threshold, integer ordinal 0-6.
    #[serde(default)]
    pub level: LogLevel,

    /// Indent JSON written to the file sink.
    #[serde(default)]
    pub pretty_print: bool,

    /// Also emit to a color-capable console sink.
    #[serde(default)]
    pub std_out: bool,

    #[serde(default)]
    pub use_elastic: bool,

    #[serde(default)]
    pub elastic_config: Option<ElasticConfig>,

    #[serde(default)]
    pub use_log_stash: bool,

    #[serde(default)]
    pub logstash_config: Option<LogstashConfig>,

    /// Reserved for additional destinations.
    #[serde(default)]
    pub use_others: bool,

    /// Free-form tags for shipped records; `service_name` is expected when
    /// remote hooks are enabled.
    #[serde(default)]
    pub name_fields: HashMap<String, String>,
}

impl LoggerConfig {
    /// Service name used to tag records shipped to remote sinks; empty
    /// when not configured.
    pub fn service_name(&self) -> String {
        self.name_fields
            .get("service_name")
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElasticConfig {
    pub address: String,
    /// Handshake timeout as a duration string, e.g. `"30s"`.
    pub time_out: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogstashConfig {
    pub address: String,
}

/// Parse a duration string of the form `"300ms"`, `"30s"`, `"1m30s"`,
/// `"2h"`. Units: `ns`, `us`, `ms`, `s`, `m`, `h`; decimal fractions are
/// accepted. Zero is the one value allowed without a unit.
pub fn parse_duration(input: &str) -> Result<Duration> {
    const UNITS: [(&str, f64); 7] = [
        ("ns", 1e-9),
        ("us", 1e-6),
        ("\u{b5}s", 1e-6),
        ("ms", 1e-3),
        ("s", 1.0),
        ("m", 60.0),
        ("h", 3600.0),
    ];

    let s = input.trim();
    if s.is_empty() {
        return Err(LoggerError::duration(input, "empty string"));
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total = 0.0_f64;
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if digits == 0 {
            return Err(LoggerError::duration(input, "expected a number"));
        }
        let value: f64 = rest[..digits]
            .parse()
            .map_err(|_| LoggerError::duration(input, "invalid number"))?;
        rest = &rest[digits..];

        let Some((unit, scale)) = UNITS.iter().find(|(u, _)| rest.starts_with(u)) else {
            return Err(LoggerError::duration(input, "missing or unknown unit"));
        };
        total += value * scale;
        rest = &rest[unit.len()..];
    }

    if !total.is_finite() || total < 0.0 {
        return Err(LoggerError::duration(input, "out of range"));
    }
    Ok(Duration::from_secs_f64(total))
}
