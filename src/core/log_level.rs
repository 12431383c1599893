//! Log level definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordinal severity of a log record, ascending verbosity.
///
/// A sink configured with threshold `N` receives every level with ordinal
/// `<= N`, so enabling a verbose level always enables all more-severe ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
#[serde(try_from = "u32", into = "u32")]
pub enum LogLevel {
    Panic = 0,
    Fatal = 1,
    Error = 2,
    Warning = 3,
    #[default]
    Info = 4,
    Debug = 5,
    Trace = 6,
}

/// Every level in ordinal order, most severe first.
pub const ALL_LEVELS: [LogLevel; 7] = [
    LogLevel::Panic,
    LogLevel::Fatal,
    LogLevel::Error,
    LogLevel::Warning,
    LogLevel::Info,
    LogLevel::Debug,
    LogLevel::Trace,
];

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Panic => "Panic",
            LogLevel::Fatal => "Fatal",
            LogLevel::Error => "Error",
            LogLevel::Warning => "Warning",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Integer projection, used by rotation and sink configuration.
    pub fn ordinal(&self) -> u32 {
        *self as u32
    }

    /// Canonical name for a raw ordinal. Total over the integer domain:
    /// out-of-range input degrades to `"unknown level"` rather than erroring.
    pub fn name_of(ordinal: u32) -> &'static str {
        match LogLevel::from_ordinal(ordinal) {
            Some(level) => level.as_str(),
            None => "unknown level",
        }
    }

    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        ALL_LEVELS.get(ordinal as usize).copied()
    }

    /// The inclusive slice of levels a sink with this threshold receives:
    /// `[Panic..=self]`, length `ordinal() + 1`.
    pub fn enabled_levels(&self) -> &'static [LogLevel] {
        &ALL_LEVELS[..=self.ordinal() as usize]
    }

    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::Panic => BrightRed,
            LogLevel::Fatal => BrightRed,
            LogLevel::Error => Red,
            LogLevel::Warning => Yellow,
            LogLevel::Info => Green,
            LogLevel::Debug => Blue,
            LogLevel::Trace => BrightBlack,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<u32> for LogLevel {
    type Error = String;

    fn try_from(ordinal: u32) -> Result<Self, String> {
        LogLevel::from_ordinal(ordinal)
            .ok_or_else(|| format!("invalid log level ordinal: {}", ordinal))
    }
}

impl From<LogLevel> for u32 {
    fn from(level: LogLevel) -> u32 {
        level.ordinal()
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PANIC" => Ok(LogLevel::Panic),
            "FATAL" => Ok(LogLevel::Fatal),
            "ERROR" => Ok(LogLevel::Error),
            "WARN" | "WARNING" => Ok(LogLevel::Warning),
            "INFO" => Ok(LogLevel::Info),
            "DEBUG" => Ok(LogLevel::Debug),
            "TRACE" => Ok(LogLevel::Trace),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}
