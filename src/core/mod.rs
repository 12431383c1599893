//! Core logging types: levels, entries, formatting, configuration, and the
//! logger itself.

pub mod config;
pub mod error;
pub mod fields;
pub mod format;
pub mod hook;
pub mod log_entry;
pub mod log_level;
pub mod logger;

pub use config::{ElasticConfig, LoggerConfig, LogstashConfig};
pub use error::{LoggerError, Result};
pub use fields::{FieldValue, Fields};
pub use format::{Formatter, FormatterConfig, JsonFormatter};
pub use hook::Hook;
pub use log_entry::{Caller, LogEntry};
pub use log_level::{LogLevel, ALL_LEVELS};
pub use logger::Logger;
