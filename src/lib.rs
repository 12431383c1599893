//! # shiplog
//!
//! A structured JSON logging facade with size-based file rotation and
//! optional console and remote shipping sinks.
//!
//! ## Features
//!
//! - **Structured JSON**: Configurable field names, timestamp layouts, and
//!   pretty printing
//! - **File Rotation**: Size-bounded files with retention, age pruning, and
//!   optional compression
//! - **Multiple Hooks**: Rotating file, console, logstash, and elastic sinks
//! - **Thread Safe**: Designed for concurrent environments
//! - **One-Shot Assembly**: Build the whole pipeline from a single config

pub mod core;
pub mod hooks;
pub mod macros;
pub mod rotate;

pub mod prelude {
    pub use crate::core::{
        Caller, ElasticConfig, FieldValue, Fields, Formatter, FormatterConfig, Hook, JsonFormatter,
        LogEntry, LogLevel, Logger, LoggerConfig, LoggerError, LogstashConfig, Result, ALL_LEVELS,
    };
    pub use crate::hooks::{
        ConsoleHook, ElasticHook, LogstashHook, RotateFileConfig, RotateFileHook,
    };
    pub use crate::rotate::{RotatingWriter, RotationPolicy};
}

pub use core::{
    Caller, ElasticConfig, FieldValue, Fields, Formatter, FormatterConfig, Hook, JsonFormatter,
    LogEntry, LogLevel, Logger, LoggerConfig, LoggerError, LogstashConfig, Result, ALL_LEVELS,
};
pub use hooks::{ConsoleHook, ElasticHook, LogstashHook, RotateFileConfig, RotateFileHook};
pub use rotate::{RotatingWriter, RotationPolicy};
