//! Logger assembly and dispatch
//!
//! `Logger` owns a set of hooks behind a lock and fans every record out to
//! the hooks that subscribe to its level. `from_config` is the one-shot
//! assembly path: the rotating file sink is mandatory and its
//! misconfiguration is fatal, while console and remote sinks are optional
//! attachments whose failures degrade to a stderr warning.

use super::config::{parse_duration, LoggerConfig};
use super::error::{LoggerError, Result};
use super::format::{FormatterConfig, JsonFormatter};
use super::hook::Hook;
use super::log_entry::{Caller, LogEntry};
use super::log_level::LogLevel;
use crate::hooks::{ConsoleHook, ElasticHook, LogstashHook, RotateFileConfig, RotateFileHook};
use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};

pub struct Logger {
    level: RwLock<LogLevel>,
    hooks: RwLock<Vec<Box<dyn Hook>>>,
    report_caller: bool,
}

impl Logger {
    /// Bare logger with no hooks; records are gated by `level` but go
    /// nowhere until a hook is added.
    pub fn new(level: LogLevel) -> Self {
        Self {
            level: RwLock::new(level),
            hooks: RwLock::new(Vec::new()),
            report_caller: false,
        }
    }

    /// Assemble a logger from configuration.
    ///
    /// The rotating file sink is always attached and an empty filename is
    /// the only fatal misconfiguration. Console output is attached when
    /// `std_out` is set. Remote sinks are attempted independently: a
    /// logstash or elastic hook that cannot be built is reported to stderr
    /// and skipped without affecting the other, and never fails assembly.
    pub fn from_config(config: &LoggerConfig) -> Result<Self> {
        if config.filename.is_empty() {
            return Err(LoggerError::config("logger", "filename must not be empty"));
        }

        let logger = Self::new(config.level);

        let formatter = JsonFormatter::new(FormatterConfig {
            disable_html_escape: true,
            pretty_print: config.pretty_print,
            ..FormatterConfig::default()
        });
        logger.add_hook(Box::new(RotateFileHook::new(RotateFileConfig {
            filename: config.filename.clone().into(),
            max_size: config.max_size,
            max_backups: config.max_backups,
            max_age: config.max_age,
            level: config.level,
            formatter: Box::new(formatter),
        })));

        if config.std_out {
            logger.add_hook(Box::new(ConsoleHook::new()));
        }

        if config.use_log_stash {
            match logstash_hook(config) {
                Ok(hook) => logger.add_hook(Box::new(hook)),
                Err(e) => eprintln!("[WARN] Failed to initialize logstash hook: {}", e),
            }
        }

        if config.use_elastic {
            match elastic_hook(config) {
                Ok(hook) => logger.add_hook(Box::new(hook)),
                Err(e) => eprintln!("[WARN] Failed to initialize elastic hook: {}", e),
            }
        }

        Ok(logger)
    }

    pub fn add_hook(&self, hook: Box<dyn Hook>) {
        self.hooks.write().push(hook);
    }

    pub fn level(&self) -> LogLevel {
        *self.level.read()
    }

    pub fn set_level(&self, level: LogLevel) {
        *self.level.write() = level;
    }

    /// Capture call sites on every record. Off by default.
    pub fn set_report_caller(&mut self, enabled: bool) {
        self.report_caller = enabled;
    }

    /// Names of the attached hooks, in attachment order.
    pub fn hook_names(&self) -> Vec<String> {
        self.hooks
            .read()
            .iter()
            .map(|h| h.name().to_string())
            .collect()
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, message: &str) {
        self.dispatch(level, message, None);
    }

    #[track_caller]
    pub fn log_with_fields(&self, level: LogLevel, message: &str, fields: super::fields::Fields) {
        self.dispatch(level, message, Some(fields));
    }

    #[track_caller]
    pub fn panic(&self, message: &str) {
        self.dispatch(LogLevel::Panic, message, None);
    }

    #[track_caller]
    pub fn fatal(&self, message: &str) {
        self.dispatch(LogLevel::Fatal, message, None);
    }

    #[track_caller]
    pub fn error(&self, message: &str) {
        self.dispatch(LogLevel::Error, message, None);
    }

    #[track_caller]
    pub fn warn(&self, message: &str) {
        self.dispatch(LogLevel::Warning, message, None);
    }

    #[track_caller]
    pub fn info(&self, message: &str) {
        self.dispatch(LogLevel::Info, message, None);
    }

    #[track_caller]
    pub fn debug(&self, message: &str) {
        self.dispatch(LogLevel::Debug, message, None);
    }

    #[track_caller]
    pub fn trace(&self, message: &str) {
        self.dispatch(LogLevel::Trace, message, None);
    }

    #[track_caller]
    pub fn error_with_fields(&self, message: &str, fields: super::fields::Fields) {
        self.dispatch(LogLevel::Error, message, Some(fields));
    }

    #[track_caller]
    pub fn info_with_fields(&self, message: &str, fields: super::fields::Fields) {
        self.dispatch(LogLevel::Info, message, Some(fields));
    }

    #[track_caller]
    fn dispatch(&self, level: LogLevel, message: &str, fields: Option<super::fields::Fields>) {
        if level.ordinal() > self.level().ordinal() {
            return;
        }

        let mut entry = LogEntry::new(level, message);
        if let Some(fields) = fields {
            entry = entry.with_fields(fields);
        }
        if self.report_caller {
            let location = std::panic::Location::caller();
            entry = entry.with_caller(Caller {
                function: String::new(),
                file: location.file().to_string(),
                line: location.line(),
            });
        }

        self.fire_hooks(&entry);
    }

    /// Fan a record out to every hook subscribed to its level. A panicking
    /// or failing hook is reported and skipped so one bad sink cannot take
    /// down the rest.
    fn fire_hooks(&self, entry: &LogEntry) {
        let mut hooks = self.hooks.write();
        for hook in hooks.iter_mut() {
            if !hook.levels().contains(&entry.level) {
                continue;
            }
            let result = catch_unwind(AssertUnwindSafe(|| hook.fire(entry)));
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    eprintln!("[LOGGER ERROR] {} hook failed: {}", hook.name(), e);
                }
                Err(_) => {
                    eprintln!("[LOGGER ERROR] {} hook panicked", hook.name());
                }
            }
        }
    }

    /// Flush every hook; the first failure is returned, the rest are still
    /// flushed.
    pub fn flush(&self) -> Result<()> {
        let mut first_error = None;
        let mut hooks = self.hooks.write();
        for hook in hooks.iter_mut() {
            if let Err(e) = hook.flush() {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn logstash_hook(config: &LoggerConfig) -> Result<LogstashHook> {
    let logstash = config
        .logstash_config
        .as_ref()
        .ok_or_else(|| LoggerError::hook_build("logstash", "missing logstash_config"))?;
    LogstashHook::connect(&logstash.address, &config.service_name())
}

fn elastic_hook(config: &LoggerConfig) -> Result<ElasticHook> {
    let elastic = config
        .elastic_config
        .as_ref()
        .ok_or_else(|| LoggerError::hook_build("elastic", "missing elastic_config"))?;
    let timeout = parse_duration(&elastic.time_out)?;
    ElasticHook::connect(&elastic.address, &config.service_name(), timeout)
}
