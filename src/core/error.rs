//! Error types for the logging facade

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// File sink error with path
    #[error("File sink error for '{path}': {message}")]
    FileSink { path: String, message: String },

    /// A remote hook was configured without a destination address
    #[error("{hook} hook: empty address")]
    EmptyAddress { hook: &'static str },

    /// Duration string that could not be parsed
    #[error("Cannot parse duration '{input}': {message}")]
    DurationParse { input: String, message: String },

    /// Remote hook construction failure
    #[error("{hook} hook build failed: {message}")]
    HookBuild { hook: &'static str, message: String },

    /// Async index queue full; the record was dropped
    #[error("Index queue full: {capacity} documents buffered")]
    QueueFull { capacity: usize },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    Writer(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a file sink error
    pub fn file_sink(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileSink {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a duration parse error
    pub fn duration(input: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::DurationParse {
            input: input.into(),
            message: message.into(),
        }
    }

    /// Create a remote hook build error
    pub fn hook_build(hook: &'static str, message: impl Into<String>) -> Self {
        LoggerError::HookBuild {
            hook,
            message: message.into(),
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::Writer(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}
