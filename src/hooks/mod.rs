//! Output hooks
//!
//! Each hook owns one destination. The rotating file hook is the mandatory
//! local sink; console and remote hooks are optional attachments.

pub mod console;
pub mod elastic;
pub mod logstash;
pub mod rotate_file;

pub use console::ConsoleHook;
pub use elastic::ElasticHook;
pub use logstash::LogstashHook;
pub use rotate_file::{RotateFileConfig, RotateFileHook};
