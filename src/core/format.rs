//! JSON record formatting
//!
//! A `Formatter` turns a record into the bytes a sink writes. The JSON
//! formatter supports field-name remapping, configurable timestamp layout,
//! HTML escaping, pretty printing, nested data keys, and caller
//! prettification.

use super::error::Result;
use super::log_entry::{Caller, LogEntry};
use serde_json::Value;
use std::sync::Arc;

/// Default timestamp layout, RFC 3339 with offset.
pub const RFC3339_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Unix-date layout used by the default formatter preset.
pub const UNIX_DATE_LAYOUT: &str = "%a %b %e %H:%M:%S %Z %Y";

/// Serializes a record into bytes for a sink.
pub trait Formatter: Send + Sync {
    /// Fails when the record cannot be marshaled.
    fn format(&self, entry: &LogEntry) -> Result<Vec<u8>>;
}

/// Rewrites the function/file values reported for a caller. Returning an
/// empty string suppresses the corresponding key.
pub type CallerPrettifier = Arc<dyn Fn(&Caller) -> (String, String) + Send + Sync>;

/// Remapping for the standard record keys.
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    pub time: Option<String>,
    pub level: Option<String>,
    pub msg: Option<String>,
    pub func: Option<String>,
    pub file: Option<String>,
}

impl FieldMap {
    fn time_key(&self) -> &str {
        self.time.as_deref().unwrap_or("time")
    }

    fn level_key(&self) -> &str {
        self.level.as_deref().unwrap_or("level")
    }

    fn msg_key(&self) -> &str {
        self.msg.as_deref().unwrap_or("msg")
    }

    fn func_key(&self) -> &str {
        self.func.as_deref().unwrap_or("func")
    }

    fn file_key(&self) -> &str {
        self.file.as_deref().unwrap_or("file")
    }
}

/// Controls serialization of a record into bytes.
#[derive(Clone, Default)]
pub struct FormatterConfig {
    /// chrono strftime layout; `None` uses RFC 3339.
    pub timestamp_format: Option<String>,

    /// Omit the timestamp key entirely.
    pub disable_timestamp: bool,

    /// Leave `<`, `>` and `&` unescaped in the output.
    pub disable_html_escape: bool,

    /// Nest all entry fields under this key instead of the top level.
    pub data_key: Option<String>,

    /// Custom names for the standard keys.
    pub field_map: FieldMap,

    /// Active only when the entry carries caller information.
    pub caller_prettifier: Option<CallerPrettifier>,

    /// Indent the JSON output.
    pub pretty_print: bool,
}

pub struct JsonFormatter {
    config: FormatterConfig,
}

impl JsonFormatter {
    pub fn new(config: FormatterConfig) -> Self {
        Self { config }
    }
}

/// Convenience preset: time is remapped to `@timestamp` with a Unix-date
/// layout and the message key is `message`.
impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new(FormatterConfig {
            timestamp_format: Some(UNIX_DATE_LAYOUT.to_string()),
            field_map: FieldMap {
                time: Some("@timestamp".to_string()),
                msg: Some("message".to_string()),
                ..FieldMap::default()
            },
            ..FormatterConfig::default()
        })
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, entry: &LogEntry) -> Result<Vec<u8>> {
        let cfg = &self.config;
        let map_keys = &cfg.field_map;
        let mut map = serde_json::Map::new();

        // Entry fields first; standard keys always win a collision, the
        // colliding field is kept under a "fields." prefix. The caller keys
        // only participate when the entry carries a caller.
        if let Some(data_key) = &cfg.data_key {
            if !entry.fields.is_empty() {
                map.insert(data_key.clone(), serde_json::to_value(&entry.fields)?);
            }
        } else {
            for (key, value) in entry.fields.iter() {
                let collides = key == map_keys.time_key()
                    || key == map_keys.level_key()
                    || key == map_keys.msg_key()
                    || (entry.caller.is_some()
                        && (key == map_keys.func_key() || key == map_keys.file_key()));
                let key = if collides {
                    format!("fields.{}", key)
                } else {
                    key.clone()
                };
                map.insert(key, value.to_json_value());
            }
        }

        if !cfg.disable_timestamp {
            let layout = cfg.timestamp_format.as_deref().unwrap_or(RFC3339_LAYOUT);
            map.insert(
                map_keys.time_key().to_string(),
                Value::String(entry.timestamp.format(layout).to_string()),
            );
        }
        map.insert(
            map_keys.level_key().to_string(),
            Value::String(entry.level.as_str().to_string()),
        );
        map.insert(
            map_keys.msg_key().to_string(),
            Value::String(entry.message.clone()),
        );

        if let Some(caller) = &entry.caller {
            let (function, file) = match &cfg.caller_prettifier {
                Some(prettify) => prettify(caller),
                None => (
                    caller.function.clone(),
                    format!("{}:{}", caller.file, caller.line),
                ),
            };
            if !function.is_empty() {
                map.insert(map_keys.func_key().to_string(), Value::String(function));
            }
            if !file.is_empty() {
                map.insert(map_keys.file_key().to_string(), Value::String(file));
            }
        }

        let serialized = if cfg.pretty_print {
            serde_json::to_string_pretty(&Value::Object(map))?
        } else {
            serde_json::to_string(&Value::Object(map))?
        };

        let mut out = if cfg.disable_html_escape {
            serialized
        } else {
            escape_html(&serialized)
        }
        .into_bytes();
        out.push(b'\n');
        Ok(out)
    }
}

/// Escape HTML-sensitive characters the way encoding/json does: `<`, `>`
/// and `&` become unicode escapes. These characters only occur inside JSON
/// strings, so a textual pass over the serialized form is safe.
fn escape_html(serialized: &str) -> String {
    let mut out = String::with_capacity(serialized.len());
    for c in serialized.chars() {
        match c {
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fields::Fields;
    use crate::core::log_level::LogLevel;

    fn parse(bytes: &[u8]) -> serde_json::Value {
        serde_json::from_slice(bytes).expect("valid JSON output")
    }

    #[test]
    fn test_default_preset_keys() {
        let formatter = JsonFormatter::default();
        let entry = LogEntry::new(LogLevel::Info, "hello");
        let out = formatter.format(&entry).unwrap();

        let value = parse(&out);
        let obj = value.as_object().unwrap();
        assert!(obj.contains_key("@timestamp"));
        assert_eq!(obj["message"], "hello");
        assert_eq!(obj["level"], "Info");
        // No caller or data keys unless explicitly added.
        assert!(!obj.contains_key("func"));
        assert!(!obj.contains_key("file"));
        assert_eq!(obj.len(), 3);
    }

    #[test]
    fn test_output_newline_terminated() {
        let formatter = JsonFormatter::new(FormatterConfig::default());
        let out = formatter
            .format(&LogEntry::new(LogLevel::Debug, "x"))
            .unwrap();
        assert_eq!(out.last(), Some(&b'\n'));
    }

    #[test]
    fn test_caller_key_collision_prefixed() {
        let formatter = JsonFormatter::new(FormatterConfig::default());
        let caller = Caller {
            function: "handler".to_string(),
            file: "srv.rs".to_string(),
            line: 7,
        };

        let entry = LogEntry::new(LogLevel::Info, "m")
            .with_field("func", "user value")
            .with_caller(caller);
        let value = parse(&formatter.format(&entry).unwrap());
        assert_eq!(value["func"], "handler");
        assert_eq!(value["fields.func"], "user value");

        // Without a caller the field keeps its own key.
        let entry = LogEntry::new(LogLevel::Info, "m").with_field("func", "user value");
        let value = parse(&formatter.format(&entry).unwrap());
        assert_eq!(value["func"], "user value");
        assert!(value.get("fields.func").is_none());
    }

    #[test]
    fn test_disable_timestamp() {
        let formatter = JsonFormatter::new(FormatterConfig {
            disable_timestamp: true,
            ..FormatterConfig::default()
        });
        let out = formatter.format(&LogEntry::new(LogLevel::Info, "x")).unwrap();
        let value = parse(&out);
        assert!(!value.as_object().unwrap().contains_key("time"));
    }

    #[test]
    fn test_html_escaping_default_on() {
        let formatter = JsonFormatter::new(FormatterConfig::default());
        let out = formatter
            .format(&LogEntry::new(LogLevel::Info, "<b>bold & brash</b>"))
            .unwrap();
        let text = String::from_utf8(out.clone()).unwrap();
        assert!(text.contains("\\u003cb\\u003e"));
        assert!(text.contains("\\u0026"));
        // Escapes decode back to the original message.
        assert_eq!(parse(&out)["msg"], "<b>bold & brash</b>");
    }

    #[test]
    fn test_html_escaping_disabled() {
        let formatter = JsonFormatter::new(FormatterConfig {
            disable_html_escape: true,
            ..FormatterConfig::default()
        });
        let out = formatter
            .format(&LogEntry::new(LogLevel::Info, "<tag>"))
            .unwrap();
        assert!(String::from_utf8(out).unwrap().contains("<tag>"));
    }

    #[test]
    fn test_pretty_print() {
        let formatter = JsonFormatter::new(FormatterConfig {
            pretty_print: true,
            ..FormatterConfig::default()
        });
        let out = formatter.format(&LogEntry::new(LogLevel::Info, "x")).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\n  "));
        parse(text.as_bytes());
    }

    #[test]
    fn test_data_key_nesting() {
        let formatter = JsonFormatter::new(FormatterConfig {
            data_key: Some("data".to_string()),
            ..FormatterConfig::default()
        });
        let entry =
            LogEntry::new(LogLevel::Info, "x").with_fields(Fields::new().with_field("k", "v"));
        let value = parse(&formatter.format(&entry).unwrap());
        assert_eq!(value["data"]["k"], "v");
        assert!(value.as_object().unwrap().get("k").is_none());
    }

    #[test]
    fn test_field_collision_prefixed() {
        let formatter = JsonFormatter::new(FormatterConfig::default());
        let entry = LogEntry::new(LogLevel::Info, "real message")
            .with_field("msg", "impostor");
        let value = parse(&formatter.format(&entry).unwrap());
        assert_eq!(value["msg"], "real message");
        assert_eq!(value["fields.msg"], "impostor");
    }

    #[test]
    fn test_caller_reported_and_prettified() {
        let caller = Caller {
            function: "shiplog::demo::run".to_string(),
            file: "demo.rs".to_string(),
            line: 7,
        };

        let formatter = JsonFormatter::new(FormatterConfig::default());
        let entry = LogEntry::new(LogLevel::Info, "x").with_caller(caller.clone());
        let value = parse(&formatter.format(&entry).unwrap());
        assert_eq!(value["func"], "shiplog::demo::run");
        assert_eq!(value["file"], "demo.rs:7");

        // A prettifier returning empty strings suppresses the keys.
        let formatter = JsonFormatter::new(FormatterConfig {
            caller_prettifier: Some(Arc::new(|_| (String::new(), String::new()))),
            ..FormatterConfig::default()
        });
        let entry = LogEntry::new(LogLevel::Info, "x").with_caller(caller);
        let value = parse(&formatter.format(&entry).unwrap());
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("func"));
        assert!(!obj.contains_key("file"));
    }

    #[test]
    fn test_custom_field_map() {
        let formatter = JsonFormatter::new(FormatterConfig {
            field_map: FieldMap {
                level: Some("@level".to_string()),
                ..FieldMap::default()
            },
            ..FormatterConfig::default()
        });
        let value = parse(
            &formatter
                .format(&LogEntry::new(LogLevel::Warning, "x"))
                .unwrap(),
        );
        assert_eq!(value["@level"], "Warning");
    }
}
