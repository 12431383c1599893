//! End-to-end tests covering assembly from configuration, file output,
//! rotation, and remote shipping over real sockets.

use shiplog::prelude::*;
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread;
use tempfile::tempdir;

fn config_from(raw: &str) -> LoggerConfig {
    serde_json::from_str(raw).expect("valid config")
}

#[test]
fn test_file_only_assembly_writes_json_records() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let config = config_from(&format!(
        r#"{{"filename": {:?}, "level": 5}}"#,
        path.to_str().unwrap()
    ));

    let logger = Logger::from_config(&config).unwrap();
    assert_eq!(logger.hook_names(), vec!["rotate_file"]);

    logger.info("service starting");
    logger.debug("cache warmed");
    logger.trace("suppressed by threshold");
    logger.flush().unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["msg"], "service starting");
    assert_eq!(first["level"], "Info");
    assert!(first["time"].is_string());

    let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second["msg"], "cache warmed");
    assert_eq!(second["level"], "Debug");
}

#[test]
fn test_fields_and_html_survive_file_sink() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fields.log");
    let config = config_from(&format!(r#"{{"filename": {:?}}}"#, path.to_str().unwrap()));

    let logger = Logger::from_config(&config).unwrap();
    let mut fields = Fields::new();
    fields.add_field("query", "<script>alert(1)</script>");
    fields.add_field("attempt", 3);
    logger.info_with_fields("request served", fields);
    logger.flush().unwrap();

    let content = fs::read_to_string(&path).unwrap();
    // HTML escaping is disabled for the file sink.
    assert!(content.contains("<script>"));

    let value: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
    assert_eq!(value["attempt"], 3);
    assert_eq!(value["query"], "<script>alert(1)</script>");
}

#[test]
fn test_console_hook_attached_when_std_out_set() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let config = config_from(&format!(
        r#"{{"filename": {:?}, "std_out": true}}"#,
        path.to_str().unwrap()
    ));

    let logger = Logger::from_config(&config).unwrap();
    assert_eq!(logger.hook_names(), vec!["rotate_file", "console"]);
}

#[test]
fn test_rotation_through_the_full_pipeline() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rotating.log");
    let config = config_from(&format!(
        r#"{{"filename": {:?}, "max_size": 1, "max_backups": 2}}"#,
        path.to_str().unwrap()
    ));

    let logger = Logger::from_config(&config).unwrap();
    let payload = "p".repeat(64 * 1024);
    for i in 0..40 {
        let mut fields = Fields::new();
        fields.add_field("seq", i as i64);
        fields.add_field("payload", payload.as_str());
        logger.info_with_fields("bulk record", fields);
    }
    logger.flush().unwrap();

    assert!(path.exists());
    assert!(dir.path().join("rotating.log.1").exists());
    assert!(!dir.path().join("rotating.log.3").exists());
}

#[test]
fn test_unreachable_logstash_degrades_without_failing_assembly() {
    // Bind then drop to obtain a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let config = config_from(&format!(
        r#"{{
            "filename": {:?},
            "use_log_stash": true,
            "logstash_config": {{"address": "{}"}}
        }}"#,
        path.to_str().unwrap(),
        addr
    ));

    let logger = Logger::from_config(&config).unwrap();
    assert_eq!(logger.hook_names(), vec!["rotate_file"]);

    // The surviving file sink still works.
    logger.info("still logging");
    logger.flush().unwrap();
    assert!(fs::read_to_string(&path).unwrap().contains("still logging"));
}

#[test]
fn test_bad_elastic_timeout_degrades_without_failing_assembly() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let config = config_from(&format!(
        r#"{{
            "filename": {:?},
            "use_elastic": true,
            "elastic_config": {{"address": "127.0.0.1:9200", "time_out": "abc"}}
        }}"#,
        path.to_str().unwrap()
    ));

    let logger = Logger::from_config(&config).unwrap();
    assert_eq!(logger.hook_names(), vec!["rotate_file"]);
}

#[test]
fn test_logstash_shipping_end_to_end() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut line = String::new();
        BufReader::new(stream).read_line(&mut line).unwrap();
        line
    });

    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let config = config_from(&format!(
        r#"{{
            "filename": {:?},
            "use_log_stash": true,
            "logstash_config": {{"address": "{}"}},
            "name_fields": {{"service_name": "orders"}}
        }}"#,
        path.to_str().unwrap(),
        addr
    ));

    let logger = Logger::from_config(&config).unwrap();
    assert_eq!(logger.hook_names(), vec!["rotate_file", "logstash"]);

    logger.warn("slow request");
    logger.flush().unwrap();

    let line = server.join().unwrap();
    let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(value["message"], "slow request");
    assert_eq!(value["level"], "Warning");
    assert_eq!(value["service_name"], "orders");
    assert!(value["@timestamp"].is_string());

    // The file sink received the same record.
    assert!(fs::read_to_string(&path).unwrap().contains("slow request"));
}

#[test]
fn test_elastic_shipping_end_to_end() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                content_length = v.trim().parse().unwrap();
            }
        }

        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).unwrap();

        let mut stream = stream;
        stream
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\n{}")
            .unwrap();
        String::from_utf8(body).unwrap()
    });

    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let config = config_from(&format!(
        r#"{{
            "filename": {:?},
            "level": 5,
            "use_elastic": true,
            "elastic_config": {{"address": "{}", "time_out": "2s"}},
            "name_fields": {{"service_name": "orders"}}
        }}"#,
        path.to_str().unwrap(),
        addr
    ));

    let logger = Logger::from_config(&config).unwrap();
    assert_eq!(logger.hook_names(), vec!["rotate_file", "elastic"]);

    logger.error("index me");
    drop(logger);

    let body = server.join().unwrap();
    let mut lines = body.lines();
    let action: serde_json::Value = serde_json::from_str(lines.next().unwrap()).unwrap();
    assert_eq!(action["index"]["_index"], "orders");
    let doc: serde_json::Value = serde_json::from_str(lines.next().unwrap()).unwrap();
    assert_eq!(doc["message"], "index me");
    assert_eq!(doc["level"], "Error");
}

#[test]
fn test_both_remote_hooks_attempted_independently() {
    // Logstash is unreachable but elastic is live; the elastic hook must
    // still be attached.
    let dead = TcpListener::bind("127.0.0.1:0").unwrap();
    let dead_addr = dead.local_addr().unwrap();
    drop(dead);

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let live_addr = listener.local_addr().unwrap();
    let server = thread::spawn(move || {
        // Accept the handshake connection and hold it briefly.
        let (stream, _) = listener.accept().unwrap();
        thread::sleep(std::time::Duration::from_millis(200));
        drop(stream);
    });

    let dir = tempdir().unwrap();
    let path = dir.path().join("app.log");
    let config = config_from(&format!(
        r#"{{
            "filename": {:?},
            "use_log_stash": true,
            "logstash_config": {{"address": "{}"}},
            "use_elastic": true,
            "elastic_config": {{"address": "{}", "time_out": "2s"}}
        }}"#,
        path.to_str().unwrap(),
        dead_addr,
        live_addr
    ));

    let logger = Logger::from_config(&config).unwrap();
    assert_eq!(logger.hook_names(), vec!["rotate_file", "elastic"]);

    drop(logger);
    server.join().unwrap();
}

#[test]
fn test_pretty_print_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("pretty.log");
    let config = config_from(&format!(
        r#"{{"filename": {:?}, "pretty_print": true}}"#,
        path.to_str().unwrap()
    ));

    let logger = Logger::from_config(&config).unwrap();
    logger.info("indented");
    logger.flush().unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("{\n"));
    let value: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
    assert_eq!(value["msg"], "indented");
}

#[test]
fn test_macros_drive_the_full_pipeline() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("macro.log");
    let config = config_from(&format!(
        r#"{{"filename": {:?}, "level": 6}}"#,
        path.to_str().unwrap()
    ));

    let logger = Logger::from_config(&config).unwrap();
    shiplog::info!(logger, "listening on port {}", 8080);
    shiplog::warn!(logger, "retry {} of {}", 2, 5);
    shiplog::trace!(logger, "verbose detail");
    logger.flush().unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("listening on port 8080"));
    assert!(content.contains("retry 2 of 5"));
    assert!(content.contains("verbose detail"));
}
