//! Asynchronous search-index hook
//!
//! Serialized records are queued on a bounded channel and shipped by a
//! background worker as bulk index requests, decoupling emission latency
//! from network latency. The configured timeout bounds only the initial
//! handshake connection; steady-state shipping is not bounded by it. There
//! is no retry: a batch that fails to ship is reported to stderr and
//! dropped, and a full queue surfaces as an error from `fire`.

use crate::core::error::{LoggerError, Result};
use crate::core::hook::Hook;
use crate::core::log_entry::LogEntry;
use crate::core::log_level::LogLevel;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde_json::Value;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};

const QUEUE_CAPACITY: usize = 1024;
const BATCH_SIZE: usize = 50;
const IO_TIMEOUT: Duration = Duration::from_secs(5);
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ElasticHook {
    sender: Option<Sender<String>>,
    worker: Option<thread::JoinHandle<()>>,
    host: String,
}

impl ElasticHook {
    /// Fails when the address is empty or malformed, or when the handshake
    /// connection cannot be established within `timeout`. Records are
    /// indexed into `index` (conventionally the service name).
    pub fn connect(address: &str, index: &str, timeout: Duration) -> Result<Self> {
        if address.is_empty() {
            return Err(LoggerError::EmptyAddress { hook: "elastic" });
        }

        let host = host_port(address)?;
        let sock_addr = host
            .to_socket_addrs()
            .map_err(|e| LoggerError::hook_build("elastic", e.to_string()))?
            .next()
            .ok_or_else(|| LoggerError::hook_build("elastic", "address did not resolve"))?;

        let stream = TcpStream::connect_timeout(&sock_addr, timeout)
            .map_err(|e| LoggerError::hook_build("elastic", e.to_string()))?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(IO_TIMEOUT))?;
        stream.set_write_timeout(Some(IO_TIMEOUT))?;

        let (sender, receiver) = bounded(QUEUE_CAPACITY);
        let worker = {
            let host = host.clone();
            let index = index.to_string();
            thread::Builder::new()
                .name("shiplog-elastic".to_string())
                .spawn(move || worker_loop(stream, receiver, host, index))?
        };

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            host,
        })
    }

    /// Hook backed by a bare queue with no worker attached, for exercising
    /// the queueing behavior in isolation.
    #[cfg(test)]
    fn with_queue(capacity: usize) -> (Self, Receiver<String>) {
        let (sender, receiver) = bounded(capacity);
        (
            Self {
                sender: Some(sender),
                worker: None,
                host: "127.0.0.1:9200".to_string(),
            },
            receiver,
        )
    }

    fn document(&self, entry: &LogEntry) -> Result<String> {
        let mut map = serde_json::Map::new();
        for (key, value) in entry.fields.iter() {
            map.insert(key.clone(), value.to_json_value());
        }
        map.insert(
            "@timestamp".to_string(),
            Value::String(
                entry
                    .timestamp
                    .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                    .to_string(),
            ),
        );
        let host = self
            .host
            .rsplit_once(':')
            .map(|(h, _)| h)
            .unwrap_or(&self.host);
        map.insert("host".to_string(), Value::String(host.to_string()));
        map.insert(
            "level".to_string(),
            Value::String(entry.level.as_str().to_string()),
        );
        map.insert(
            "message".to_string(),
            Value::String(entry.message.clone()),
        );
        Ok(serde_json::to_string(&Value::Object(map))?)
    }
}

impl Hook for ElasticHook {
    /// Fixed at a Debug threshold: the hook receives records of every
    /// level up to Debug regardless of the logger's configured threshold.
    fn levels(&self) -> &[LogLevel] {
        LogLevel::Debug.enabled_levels()
    }

    fn fire(&mut self, entry: &LogEntry) -> Result<()> {
        let doc = self.document(entry)?;
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| LoggerError::writer("index worker stopped"))?;
        match sender.try_send(doc) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(LoggerError::QueueFull {
                capacity: sender.capacity().unwrap_or(QUEUE_CAPACITY),
            }),
            Err(TrySendError::Disconnected(_)) => {
                Err(LoggerError::writer("index worker stopped"))
            }
        }
    }

    fn name(&self) -> &str {
        "elastic"
    }
}

impl Drop for ElasticHook {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit.
        drop(self.sender.take());
        if let Some(handle) = self.worker.take() {
            let start = Instant::now();
            while !handle.is_finished() && start.elapsed() < DRAIN_TIMEOUT {
                thread::sleep(Duration::from_millis(10));
            }
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                eprintln!(
                    "[WARN] Elastic hook worker did not drain within {:?}; queued documents may be lost.",
                    DRAIN_TIMEOUT
                );
            }
        }
    }
}

fn worker_loop(mut stream: TcpStream, receiver: Receiver<String>, host: String, index: String) {
    let mut batch: Vec<String> = Vec::with_capacity(BATCH_SIZE);
    loop {
        match receiver.recv() {
            Ok(doc) => batch.push(doc),
            Err(_) => {
                // Channel closed; flush what is queued and exit.
                if !batch.is_empty() {
                    report_ship_error(ship(&mut stream, &host, &index, &batch), batch.len());
                }
                break;
            }
        }

        while batch.len() < BATCH_SIZE {
            match receiver.try_recv() {
                Ok(doc) => batch.push(doc),
                Err(_) => break,
            }
        }

        report_ship_error(ship(&mut stream, &host, &index, &batch), batch.len());
        batch.clear();
    }
}

fn report_ship_error(result: io::Result<()>, count: usize) {
    if let Err(e) = result {
        eprintln!(
            "[LOGGER ERROR] Elastic hook failed to ship {} documents: {}",
            count, e
        );
    }
}

/// Ship one batch as a bulk index request and drain the response.
fn ship(stream: &mut TcpStream, host: &str, index: &str, docs: &[String]) -> io::Result<()> {
    let action = serde_json::json!({ "index": { "_index": index } }).to_string();
    let mut body = String::new();
    for doc in docs {
        body.push_str(&action);
        body.push('\n');
        body.push_str(doc);
        body.push('\n');
    }

    let request = format!(
        "POST /_bulk HTTP/1.1\r\nHost: {}\r\nContent-Type: application/x-ndjson\r\nContent-Length: {}\r\nConnection: keep-alive\r\n\r\n",
        host,
        body.len()
    );
    stream.write_all(request.as_bytes())?;
    stream.write_all(body.as_bytes())?;
    stream.flush()?;
    drain_response(stream)
}

/// Best-effort read of one HTTP response so the connection can be reused.
/// A slow or silent endpoint is tolerated; only hard IO errors surface.
fn drain_response(stream: &mut TcpStream) -> io::Result<()> {
    let mut reader = BufReader::new(stream);
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => return Ok(()),
            Ok(_) => {}
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                return Ok(())
            }
            Err(e) => return Err(e),
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some(value) = line
            .to_ascii_lowercase()
            .strip_prefix("content-length:")
            .map(str::trim)
            .and_then(|v| v.parse::<usize>().ok())
        {
            content_length = value;
        }
    }
    if content_length > 0 {
        let mut sink = vec![0u8; content_length];
        match reader.read_exact(&mut sink) {
            Ok(()) => {}
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Reduce a configured address (optionally a URL) to `host:port`,
/// defaulting to port 9200.
fn host_port(address: &str) -> Result<String> {
    let mut rest = address.trim();
    for scheme in ["http://", "https://"] {
        if let Some(stripped) = rest.strip_prefix(scheme) {
            rest = stripped;
        }
    }
    let rest = rest.split('/').next().unwrap_or(rest);
    if rest.is_empty() {
        return Err(LoggerError::hook_build("elastic", "invalid address"));
    }
    if rest.contains(':') {
        Ok(rest.to_string())
    } else {
        Ok(format!("{}:9200", rest))
    }
}
