//! Append-only audit trail of every exchange call.
//!
//! One `LogEntry` per call, success or failure. Writing is best-effort: a sink
//! error is printed to stderr and swallowed so it can never fail an order.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::{TradingError, TradingResult};
use crate::sign::SECRET_PARAMS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub context: Value,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>, context: Value) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            context: redact(&context),
        }
    }

    /// `2026-01-02T03:04:05.678Z | INFO  | message | {"context":..}`
    pub fn to_line(&self) -> String {
        format!(
            "{} | {:<5} | {} | {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.level.as_str(),
            self.message,
            self.context
        )
    }
}

/// Masks secret keys anywhere in a JSON value.
pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    if SECRET_PARAMS.contains(&k.as_str()) {
                        (k.clone(), Value::String("***".to_string()))
                    } else {
                        (k.clone(), redact(v))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

pub trait AuditSink: Send + Sync {
    fn write(&self, entry: &LogEntry) -> TradingResult<()>;
}

/// Appends one line per entry to a file.
pub struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    pub fn open(path: impl AsRef<Path>) -> TradingResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    TradingError::Logging(format!("cannot create {}: {}", parent.display(), e))
                })?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| TradingError::Logging(format!("cannot open {}: {}", path.display(), e)))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// `<dir>/orders_YYYYMMDD.log`
    pub fn open_daily(dir: impl AsRef<Path>) -> TradingResult<Self> {
        let name = format!("orders_{}.log", Utc::now().format("%Y%m%d"));
        Self::open(dir.as_ref().join(name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for FileSink {
    fn write(&self, entry: &LogEntry) -> TradingResult<()> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| TradingError::Logging("log file lock poisoned".to_string()))?;
        writeln!(file, "{}", entry.to_line())
            .and_then(|_| file.flush())
            .map_err(|e| TradingError::Logging(format!("{}: {}", self.path.display(), e)))
    }
}

/// Fallback when the log file cannot be opened.
pub struct StderrSink;

impl AuditSink for StderrSink {
    fn write(&self, entry: &LogEntry) -> TradingResult<()> {
        eprintln!("{}", entry.to_line());
        Ok(())
    }
}

/// Keeps entries in memory.
#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AuditSink for MemorySink {
    fn write(&self, entry: &LogEntry) -> TradingResult<()> {
        self.entries
            .lock()
            .map_err(|_| TradingError::Logging("memory sink lock poisoned".to_string()))?
            .push(entry.clone());
        Ok(())
    }
}

#[derive(Clone)]
pub struct Journal {
    sink: Arc<dyn AuditSink>,
}

impl Journal {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    pub fn record(&self, entry: LogEntry) {
        if let Err(e) = self.sink.write(&entry) {
            eprintln!("audit log write failed ({}); entry: {}", e, entry.to_line());
            tracing::warn!("Audit log write failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct BrokenSink;

    impl AuditSink for BrokenSink {
        fn write(&self, _entry: &LogEntry) -> TradingResult<()> {
            Err(TradingError::Logging("disk full".to_string()))
        }
    }

    #[test]
    fn secrets_never_reach_the_entry() {
        let entry = LogEntry::new(
            LogLevel::Info,
            "place_order",
            json!({ "request": { "symbol": "BTCUSDT", "signature": "deadbeef", "apiKey": "k" } }),
        );
        assert_eq!(entry.context["request"]["signature"], "***");
        assert_eq!(entry.context["request"]["apiKey"], "***");
        assert_eq!(entry.context["request"]["symbol"], "BTCUSDT");
    }

    #[test]
    fn line_format_has_iso_timestamp_and_level() {
        let entry = LogEntry::new(LogLevel::Error, "place_order failed", json!({}));
        let line = entry.to_line();
        let parts: Vec<&str> = line.split(" | ").collect();
        assert_eq!(parts.len(), 4);
        assert!(DateTime::parse_from_rfc3339(parts[0]).is_ok());
        assert_eq!(parts[1].trim(), "ERROR");
        assert_eq!(parts[2], "place_order failed");
    }

    #[test]
    fn file_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("audit.log");
        {
            let sink = FileSink::open(&path).unwrap();
            sink.write(&LogEntry::new(LogLevel::Info, "first", json!({}))).unwrap();
        }
        let sink = FileSink::open(&path).unwrap();
        sink.write(&LogEntry::new(LogLevel::Info, "second", json!({}))).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("first"));
        assert!(lines[1].contains("second"));
    }

    #[test]
    fn daily_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::open_daily(dir.path()).unwrap();
        let name = sink.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("orders_") && name.ends_with(".log"));
    }

    #[test]
    fn write_failure_does_not_propagate() {
        let journal = Journal::new(Arc::new(BrokenSink));
        journal.record(LogEntry::new(LogLevel::Info, "still fine", json!({})));
    }
}
