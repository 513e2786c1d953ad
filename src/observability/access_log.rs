//! Structured access log.
//!
//! One JSON object per line, appended to `access-YYYY-MM-DD.log` after each
//! request completes:
//!
//! ```text
//! {"timestamp":"2024-05-01T10:00:00+02:00","requestId":"…","method":"POST",
//!  "URI":"/hook?x=1","status":200,"requestBody":{"a":1},"responseTime":3}
//! ```
//!
//! The file is opened once at startup and never rotated while running.
//! Logging is best-effort: an unopenable or unwritable file is reported
//! through `tracing` and the request carries on.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use async_trait::async_trait;
use axum::{body::Body, http::Request};
use chrono::{Local, NaiveDate, SecondsFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::RunMode;
use crate::http::middleware::{Next, Stage};
use crate::http::request::{CapturedBody, RequestIdExt};
use crate::http::response::{Outcome, StatusTracker};

/// One line of the access log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessLogEntry {
    /// Completion time, RFC 3339 with local offset.
    pub timestamp: String,
    #[serde(rename = "requestId")]
    pub request_id: String,
    pub method: String,
    #[serde(rename = "URI")]
    pub uri: String,
    pub status: u16,
    /// Parsed request body; `null` when empty or not JSON.
    #[serde(rename = "requestBody")]
    pub request_body: Option<Value>,
    /// Handling time in whole milliseconds.
    #[serde(rename = "responseTime")]
    pub response_time: u64,
}

/// File name of the access log for `date`.
pub fn log_file_name(date: NaiveDate) -> String {
    format!("access-{}.log", date.format("%Y-%m-%d"))
}

/// Append-only destination for access log lines.
///
/// Writers are serialized by a mutex so every line lands whole. `append` is a
/// blocking `std::fs` write made on the calling worker thread while the lock
/// is held.
#[derive(Debug, Default)]
pub struct AccessLogSink {
    path: Option<PathBuf>,
    file: Option<Mutex<File>>,
}

impl AccessLogSink {
    /// Open today's file under `dir`, creating the directory if needed.
    pub fn open_daily(dir: &Path) -> Self {
        Self::open_for(dir, Local::now().date_naive())
    }

    /// Open the file for `date` under `dir`. Failure yields a disabled sink.
    pub fn open_for(dir: &Path, date: NaiveDate) -> Self {
        if let Err(error) = fs::create_dir_all(dir) {
            tracing::warn!(dir = %dir.display(), error = %error, "Failed to create log directory");
        }

        let path = dir.join(log_file_name(date));
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => {
                tracing::info!(path = %path.display(), "Access log opened");
                Self::with_file(path, file)
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), error = %error, "Failed to open access log; file logging disabled");
                Self::disabled()
            }
        }
    }

    /// Wrap an already-open file.
    pub fn with_file(path: impl Into<PathBuf>, file: File) -> Self {
        Self {
            path: Some(path.into()),
            file: Some(Mutex::new(file)),
        }
    }

    /// A sink that drops every entry.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.file.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append `entry` as one line. Errors are logged, never returned.
    pub fn append(&self, entry: &AccessLogEntry) {
        let Some(file) = &self.file else {
            return;
        };

        let mut line = match serde_json::to_vec(entry) {
            Ok(line) => line,
            Err(error) => {
                tracing::warn!(error = %error, "Failed to serialize access log entry");
                return;
            }
        };
        line.push(b'\n');

        let mut file = file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(error) = file.write_all(&line) {
            tracing::warn!(
                path = ?self.path,
                error = %error,
                "Failed to write access log entry"
            );
        }
    }
}

/// Stage that captures the body and writes the access log entry, keyed by
/// the request ID, once the rest of the chain has answered.
pub struct AccessLogger {
    sink: Arc<AccessLogSink>,
    mode: RunMode,
}

impl AccessLogger {
    pub fn new(sink: Arc<AccessLogSink>, mode: RunMode) -> Self {
        Self { sink, mode }
    }
}

#[async_trait]
impl Stage for AccessLogger {
    fn name(&self) -> &'static str {
        "access-log"
    }

    async fn process(&self, mut request: Request<Body>, next: Next<'_>) -> Outcome {
        let started = Instant::now();

        let request_id = request.assign_request_id();

        let (request, captured) = CapturedBody::capture(request).await;
        let method = request.method().clone();
        let uri = request.uri().clone();

        let tracker = StatusTracker::new();
        let outcome = tracker.observe(next.run(request).await);

        let status = tracker.status();
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        self.sink.append(&AccessLogEntry {
            timestamp: Local::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            request_id: request_id.to_string(),
            method: method.to_string(),
            uri: uri.to_string(),
            status: status.as_u16(),
            request_body: captured.json().cloned(),
            response_time: duration_ms,
        });

        if self.mode.is_development() {
            let path = uri.path();
            let status = status.as_u16();
            tracing::info!(
                request_id = %request_id,
                method = %method,
                path,
                status,
                duration_ms,
                "{method} {path} {status} {duration_ms}ms"
            );
        }

        outcome
    }
}
