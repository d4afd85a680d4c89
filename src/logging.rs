use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::email::types::EmailError;

/// One sanitized failure record. Request metadata carries only presence
/// booleans for sensitive fields, never their values.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorLogEntry {
  pub ts: DateTime<Utc>,
  pub route: String,
  pub duration_ms: u64,
  pub error: ErrorDetail,
  pub request: RequestMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
  pub name: String,
  pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestMeta {
  pub template: String,
  pub to_provided: bool,
  pub code_provided: bool,
}

impl ErrorLogEntry {
  pub fn new(route: &str, duration: Duration, error: &EmailError, request: RequestMeta) -> Self {
    ErrorLogEntry {
      ts: Utc::now(),
      route: route.to_string(),
      duration_ms: duration.as_millis() as u64,
      error: ErrorDetail {
        name: error.name().to_string(),
        message: error.to_string(),
      },
      request,
    }
  }
}

/// Append-only failure sink. Implementations must swallow their own errors:
/// a logging outage never fails a user-facing request.
#[async_trait]
pub trait ErrorLog: Send + Sync {
  async fn append(&self, entry: ErrorLogEntry);
}

/// JSON-lines file sink.
pub struct FileErrorLog {
  path: PathBuf,
}

impl FileErrorLog {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    FileErrorLog { path: path.into() }
  }

  async fn try_append(&self, entry: &ErrorLogEntry) -> std::io::Result<()> {
    if let Some(dir) = self.path.parent() {
      tokio::fs::create_dir_all(dir).await?;
    }

    let mut line = serde_json::to_string(entry)?;
    line.push('\n');

    let mut file = tokio::fs::OpenOptions::new()
      .create(true)
      .append(true)
      .open(&self.path)
      .await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;

    Ok(())
  }
}

#[async_trait]
impl ErrorLog for FileErrorLog {
  async fn append(&self, entry: ErrorLogEntry) {
    if let Err(e) = self.try_append(&entry).await {
      tracing::warn!(error = %e, path = %self.path.display(), "failed to append error log entry");
    }
  }
}

/// In-memory sink for assertions in tests.
pub struct MemoryErrorLog {
  entries: Mutex<Vec<ErrorLogEntry>>,
}

impl MemoryErrorLog {
  pub fn new() -> Self {
    MemoryErrorLog {
      entries: Mutex::new(Vec::new()),
    }
  }

  pub fn entries(&self) -> Vec<ErrorLogEntry> {
    self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
  }
}

impl Default for MemoryErrorLog {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl ErrorLog for MemoryErrorLog {
  async fn append(&self, entry: ErrorLogEntry) {
    self.entries.lock().unwrap_or_else(|e| e.into_inner()).push(entry);
  }
}
