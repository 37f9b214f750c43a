// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)
// Parlor Telemetry - File Backend (JSONL)

//! # File-Based Telemetry Backend
//!
//! A file-based backend using JSONL (JSON Lines) format for local development
//! and debugging. Every envelope is appended as one line, so the stream can
//! be inspected with standard JSONL tools.
//!
//! Delivery is synchronous for this backend: a write either succeeds before
//! `enqueue` returns or fails as an enqueue error. The asynchronous failure
//! hook is therefore never invoked.

use crate::backends::traits::{EventSink, FailureHook, SinkConnector};
use crate::errors::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

/// A telemetry sink appending JSONL to a local file.
pub struct FileSink {
    file: Mutex<File>,
    path: PathBuf,
}

impl EventSink for FileSink {
    fn enqueue(&self, payload: &str) -> Result<()> {
        let mut file = self
            .file
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        writeln!(file, "{payload}").map_err(|e| Error::Enqueue(e.to_string()))
    }

    fn close(&self) {
        let file = self
            .file
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let _ = file.sync_all();
        info!(path = %self.path.display(), "file sink closed");
    }
}

/// Connector producing [`FileSink`]s for one output path.
pub struct FileConnector {
    path: PathBuf,
}

impl FileConnector {
    /// Create a connector writing to `path`; parent directories are created
    /// on connect.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SinkConnector for FileConnector {
    type Sink = FileSink;

    fn connect(&self, _on_delivery_failure: FailureHook) -> Result<FileSink> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        info!(path = %self.path.display(), "file sink opened");
        Ok(FileSink {
            file: Mutex::new(file),
            path: self.path.clone(),
        })
    }
}
