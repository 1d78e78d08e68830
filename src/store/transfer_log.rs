// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 empack contributors

//! Transfer log persistence.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

use super::TransferLog;
use crate::models::transfer_log::TransferLogEntry;

/// Append-only JSON Lines log file, one entry per line.
pub struct JsonlTransferLog {
    path: PathBuf,
}

impl JsonlTransferLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TransferLog for JsonlTransferLog {
    fn append(&self, entry: TransferLogEntry) -> Result<()> {
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open transfer log {:?}", self.path))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("Failed to append to transfer log {:?}", self.path))
    }

    fn entries(&self) -> Result<Vec<TransferLogEntry>> {
        // A log that was never written to is simply empty.
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read transfer log {:?}", self.path))?;
        let mut entries = Vec::new();
        for line in raw.lines().filter(|line| !line.trim().is_empty()) {
            match serde_json::from_str(line) {
                Ok(entry) => entries.push(entry),
                // One torn line must not make the whole log unreadable.
                Err(err) => warn!(%err, "skipping malformed transfer log line"),
            }
        }
        Ok(entries)
    }
}

/// In-memory log used by tests across the crate.
#[cfg(test)]
pub struct MemoryTransferLog {
    entries: std::sync::Mutex<Vec<TransferLogEntry>>,
}

#[cfg(test)]
impl MemoryTransferLog {
    pub fn new() -> Self {
        Self {
            entries: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
impl TransferLog for MemoryTransferLog {
    fn append(&self, entry: TransferLogEntry) -> Result<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn entries(&self) -> Result<Vec<TransferLogEntry>> {
        Ok(self.entries.lock().unwrap().clone())
    }
}
