// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 empack contributors

//! Persisted records of transfer attempt outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a logged transfer attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferLogMessageType {
    #[serde(rename = "EX")]
    Export,
    #[serde(rename = "IM")]
    Import,
}

impl TransferLogMessageType {
    /// Human-readable form used when printing log entries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Export => "export",
            Self::Import => "import",
        }
    }
}

/// One appended log record.
///
/// Journal and article references are optional: a failure can happen before
/// either is resolved. Entries are append-only and never rewritten.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLogEntry {
    pub message_type: TransferLogMessageType,
    pub journal_code: Option<String>,
    pub article_id: Option<String>,
    pub message: String,
    pub success: bool,
    pub logged_at: DateTime<Utc>,
}

impl TransferLogEntry {
    /// Build an export-direction entry stamped with the current time.
    pub fn export(
        journal_code: Option<String>,
        article_id: Option<String>,
        message: String,
        success: bool,
    ) -> Self {
        Self {
            message_type: TransferLogMessageType::Export,
            journal_code,
            article_id,
            message,
            success,
            logged_at: Utc::now(),
        }
    }
}
