// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 empack contributors

//! Collaborator seams: article lookup, settings, and the persisted log.
//!
//! The export pipeline only ever talks to these traits, so tests and future
//! backends can swap implementations without touching the pipeline.

pub mod library;
pub mod transfer_log;

/// JSON-backed article library.
pub use library::Library;
/// Append-only JSON Lines transfer log.
pub use transfer_log::JsonlTransferLog;

use anyhow::Result;

use crate::models::article::{Article, ArticleFile, Journal};
use crate::models::transfer_log::TransferLogEntry;

/// Resolves journals, articles, and their exportable files.
pub trait ArticleSource: Send + Sync {
    fn find_journal(&self, code: &str) -> Option<Journal>;

    fn find_article(&self, journal: &Journal, article_id: &str) -> Option<Article>;

    /// Exportable files in fixed category order: manuscript, data/figure,
    /// source, supplementary. Never fails; an unknown article yields an
    /// empty list.
    fn files_for(&self, article: &Article) -> Vec<ArticleFile>;
}

/// Key/value settings scoped by (group, name, journal).
pub trait SettingsSource: Send + Sync {
    fn setting(&self, group: &str, name: &str, journal_code: &str) -> Option<String>;
}

/// Append-only record of transfer attempt outcomes.
pub trait TransferLog: Send + Sync {
    fn append(&self, entry: TransferLogEntry) -> Result<()>;

    /// All entries in append order.
    fn entries(&self) -> Result<Vec<TransferLogEntry>>;
}
