// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 empack contributors

//! Typed failures of the export pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::logic::settings::SettingKey;

/// Everything that can end an export build early.
///
/// Each variant ends the build, is appended to the transfer log (the Display
/// text doubles as the persisted message), and reaches the caller as a plain
/// value. Nothing here panics.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no article id provided")]
    NoArticleId,

    #[error("no journal code provided")]
    NoJournalCode,

    #[error("no journal found with code '{0}'")]
    JournalNotFound(String),

    #[error("article '{article_id}' not found in journal '{journal_code}'")]
    ArticleNotFound {
        journal_code: String,
        article_id: String,
    },

    #[error("export folder '{}' does not exist", .0.display())]
    NoExportFolder(PathBuf),

    #[error("required setting '{0}' is not configured")]
    MissingSetting(SettingKey),

    #[error("no exportable files found for article '{0}'")]
    NoFilesFound(String),

    #[error("failed to write archive '{}'", .path.display())]
    ArchiveWriteFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to write descriptor '{}'", .path.display())]
    DescriptorWriteFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::ExportError;
    use crate::logic::settings::SettingKey;

    // Display text is what lands in the transfer log; it must name the
    // offending setting.
    #[test]
    fn missing_setting_names_the_key() {
        let err = ExportError::MissingSetting(SettingKey::SubmissionPartnerCode);

        assert_eq!(
            err.to_string(),
            "required setting 'submission_partner_code' is not configured"
        );
    }

    // Archive failures keep the underlying cause reachable via source().
    #[test]
    fn archive_failure_chains_its_source() {
        use std::error::Error;

        let err = ExportError::ArchiveWriteFailed {
            path: "/tmp/out.zip".into(),
            source: anyhow::anyhow!("disk full"),
        };

        assert!(err.to_string().contains("/tmp/out.zip"));
        assert_eq!(err.source().map(|s| s.to_string()), Some("disk full".into()));
    }
}
