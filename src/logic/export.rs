// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 empack contributors

//! Export bundle building.
//!
//! Responsibilities:
//! - Validate the request and resolve journal, article, and configuration.
//! - Collect the article's files and write them into a fresh ZIP archive.
//! - Emit the GO descriptor referencing the archive and its members.
//!
//! Every failure is appended to the transfer log with whatever journal and
//! article references were resolved by then, and a failed build leaves no
//! bundle files behind.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, error, warn};
use uuid::Uuid;
use zip::{CompressionMethod, write::FileOptions};

use crate::error::ExportError;
use crate::logic::descriptor::write_go_descriptor;
use crate::logic::settings::resolve_journal_config;
use crate::models::article::{ArticleFile, Journal};
use crate::models::bundle::Bundle;
use crate::models::transfer_log::TransferLogEntry;
use crate::store::{ArticleSource, SettingsSource, TransferLog};
use crate::utils::sanitize_component;

const ARCHIVE_EXTENSION: &str = "zip";
const DESCRIPTOR_EXTENSION: &str = "go.xml";

/// Build the transfer bundle for one article.
///
/// On success the export folder contains `{prefix}.zip` and
/// `{prefix}.go.xml`, where `prefix` is the submission partner code joined
/// with a fresh UUID, and the returned [`Bundle`] lists the archive members
/// in write order. Callers wanting memoization go through the registry in
/// [`crate::logic::transfer`] instead of calling this directly.
pub fn create_export_bundle(
    articles: &dyn ArticleSource,
    settings: &dyn SettingsSource,
    log: &dyn TransferLog,
    export_folder: &Path,
    journal_code: &str,
    article_id: &str,
) -> Result<Bundle, ExportError> {
    let journal_code = journal_code.trim();
    let article_id = article_id.trim();

    let fail = |journal: Option<&Journal>, article: Option<&str>, err: ExportError| {
        error!(%err, "export build failed");
        let entry = TransferLogEntry::export(
            journal.map(|journal| journal.code.clone()),
            article.map(str::to_string),
            err.to_string(),
            false,
        );
        if let Err(log_err) = log.append(entry) {
            warn!(%log_err, "could not persist transfer log entry");
        }
        err
    };

    if article_id.is_empty() {
        return Err(fail(None, None, ExportError::NoArticleId));
    }
    if journal_code.is_empty() {
        return Err(fail(None, Some(article_id), ExportError::NoJournalCode));
    }

    debug!(journal_code, article_id, "resolving journal and article");
    let Some(journal) = articles.find_journal(journal_code) else {
        let err = ExportError::JournalNotFound(journal_code.to_string());
        return Err(fail(None, Some(article_id), err));
    };
    let Some(article) = articles.find_article(&journal, article_id) else {
        let err = ExportError::ArticleNotFound {
            journal_code: journal_code.to_string(),
            article_id: article_id.to_string(),
        };
        return Err(fail(Some(&journal), Some(article_id), err));
    };

    if !export_folder.is_dir() {
        let err = ExportError::NoExportFolder(export_folder.to_path_buf());
        return Err(fail(Some(&journal), Some(article_id), err));
    }

    let config = match resolve_journal_config(settings, &journal) {
        Ok(config) => config,
        Err(err) => return Err(fail(Some(&journal), Some(article_id), err)),
    };

    let files = articles.files_for(&article);
    if files.is_empty() {
        let err = ExportError::NoFilesFound(article_id.to_string());
        return Err(fail(Some(&journal), Some(article_id), err));
    }
    debug!(count = files.len(), "collected article files");

    let prefix = format!("{}_{}", config.submission_partner_code, Uuid::new_v4());
    let archive_name = format!("{prefix}.{ARCHIVE_EXTENSION}");
    let archive_path = export_folder.join(&archive_name);
    let descriptor_path = export_folder.join(format!("{prefix}.{DESCRIPTOR_EXTENSION}"));

    let file_names = match write_archive(&archive_path, &files) {
        Ok(names) => names,
        Err(source) => {
            discard(&archive_path);
            let err = ExportError::ArchiveWriteFailed {
                path: archive_path,
                source,
            };
            return Err(fail(Some(&journal), Some(article_id), err));
        }
    };

    if let Err(source) =
        write_go_descriptor(&descriptor_path, &config, &archive_name, &file_names)
    {
        discard(&archive_path);
        discard(&descriptor_path);
        let err = ExportError::DescriptorWriteFailed {
            path: descriptor_path,
            source,
        };
        return Err(fail(Some(&journal), Some(article_id), err));
    }

    debug!(
        archive = %archive_path.display(),
        descriptor = %descriptor_path.display(),
        "export bundle written"
    );
    Ok(Bundle {
        archive_path,
        descriptor_path,
        file_names,
    })
}

/// Write every file into a fresh ZIP at `path`, returning the member names
/// in write order.
fn write_archive(path: &Path, files: &[ArticleFile]) -> Result<Vec<String>> {
    let file =
        File::create(path).with_context(|| format!("Failed to create archive file {:?}", path))?;
    let mut zip = zip::ZipWriter::new(file);
    let options: FileOptions<'_, ()> =
        FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut names = Vec::with_capacity(files.len());
    let mut taken = HashSet::with_capacity(files.len());
    for item in files {
        // The zip writer rejects duplicate member names; number the later
        // ones.
        let member = unique_member_name(sanitize_component(&item.display_name), &taken);
        zip.start_file(&member, options)
            .with_context(|| format!("Failed to add file {} to archive", member))?;

        let mut reader = File::open(&item.path)
            .with_context(|| format!("Failed to read article file {:?}", item.path))?;
        let mut buffer = [0u8; 8192];
        loop {
            let read = reader
                .read(&mut buffer)
                .with_context(|| format!("Failed to read from {:?}", item.path))?;
            if read == 0 {
                break;
            }
            zip.write_all(&buffer[..read])
                .with_context(|| format!("Failed to write {} into archive", member))?;
        }
        taken.insert(member.clone());
        names.push(member);
    }

    zip.finish().context("Failed to finalize archive")?;
    Ok(names)
}

/// Resolve a member-name collision by numbering the stem, keeping the
/// extension (`fig1.txt` collides into `fig1_2.txt`, then `fig1_3.txt`).
///
/// Duplicate display names and distinct names that flatten to the same
/// segment both land here.
fn unique_member_name(name: String, taken: &HashSet<String>) -> String {
    if !taken.contains(&name) {
        return name;
    }

    let (stem, extension) = match name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => (stem, Some(extension)),
        _ => (name.as_str(), None),
    };
    let mut counter = 2;
    loop {
        let candidate = match extension {
            Some(extension) => format!("{stem}_{counter}.{extension}"),
            None => format!("{stem}_{counter}"),
        };
        if !taken.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Best-effort removal of partial output so a failed export leaves no
/// bundle files behind.
fn discard(path: &Path) {
    if path.exists()
        && let Err(err) = fs::remove_file(path)
    {
        warn!(path = %path.display(), %err, "could not remove partial export file");
    }
}
