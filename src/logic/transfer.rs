// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 empack contributors

//! Transfer session registry.
//!
//! One [`TransferService`] per process serves export bundles: the first
//! request for an article builds the bundle, later requests reuse it, and
//! outcome callbacks log the result and queue the bundle's files for
//! deletion. The service is constructed with its collaborators and owns no
//! global state.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::error::ExportError;
use crate::logic::export::create_export_bundle;
use crate::models::bundle::Bundle;
use crate::models::transfer_log::TransferLogEntry;
use crate::store::{ArticleSource, SettingsSource, TransferLog};

/// Directory layout under the base data directory.
#[derive(Clone, Debug)]
pub struct TransferDirs {
    base: PathBuf,
}

impl TransferDirs {
    pub fn new(base: &Path) -> Self {
        Self {
            base: base.to_path_buf(),
        }
    }

    /// Outgoing bundles waiting for Editorial Manager pickup.
    pub fn export_dir(&self) -> PathBuf {
        self.base.join("export")
    }

    /// Inbound direction; provisioned now, consumed by a later release.
    pub fn import_dir(&self) -> PathBuf {
        self.base.join("import")
    }

    /// Append-only transfer log file.
    pub fn log_path(&self) -> PathBuf {
        self.base.join("transfer_log.jsonl")
    }

    /// Create the export and import directories if missing. Reruns are
    /// harmless.
    pub fn provision(&self) -> Result<()> {
        for dir in [self.export_dir(), self.import_dir()] {
            if dir.is_dir() {
                info!(dir = %dir.display(), "transfer directory already exists");
                continue;
            }
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create transfer directory {:?}", dir))?;
            info!(dir = %dir.display(), "created transfer directory");
        }
        Ok(())
    }
}

/// One cache slot per article key; the slot mutex serializes builds for
/// that key.
type BundleSlot = Arc<Mutex<Option<Arc<Bundle>>>>;

/// Serves export bundles, at most one build per article per process.
pub struct TransferService {
    articles: Arc<dyn ArticleSource>,
    settings: Arc<dyn SettingsSource>,
    log: Arc<dyn TransferLog>,
    export_folder: PathBuf,
    bundles: Mutex<HashMap<String, BundleSlot>>,
    files_to_delete: Mutex<Vec<PathBuf>>,
}

impl TransferService {
    pub fn new(
        articles: Arc<dyn ArticleSource>,
        settings: Arc<dyn SettingsSource>,
        log: Arc<dyn TransferLog>,
        export_folder: PathBuf,
    ) -> Self {
        Self {
            articles,
            settings,
            log,
            export_folder,
            bundles: Mutex::new(HashMap::new()),
            files_to_delete: Mutex::new(Vec::new()),
        }
    }

    fn bundle_key(journal_code: &str, article_id: &str) -> String {
        format!("{}-{}", journal_code.trim(), article_id.trim())
    }

    /// Return the cached bundle for the article, building it on first
    /// request.
    ///
    /// The build runs under the article's slot lock, so a concurrent request
    /// for the same article waits and then reuses the cached bundle instead
    /// of writing a second one. Failed builds are not cached: their slot is
    /// evicted again unless another request already waits on it, and the
    /// next request retries from scratch. The cache map itself is only
    /// locked long enough to fetch the slot, keeping distinct articles
    /// parallel.
    pub fn get_or_create(
        &self,
        journal_code: &str,
        article_id: &str,
    ) -> Result<Arc<Bundle>, ExportError> {
        let key = Self::bundle_key(journal_code, article_id);
        let slot = {
            let mut bundles = lock(&self.bundles);
            bundles.entry(key.clone()).or_default().clone()
        };

        let mut cached = lock(&slot);
        if let Some(bundle) = cached.as_ref() {
            debug!(journal_code, article_id, "reusing cached export bundle");
            return Ok(bundle.clone());
        }

        let built = create_export_bundle(
            self.articles.as_ref(),
            self.settings.as_ref(),
            self.log.as_ref(),
            &self.export_folder,
            journal_code,
            article_id,
        );
        let bundle = match built {
            Ok(bundle) => Arc::new(bundle),
            Err(err) => {
                self.evict_idle_slot(&key, &slot);
                return Err(err);
            }
        };
        *cached = Some(bundle.clone());
        Ok(bundle)
    }

    /// Drop the cache entry for `key` if nothing else holds its slot, so
    /// keys whose builds keep failing do not grow the map. A waiter's clone
    /// keeps the slot alive and the entry stays for its retry.
    fn evict_idle_slot(&self, key: &str, slot: &BundleSlot) {
        let mut bundles = lock(&self.bundles);
        if let Some(current) = bundles.get(key)
            && Arc::ptr_eq(current, slot)
            && Arc::strong_count(slot) == 2
        {
            bundles.remove(key);
        }
    }

    /// Path of the bundle archive, building the bundle if needed.
    pub fn export_zip_filepath(
        &self,
        journal_code: &str,
        article_id: &str,
    ) -> Result<PathBuf, ExportError> {
        Ok(self
            .get_or_create(journal_code, article_id)?
            .archive_path
            .clone())
    }

    /// Path of the bundle descriptor, building the bundle if needed.
    pub fn export_go_filepath(
        &self,
        journal_code: &str,
        article_id: &str,
    ) -> Result<PathBuf, ExportError> {
        Ok(self
            .get_or_create(journal_code, article_id)?
            .descriptor_path
            .clone())
    }

    /// Record a confirmed ingest, then clean up the delivered bundle.
    pub fn record_success(&self, journal_code: &str, article_id: &str) {
        self.log_export_success(journal_code, article_id);
        self.delete_export_files(journal_code, article_id);
    }

    /// Record a rejected ingest and clean up; a later request rebuilds.
    pub fn record_failure(&self, journal_code: &str, article_id: &str) {
        self.log_export_error(journal_code, article_id);
        self.delete_export_files(journal_code, article_id);
    }

    pub fn log_export_success(&self, journal_code: &str, article_id: &str) {
        let message = format!(
            "Export bundle for article '{}' accepted by Editorial Manager",
            article_id
        );
        self.append_outcome(journal_code, article_id, true, message);
    }

    pub fn log_export_error(&self, journal_code: &str, article_id: &str) {
        let message = format!(
            "Editorial Manager did not ingest the export bundle for article '{}'",
            article_id
        );
        self.append_outcome(journal_code, article_id, false, message);
    }

    /// Drop the cache entry and queue the bundle's files for deletion.
    ///
    /// Every queued path is attempted right away; a path that exists but
    /// cannot be removed stays queued for the next sweep instead of
    /// surfacing an error. Unknown articles are a quiet no-op.
    pub fn delete_export_files(&self, journal_code: &str, article_id: &str) {
        let key = Self::bundle_key(journal_code, article_id);
        let Some(slot) = lock(&self.bundles).remove(&key) else {
            return;
        };
        if let Some(bundle) = lock(&slot).take() {
            let mut queue = lock(&self.files_to_delete);
            queue.push(bundle.archive_path.clone());
            queue.push(bundle.descriptor_path.clone());
        }
        self.sweep_deletions();
    }

    /// Delete queued files, keeping the ones that still refuse to go.
    fn sweep_deletions(&self) {
        let mut queue = lock(&self.files_to_delete);
        queue.retain(|path| !remove_bundle_file(path));
    }

    fn append_outcome(&self, journal_code: &str, article_id: &str, success: bool, message: String) {
        let journal = self.articles.find_journal(journal_code);
        let article = journal
            .as_ref()
            .and_then(|journal| self.articles.find_article(journal, article_id));
        let entry = TransferLogEntry::export(
            journal.map(|journal| journal.code),
            article.map(|article| article.id),
            message,
            success,
        );
        if let Err(err) = self.log.append(entry) {
            warn!(%err, "could not persist transfer log entry");
        }
    }
}

/// True when the path no longer exists afterwards; a file already gone
/// counts as deleted.
fn remove_bundle_file(path: &Path) -> bool {
    if !path.exists() {
        return true;
    }
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "deleted export file");
            true
        }
        Err(err) => {
            warn!(path = %path.display(), %err, "could not delete export file, keeping it queued");
            false
        }
    }
}

/// Lock helper that recovers the guard from a poisoned mutex.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use tempfile::TempDir;

    use super::{TransferDirs, TransferService, lock};
    use crate::error::ExportError;
    use crate::logic::settings::{SETTINGS_GROUP, SettingKey};
    use crate::models::article::{Article, ArticleFile, Journal};
    use crate::store::library::{ArticleRecord, JournalRecord, Library};
    use crate::store::transfer_log::MemoryTransferLog;
    use crate::store::{ArticleSource, SettingsSource, TransferLog};

    // Counts file enumerations so tests can prove how often a build ran.
    struct CountingSource {
        inner: Library,
        enumerations: AtomicUsize,
    }

    impl CountingSource {
        fn new(inner: Library) -> Self {
            Self {
                inner,
                enumerations: AtomicUsize::new(0),
            }
        }
    }

    impl ArticleSource for CountingSource {
        fn find_journal(&self, code: &str) -> Option<Journal> {
            self.inner.find_journal(code)
        }

        fn find_article(&self, journal: &Journal, article_id: &str) -> Option<Article> {
            self.inner.find_article(journal, article_id)
        }

        fn files_for(&self, article: &Article) -> Vec<ArticleFile> {
            self.enumerations.fetch_add(1, Ordering::SeqCst);
            self.inner.files_for(article)
        }
    }

    // Settings fake whose values can change between calls.
    struct MutableSettings {
        values: std::sync::Mutex<BTreeMap<String, String>>,
    }

    impl SettingsSource for MutableSettings {
        fn setting(&self, group: &str, name: &str, _journal_code: &str) -> Option<String> {
            if group != SETTINGS_GROUP {
                return None;
            }
            self.values.lock().unwrap().get(name).cloned()
        }
    }

    fn source_file(dir: &Path, name: &str, contents: &str) -> ArticleFile {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        ArticleFile {
            display_name: name.to_string(),
            path,
        }
    }

    fn seeded_library(source_dir: &Path) -> Library {
        let values = BTreeMap::from([
            ("license_code".to_string(), "LCODE".to_string()),
            ("journal_code".to_string(), "JOURNAL".to_string()),
            ("submission_partner_code".to_string(), "PARTNER".to_string()),
        ]);
        Library {
            journals: vec![JournalRecord {
                code: "TEST".into(),
                name: "Test Journal".into(),
                settings: BTreeMap::from([(SETTINGS_GROUP.to_string(), values)]),
                articles: vec![ArticleRecord {
                    id: "11".into(),
                    title: "A study of studies".into(),
                    manuscript_files: vec![source_file(source_dir, "manuscript.txt", "body")],
                    data_figure_files: vec![
                        source_file(source_dir, "fig1.txt", "f1"),
                        source_file(source_dir, "fig2.txt", "f2"),
                    ],
                    ..Default::default()
                }],
            }],
        }
    }

    struct Fixture {
        service: TransferService,
        source: Arc<CountingSource>,
        log: Arc<MemoryTransferLog>,
        export_dir: PathBuf,
    }

    fn fixture(tmp: &TempDir) -> Fixture {
        let export_dir = tmp.path().join("export");
        fs::create_dir_all(&export_dir).unwrap();

        let library = seeded_library(tmp.path());
        let source = Arc::new(CountingSource::new(library.clone()));
        let log = Arc::new(MemoryTransferLog::new());
        let service = TransferService::new(
            source.clone(),
            Arc::new(library),
            log.clone(),
            export_dir.clone(),
        );

        Fixture {
            service,
            source,
            log,
            export_dir,
        }
    }

    fn dir_count(dir: &Path) -> usize {
        fs::read_dir(dir).unwrap().count()
    }

    // The second request reuses the cached bundle without another build.
    #[test]
    fn get_or_create_builds_once_per_article() {
        let tmp = TempDir::new().unwrap();
        let fx = fixture(&tmp);

        let first = fx.service.get_or_create("TEST", "11").unwrap();
        let second = fx.service.get_or_create("TEST", "11").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fx.source.enumerations.load(Ordering::SeqCst), 1);
        assert_eq!(dir_count(&fx.export_dir), 2);
    }

    // The convenience accessors resolve to the same cached bundle.
    #[test]
    fn filepath_accessors_share_the_cached_bundle() {
        let tmp = TempDir::new().unwrap();
        let fx = fixture(&tmp);

        let zip = fx.service.export_zip_filepath("TEST", "11").unwrap();
        let go = fx.service.export_go_filepath("TEST", "11").unwrap();

        let zip_name = zip.file_name().unwrap().to_str().unwrap();
        let go_name = go.file_name().unwrap().to_str().unwrap();
        assert_eq!(
            zip_name.strip_suffix(".zip").unwrap(),
            go_name.strip_suffix(".go.xml").unwrap()
        );
        assert_eq!(fx.source.enumerations.load(Ordering::SeqCst), 1);
    }

    // A failed build is not cached; fixing the configuration lets the next
    // request succeed.
    #[test]
    fn get_or_create_retries_after_a_failed_build() {
        let tmp = TempDir::new().unwrap();
        let export_dir = tmp.path().join("export");
        fs::create_dir_all(&export_dir).unwrap();

        let library = Arc::new(seeded_library(tmp.path()));
        let settings = Arc::new(MutableSettings {
            values: std::sync::Mutex::new(BTreeMap::from([
                ("license_code".to_string(), "LCODE".to_string()),
                ("journal_code".to_string(), "JOURNAL".to_string()),
            ])),
        });
        let service = TransferService::new(
            library.clone(),
            settings.clone(),
            Arc::new(MemoryTransferLog::new()),
            export_dir,
        );

        let err = service.get_or_create("TEST", "11").unwrap_err();
        assert!(matches!(
            err,
            ExportError::MissingSetting(SettingKey::SubmissionPartnerCode)
        ));

        settings
            .values
            .lock()
            .unwrap()
            .insert("submission_partner_code".into(), "PARTNER".into());

        let bundle = service.get_or_create("TEST", "11").unwrap();
        assert_eq!(bundle.file_names.len(), 3);
    }

    // Failed builds leave no cache slot behind, however many keys fail.
    #[test]
    fn get_or_create_drops_the_slot_after_a_failed_build() {
        let tmp = TempDir::new().unwrap();
        let fx = fixture(&tmp);

        let err = fx.service.get_or_create("TEST", "99").unwrap_err();
        assert!(matches!(err, ExportError::ArticleNotFound { .. }));
        let err = fx.service.get_or_create("NOPE", "11").unwrap_err();
        assert!(matches!(err, ExportError::JournalNotFound(_)));
        assert!(lock(&fx.service.bundles).is_empty());

        fx.service.get_or_create("TEST", "11").unwrap();
        assert_eq!(lock(&fx.service.bundles).len(), 1);
    }

    // Cleanup removes both files, and the next request builds afresh.
    #[test]
    fn delete_export_files_removes_bundle_and_cache_entry() {
        let tmp = TempDir::new().unwrap();
        let fx = fixture(&tmp);

        let first = fx.service.get_or_create("TEST", "11").unwrap();
        assert!(first.archive_path.is_file());
        assert!(first.descriptor_path.is_file());

        fx.service.delete_export_files("TEST", "11");

        assert!(!first.archive_path.exists());
        assert!(!first.descriptor_path.exists());
        assert_eq!(dir_count(&fx.export_dir), 0);

        let rebuilt = fx.service.get_or_create("TEST", "11").unwrap();
        assert_ne!(rebuilt.archive_path, first.archive_path);
        assert_eq!(fx.source.enumerations.load(Ordering::SeqCst), 2);
    }

    // Cleanup for an article that was never built is a quiet no-op.
    #[test]
    fn delete_export_files_ignores_unknown_articles() {
        let tmp = TempDir::new().unwrap();
        let fx = fixture(&tmp);

        fx.service.delete_export_files("TEST", "99");

        assert!(lock(&fx.service.files_to_delete).is_empty());
    }

    // The success callback logs an accepted entry and cleans the folder.
    #[test]
    fn record_success_logs_and_cleans_up() {
        let tmp = TempDir::new().unwrap();
        let fx = fixture(&tmp);

        fx.service.get_or_create("TEST", "11").unwrap();
        fx.service.record_success("TEST", "11");

        let entries = fx.log.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].success);
        assert_eq!(entries[0].journal_code.as_deref(), Some("TEST"));
        assert_eq!(entries[0].article_id.as_deref(), Some("11"));
        assert_eq!(dir_count(&fx.export_dir), 0);
    }

    // The failure callback logs a rejected entry and also cleans up, so a
    // later request starts over.
    #[test]
    fn record_failure_logs_and_cleans_up() {
        let tmp = TempDir::new().unwrap();
        let fx = fixture(&tmp);

        fx.service.get_or_create("TEST", "11").unwrap();
        fx.service.record_failure("TEST", "11");

        let entries = fx.log.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].success);
        assert_eq!(dir_count(&fx.export_dir), 0);
    }

    // Two threads asking for the same article end up with one bundle and
    // one pair of files.
    #[test]
    fn concurrent_requests_share_one_bundle() {
        let tmp = TempDir::new().unwrap();
        let fx = fixture(&tmp);
        let service = &fx.service;

        let (first, second) = thread::scope(|scope| {
            let a = scope.spawn(|| service.get_or_create("TEST", "11"));
            let b = scope.spawn(|| service.get_or_create("TEST", "11"));
            (a.join().unwrap().unwrap(), b.join().unwrap().unwrap())
        });

        assert_eq!(first.archive_path, second.archive_path);
        assert_eq!(fx.source.enumerations.load(Ordering::SeqCst), 1);
        assert_eq!(dir_count(&fx.export_dir), 2);
    }

    // Files that cannot be deleted stay queued and go on the next sweep.
    #[test]
    fn sweep_retries_files_that_could_not_be_deleted() {
        let tmp = TempDir::new().unwrap();
        let fx = fixture(&tmp);

        let bundle = fx.service.get_or_create("TEST", "11").unwrap();

        // A directory at the archive path makes remove_file fail.
        fs::remove_file(&bundle.archive_path).unwrap();
        fs::create_dir(&bundle.archive_path).unwrap();
        fx.service.delete_export_files("TEST", "11");

        assert!(!bundle.descriptor_path.exists());
        assert!(bundle.archive_path.is_dir());
        assert_eq!(lock(&fx.service.files_to_delete).len(), 1);

        fs::remove_dir(&bundle.archive_path).unwrap();
        fs::write(&bundle.archive_path, "stale").unwrap();
        fx.service.sweep_deletions();

        assert!(!bundle.archive_path.exists());
        assert!(lock(&fx.service.files_to_delete).is_empty());
    }

    // Provisioning creates both directories and tolerates reruns.
    #[test]
    fn provision_creates_directories_once() {
        let tmp = TempDir::new().unwrap();
        let dirs = TransferDirs::new(tmp.path());

        dirs.provision().unwrap();
        assert!(dirs.export_dir().is_dir());
        assert!(dirs.import_dir().is_dir());

        dirs.provision().unwrap();
    }
}
