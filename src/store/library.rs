// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 empack contributors

//! JSON-backed article library: journals, their settings, and articles.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use super::{ArticleSource, SettingsSource};
use crate::models::article::{Article, ArticleFile, Journal};

/// On-disk library document listing every journal this installation serves.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Library {
    pub journals: Vec<JournalRecord>,
}

/// One journal with its settings groups and articles.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JournalRecord {
    pub code: String,
    #[serde(default)]
    pub name: String,
    /// Settings group name to setting name to value.
    #[serde(default)]
    pub settings: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    pub articles: Vec<ArticleRecord>,
}

/// One article and its exportable files, grouped by category.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub manuscript_files: Vec<ArticleFile>,
    #[serde(default)]
    pub data_figure_files: Vec<ArticleFile>,
    #[serde(default)]
    pub source_files: Vec<ArticleFile>,
    #[serde(default)]
    pub supplementary_files: Vec<ArticleFile>,
}

impl Library {
    /// Load a library document from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read library file {:?}", path))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse library file {:?}", path))
    }

    /// Write the library document back as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_vec_pretty(self)?;
        fs::write(path, raw).with_context(|| format!("Failed to write library file {:?}", path))
    }

    /// Update one setting value for a journal, creating the group and name
    /// as needed.
    pub fn set_setting(
        &mut self,
        journal_code: &str,
        group: &str,
        name: &str,
        value: &str,
    ) -> Result<()> {
        let journal = self
            .journals
            .iter_mut()
            .find(|journal| journal.code == journal_code)
            .ok_or_else(|| anyhow!("No journal with code '{}' in the library", journal_code))?;
        journal
            .settings
            .entry(group.to_string())
            .or_default()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn record(&self, code: &str) -> Option<&JournalRecord> {
        self.journals.iter().find(|journal| journal.code == code)
    }
}

impl ArticleSource for Library {
    fn find_journal(&self, code: &str) -> Option<Journal> {
        self.record(code).map(|record| Journal {
            code: record.code.clone(),
            name: record.name.clone(),
        })
    }

    fn find_article(&self, journal: &Journal, article_id: &str) -> Option<Article> {
        let record = self.record(&journal.code)?;
        record
            .articles
            .iter()
            .find(|article| article.id == article_id)
            .map(|article| Article {
                journal_code: journal.code.clone(),
                id: article.id.clone(),
                title: article.title.clone(),
            })
    }

    fn files_for(&self, article: &Article) -> Vec<ArticleFile> {
        let Some(record) = self.record(&article.journal_code) else {
            return Vec::new();
        };
        let Some(found) = record.articles.iter().find(|a| a.id == article.id) else {
            return Vec::new();
        };

        // Category order is part of the export contract.
        let mut files = Vec::with_capacity(
            found.manuscript_files.len()
                + found.data_figure_files.len()
                + found.source_files.len()
                + found.supplementary_files.len(),
        );
        files.extend_from_slice(&found.manuscript_files);
        files.extend_from_slice(&found.data_figure_files);
        files.extend_from_slice(&found.source_files);
        files.extend_from_slice(&found.supplementary_files);
        files
    }
}

impl SettingsSource for Library {
    fn setting(&self, group: &str, name: &str, journal_code: &str) -> Option<String> {
        self.record(journal_code)?.settings.get(group)?.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::Library;
    use crate::logic::settings::SETTINGS_GROUP;
    use crate::store::{ArticleSource, SettingsSource};

    fn sample() -> Library {
        let raw = r#"{
            "journals": [
                {
                    "code": "TEST",
                    "name": "Test Journal",
                    "settings": {
                        "editorial_manager_transfer": {
                            "license_code": "LCODE",
                            "journal_code": "JOURNAL",
                            "submission_partner_code": "PARTNER"
                        }
                    },
                    "articles": [
                        {
                            "id": "11",
                            "title": "A study of studies",
                            "manuscript_files": [
                                { "display_name": "manuscript.txt", "path": "/data/files/1" }
                            ],
                            "data_figure_files": [
                                { "display_name": "fig1.txt", "path": "/data/files/2" },
                                { "display_name": "fig2.txt", "path": "/data/files/3" }
                            ],
                            "supplementary_files": [
                                { "display_name": "supp.csv", "path": "/data/files/4" }
                            ]
                        }
                    ]
                },
                { "code": "OTHER" }
            ]
        }"#;
        serde_json::from_str(raw).unwrap()
    }

    // Journals and articles resolve by their codes; unknown codes do not.
    #[test]
    fn lookups_resolve_by_code() {
        let library = sample();

        let journal = library.find_journal("TEST").unwrap();
        assert_eq!(journal.name, "Test Journal");
        assert!(library.find_journal("NOPE").is_none());

        let article = library.find_article(&journal, "11").unwrap();
        assert_eq!(article.title, "A study of studies");
        assert!(library.find_article(&journal, "12").is_none());
    }

    // File enumeration concatenates the categories in their fixed order.
    #[test]
    fn files_for_preserves_category_order() {
        let library = sample();
        let journal = library.find_journal("TEST").unwrap();
        let article = library.find_article(&journal, "11").unwrap();

        let names: Vec<_> = library
            .files_for(&article)
            .into_iter()
            .map(|file| file.display_name)
            .collect();

        assert_eq!(names, ["manuscript.txt", "fig1.txt", "fig2.txt", "supp.csv"]);
    }

    // Settings are scoped to their journal; another journal sees nothing.
    #[test]
    fn settings_are_scoped_per_journal() {
        let library = sample();

        assert_eq!(
            library.setting(SETTINGS_GROUP, "license_code", "TEST").as_deref(),
            Some("LCODE")
        );
        assert_eq!(library.setting(SETTINGS_GROUP, "license_code", "OTHER"), None);
        assert_eq!(library.setting("unrelated_group", "license_code", "TEST"), None);
    }

    // Updated settings survive a save/load round-trip.
    #[test]
    fn set_setting_round_trips_through_disk() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("library.json");
        let mut library = sample();

        library
            .set_setting("OTHER", SETTINGS_GROUP, "license_code", "OTHERLIC")
            .unwrap();
        library.save(&path).unwrap();

        let reloaded = Library::from_path(&path).unwrap();
        assert_eq!(
            reloaded.setting(SETTINGS_GROUP, "license_code", "OTHER").as_deref(),
            Some("OTHERLIC")
        );
    }

    // Updating a journal the library does not know is an error.
    #[test]
    fn set_setting_rejects_unknown_journals() {
        let mut library = sample();

        let result = library.set_setting("NOPE", SETTINGS_GROUP, "license_code", "X");

        assert!(result.is_err());
    }
}
