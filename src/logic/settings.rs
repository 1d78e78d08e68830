// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 empack contributors

//! Per-journal transfer configuration lookup.

use std::fmt;

use tracing::debug;

use crate::error::ExportError;
use crate::models::article::Journal;
use crate::store::SettingsSource;

/// Settings group holding the per-journal transfer configuration.
pub const SETTINGS_GROUP: &str = "editorial_manager_transfer";

/// The closed set of settings every export needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingKey {
    LicenseCode,
    JournalCode,
    SubmissionPartnerCode,
}

impl SettingKey {
    /// All keys, in resolution order.
    pub const ALL: [SettingKey; 3] = [
        SettingKey::LicenseCode,
        SettingKey::JournalCode,
        SettingKey::SubmissionPartnerCode,
    ];

    /// Setting name as stored in the settings group.
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::LicenseCode => "license_code",
            SettingKey::JournalCode => "journal_code",
            SettingKey::SubmissionPartnerCode => "submission_partner_code",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully resolved transfer configuration for one journal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JournalConfig {
    pub license_code: String,
    pub journal_code: String,
    pub submission_partner_code: String,
}

/// Resolve the three required settings for `journal`.
///
/// A missing or blank value fails the whole resolution with the offending
/// key; there is no partial configuration and no retry.
pub fn resolve_journal_config(
    settings: &dyn SettingsSource,
    journal: &Journal,
) -> Result<JournalConfig, ExportError> {
    let resolve = |key: SettingKey| -> Result<String, ExportError> {
        let value = settings
            .setting(SETTINGS_GROUP, key.as_str(), &journal.code)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ExportError::MissingSetting(key))?;
        debug!(journal = %journal.code, setting = %key, "resolved transfer setting");
        Ok(value)
    };

    Ok(JournalConfig {
        license_code: resolve(SettingKey::LicenseCode)?,
        journal_code: resolve(SettingKey::JournalCode)?,
        submission_partner_code: resolve(SettingKey::SubmissionPartnerCode)?,
    })
}
