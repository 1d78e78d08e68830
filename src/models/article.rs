// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 empack contributors

//! Journal and article domain types resolved from the library.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A journal known to the library, identified by its short code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Journal {
    pub code: String,
    pub name: String,
}

/// An article resolved within a journal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Article {
    pub journal_code: String,
    pub id: String,
    pub title: String,
}

/// One exportable file belonging to an article.
///
/// `display_name` is what authors and editors see and becomes the archive
/// member name after sanitization; `path` locates the bytes on disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleFile {
    pub display_name: String,
    pub path: PathBuf,
}
