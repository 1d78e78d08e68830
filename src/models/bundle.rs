// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 empack contributors

//! The finished transfer bundle handed back to callers.

use std::path::PathBuf;

/// Successful outcome of one article export build.
///
/// A value of this type always denotes a bundle that was fully written:
/// the archive exists, the descriptor exists, and `file_names` lists the
/// archive members in the order they were stored. Bundles are shared as
/// `Arc<Bundle>` once the registry caches them and are never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bundle {
    pub archive_path: PathBuf,
    pub descriptor_path: PathBuf,
    pub file_names: Vec<String>,
}
