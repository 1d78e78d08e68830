// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 empack contributors

//! Turn author-facing display names into safe archive member names.

/// Windows refuses these device basenames even when an extension follows.
const RESERVED_BASENAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Produce a flat, filesystem-safe archive member name.
///
/// Display names come straight from submission systems and may carry
/// anything authors typed, including directory separators. The result:
/// - keeps only the final path segment (archive members stay flat),
/// - transliterates Unicode to ASCII with `deunicode`,
/// - allows ASCII alphanumerics plus `-`, `_`, and `.`, mapping the rest
///   to `_` and collapsing runs,
/// - trims trailing dots/spaces and guards reserved or empty names.
///
/// Multi-part extensions survive (`data.v1.2.tar.gz` stays itself), so
/// extractors on Windows and Unix both cope.
pub fn sanitize_component(value: &str) -> String {
    // Only the final path segment may name an archive member.
    let segment = value.rsplit(['/', '\\']).next().unwrap_or(value);
    let ascii = deunicode::deunicode(segment);

    let mut name = String::with_capacity(ascii.len());
    for ch in ascii.chars() {
        let mapped = if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
            ch
        } else {
            '_'
        };
        // Collapse runs of underscores and dots so names stay readable.
        if (mapped == '_' || mapped == '.') && name.ends_with(mapped) {
            continue;
        }
        name.push(mapped);
    }

    // A stray underscore directly before a dot reads badly in extensions.
    while let Some(pos) = name.find("_.") {
        name.remove(pos);
    }

    // Trailing dots and spaces are invalid on Windows.
    while name.ends_with('.') || name.ends_with(' ') {
        name.pop();
    }

    if name.is_empty() || name == "." || name == ".." {
        return "article_file".to_string();
    }

    let (base, extension) = match name.rsplit_once('.') {
        Some((base, extension)) if !base.is_empty() => (base, Some(extension)),
        _ => (name.as_str(), None),
    };
    if RESERVED_BASENAMES.contains(&base.to_ascii_uppercase().as_str()) {
        return match extension {
            Some(extension) => format!("{base}_.{extension}"),
            None => format!("{base}_"),
        };
    }

    name
}
