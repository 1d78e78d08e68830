// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 empack contributors

//! Shared helper utilities.

pub mod sanitize_component;

/// Sanitize display names into flat, filesystem-safe member names.
pub use sanitize_component::sanitize_component;
