// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 empack contributors

//! Domain layer: pure data types shared by the export pipeline and stores.

pub mod article;
pub mod bundle;
pub mod transfer_log;
