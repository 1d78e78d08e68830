// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 empack contributors

//! Core export pipeline: settings resolution, bundle building, descriptor
//! generation, and the transfer session registry.

pub mod descriptor;
pub mod export;
pub mod settings;
pub mod transfer;
