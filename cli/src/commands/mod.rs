// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for Glitchify CLI

pub mod apply;
pub mod config;
pub mod download;

pub use self::apply::ApplyArgs;
pub use self::config::ConfigCommand;
pub use self::download::DownloadArgs;
