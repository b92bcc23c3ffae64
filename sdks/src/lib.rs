// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Glitchify Rust SDK
//!
//! Upload an image, run the video-game filter on it and fetch the result.

pub mod client;
pub mod download;
pub mod error;
pub mod orchestrator;
pub mod state;

pub use client::{ClientError, FilterApi, GlitchifyClient};
pub use download::{DownloadOrchestrator, LocalResource};
pub use error::{Notification, NotificationLevel, UserError};
pub use orchestrator::{ApplyOrchestrator, FilterOutcome, TemporaryObject};
pub use state::{ApplyPhase, DownloadPhase};
