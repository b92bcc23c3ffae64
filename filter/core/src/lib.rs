// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Glitchify Core
//!
//! Server side of the image stylization pipeline plus the gateway
//! abstractions shared with the client SDK.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain types, the filter request handler, gateway adapters
//!   and the HTTP surface

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
