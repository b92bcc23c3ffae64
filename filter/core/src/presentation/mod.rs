// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`glitchify-core`)
//!
//! HTTP surface that translates external requests into application
//! service calls. **No business logic lives here** - the filter semantics
//! belong to `crate::application::FilterRequestHandler`.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP (Axum) | `POST /api/apply-filter` and `GET /health` |

pub mod api;

pub use api::app;
