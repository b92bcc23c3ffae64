// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Layer (`glitchify-core`)
//!
//! Pure types and gateway interfaces. Nothing in here talks to the network;
//! concrete adapters live in `crate::infrastructure`.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`envelope`] | `FilterRequest` / `FilterResponse` wire contract |
//! | [`inference`] | Inference gateway trait and the fixed style preset |
//! | [`storage`] | Object store gateway trait, `ImageAsset`, `StoredObjectRef` |
//! | [`config`] | YAML + environment configuration |

pub mod config;
pub mod envelope;
pub mod inference;
pub mod storage;
