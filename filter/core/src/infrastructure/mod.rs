// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Infrastructure
//!
//! Concrete gateway adapters for the domain interfaces.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Anti-Corruption Layer implementations for the inference
//!   provider and the temporary object store

pub mod inference;
pub mod storage;
