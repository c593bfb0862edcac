// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI module for catdeps
//!
//! Read-only inspection of a persisted dependency store: dependents,
//! dependencies, pins, role ownership and row counts.

pub mod commands;
pub mod inspect;
pub mod output;

pub use commands::{Cli, Commands};
pub use inspect::{
    handle_dependencies, handle_dependents, handle_owned_by, handle_pins, handle_stats,
};
