// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Transaction management for the dependency stores
//!
//! Every store operation runs inside a [`Transaction`] bound to one database.
//!
//! # Features
//! - Statement-level visibility through a command counter
//! - Atomic commit of all index writes, rollback on abort or drop
//! - Object, relation and row locks held until the transaction ends
//! - Scoped extension-script context

pub mod extension;
pub mod lock;
pub mod manager;
pub mod state;
pub mod transaction;

pub use extension::ExtensionScriptGuard;
pub use lock::{LockManager, LockMode, LockTag};
pub use manager::{DependencyManager, StoreStatistics};
pub use state::{CommandId, TransactionId, TransactionStatus};
pub use transaction::Transaction;
