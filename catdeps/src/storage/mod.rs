// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Storage layer for the dependency relations
//!
//! A pluggable ordered key/value driver (sled on disk, or in memory) plus the
//! key encoding for the forward and backward indexes of both relations.

pub mod factory;
pub mod keys;
pub mod memory;
#[cfg(feature = "sled-backend")]
pub mod sled;
pub mod traits;
pub mod types;

pub use factory::{create_storage_driver, BoxedStorageDriver};
pub use keys::{row_id_of, IndexId, KeyBuilder, DEPEND_TREE};
pub use memory::MemoryStorageDriver;
pub use traits::{KvIter, StorageDriver, StorageTree, TreeStatistics};
pub use types::{BatchOp, StorageDriverError, StorageResult, StorageType};
