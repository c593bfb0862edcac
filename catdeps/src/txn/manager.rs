// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Dependency manager
//!
//! Owns the storage driver, the lock table and the row id allocator, and
//! hands out transactions bound to one database.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::address::Oid;
use crate::catalog::Collaborators;
use crate::config::DependConfig;
use crate::depend::{DependencyKind, LocalDependRow, SharedDependRow, SharedDependencyKind};
use crate::error::{DependError, DependResult};
use crate::storage::{
    create_storage_driver, row_id_of, BoxedStorageDriver, IndexId, StorageTree, DEPEND_TREE,
};

use super::lock::LockManager;
use super::transaction::Transaction;

/// State shared by the manager and every transaction it started
pub(crate) struct ManagerShared {
    pub(crate) config: DependConfig,
    pub(crate) tree: Box<dyn StorageTree>,
    pub(crate) locks: LockManager,
    pub(crate) collaborators: Collaborators,
    next_row_id: AtomicU64,
    driver: Mutex<BoxedStorageDriver>,
}

impl ManagerShared {
    pub(crate) fn allocate_row_id(&self) -> u64 {
        self.next_row_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Row counts of the persisted relations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStatistics {
    pub local_edges: u64,
    pub local_pins: u64,
    pub shared_edges: u64,
    pub shared_pins: u64,
    pub databases: u64,
    pub size_bytes: u64,
}

/// Entry point: opens the store and starts transactions
pub struct DependencyManager {
    shared: Arc<ManagerShared>,
}

impl DependencyManager {
    /// Open (or create) the dependency store described by `config`.
    pub fn open(config: DependConfig, collaborators: Collaborators) -> DependResult<Self> {
        config.validate()?;
        let driver = create_storage_driver(config.storage.storage_type, &config.storage.path)?;
        let tree = driver.open_tree(DEPEND_TREE)?;

        let mut max_row_id = 0u64;
        for item in tree.iter()? {
            let (key, _) = item?;
            if let Some(row_id) = row_id_of(&key) {
                max_row_id = max_row_id.max(row_id);
            }
        }

        log::info!(
            "Opened dependency store ({} backend at {}), next row id {}",
            config.storage.storage_type,
            config.storage.path.display(),
            max_row_id + 1
        );

        let locks = LockManager::new(config.lock_timeout());
        Ok(Self {
            shared: Arc::new(ManagerShared {
                config,
                tree,
                locks,
                collaborators,
                next_row_id: AtomicU64::new(max_row_id + 1),
                driver: Mutex::new(driver),
            }),
        })
    }

    /// Start a transaction whose "current database" is `database_id`.
    pub fn begin(&self, database_id: Oid) -> DependResult<Transaction> {
        if database_id == 0 {
            return Err(DependError::IntegrityViolation(
                "a transaction must be bound to a valid database".to_string(),
            ));
        }
        Ok(Transaction::new(Arc::clone(&self.shared), database_id))
    }

    pub fn config(&self) -> &DependConfig {
        &self.shared.config
    }

    /// Count committed rows per relation. Reads storage directly, bypassing
    /// any in-flight transaction.
    pub fn statistics(&self) -> DependResult<StoreStatistics> {
        let mut stats = StoreStatistics::default();
        let mut databases = std::collections::BTreeSet::new();

        for item in self.shared.tree.scan_prefix(&[IndexId::LocalForward.tag()])? {
            let (key, value) = item?;
            stats.size_bytes += (key.len() + value.len()) as u64;
            let row: LocalDependRow = bincode::deserialize(&value)?;
            databases.insert(row.database_id);
            if row.kind == DependencyKind::Pin {
                stats.local_pins += 1;
            } else {
                stats.local_edges += 1;
            }
        }
        for item in self.shared.tree.scan_prefix(&[IndexId::SharedForward.tag()])? {
            let (key, value) = item?;
            stats.size_bytes += (key.len() + value.len()) as u64;
            let row: SharedDependRow = bincode::deserialize(&value)?;
            if row.database_id != 0 {
                databases.insert(row.database_id);
            }
            if row.kind == SharedDependencyKind::Pin {
                stats.shared_pins += 1;
            } else {
                stats.shared_edges += 1;
            }
        }
        stats.databases = databases.len() as u64;
        Ok(stats)
    }

    /// Flush everything to disk
    pub fn shutdown(&self) -> DependResult<()> {
        self.shared.tree.flush()?;
        self.shared.driver.lock().shutdown()?;
        log::info!("Dependency store shut down");
        Ok(())
    }
}

impl std::fmt::Debug for DependencyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyManager")
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}
