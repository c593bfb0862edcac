// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Transactions over the dependency relations
//!
//! A transaction buffers its writes in an overlay of per-key versions, each
//! tagged with the command id that wrote it. Reads merge committed storage
//! with the overlay versions written by *earlier* commands, so a statement
//! never sees its own changes until [`Transaction::command_counter_increment`]
//! is called. Commit applies the final state of every touched key as one
//! atomic batch; abort simply forgets the overlay.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use crate::address::{CatalogId, ObjectAddress, Oid};
use crate::catalog::{CascadeEngine, CatalogMutator, ObjectCatalog};
use crate::config::DependConfig;
use crate::error::{DependError, DependResult};
use crate::storage::BatchOp;

use super::lock::{LockMode, LockTag};
use super::manager::ManagerShared;
use super::state::{CommandId, TransactionId, TransactionStatus};

#[derive(Debug, Clone)]
struct Version {
    command_id: CommandId,
    value: Option<Vec<u8>>,
}

pub struct Transaction {
    id: TransactionId,
    database_id: Oid,
    status: TransactionStatus,
    command_id: CommandId,
    overlay: BTreeMap<Vec<u8>, Vec<Version>>,
    extension_context: Option<Oid>,
    shared: Arc<ManagerShared>,
}

impl Transaction {
    pub(crate) fn new(shared: Arc<ManagerShared>, database_id: Oid) -> Self {
        let id = TransactionId::new();
        log::debug!("{} started in database {}", id, database_id);
        Self {
            id,
            database_id,
            status: TransactionStatus::Active,
            command_id: 0,
            overlay: BTreeMap::new(),
            extension_context: None,
            shared,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// The database this transaction runs in
    pub fn database_id(&self) -> Oid {
        self.database_id
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn command_id(&self) -> CommandId {
        self.command_id
    }

    pub fn config(&self) -> &DependConfig {
        &self.shared.config
    }

    pub fn catalog(&self) -> Arc<dyn ObjectCatalog> {
        Arc::clone(&self.shared.collaborators.catalog)
    }

    pub(crate) fn mutator(&self) -> Arc<dyn CatalogMutator> {
        Arc::clone(&self.shared.collaborators.mutator)
    }

    pub(crate) fn cascade(&self) -> Arc<dyn CascadeEngine> {
        Arc::clone(&self.shared.collaborators.cascade)
    }

    /// Extension whose script is currently running, if any
    pub fn creating_extension(&self) -> Option<Oid> {
        self.extension_context
    }

    pub(super) fn set_extension_context(&mut self, extension: Option<Oid>) {
        self.extension_context = extension;
    }

    pub(crate) fn ensure_active(&self) -> DependResult<()> {
        if self.status.is_active() {
            Ok(())
        } else {
            Err(DependError::TransactionFinished(format!(
                "{} is {}",
                self.id, self.status
            )))
        }
    }

    /// Make the writes of all previous commands visible to later ones
    pub fn command_counter_increment(&mut self) {
        self.command_id += 1;
    }

    // ---- locking ----

    /// Lock a catalog object until the transaction ends
    pub fn lock_object(&mut self, object: &ObjectAddress, mode: LockMode) -> DependResult<()> {
        self.ensure_active()?;
        let db = if self.catalog().is_shared_catalog(object.catalog) {
            0
        } else {
            self.database_id
        };
        let tag = LockTag::Object {
            db,
            catalog: object.catalog,
            object_id: object.object_id,
        };
        self.shared.locks.acquire(self.id, tag, mode)
    }

    /// Lock one of the dependency relations. The shared relation is cluster
    /// wide, the local one is per database.
    pub(crate) fn lock_relation(&mut self, relation: CatalogId, mode: LockMode) -> DependResult<()> {
        self.ensure_active()?;
        let db = if relation.is_shared() {
            0
        } else {
            self.database_id
        };
        self.shared
            .locks
            .acquire(self.id, LockTag::Relation { db, relation }, mode)
    }

    /// Lock a referenced object and verify it still exists
    pub(crate) fn lock_and_check_object(&mut self, object: &ObjectAddress) -> DependResult<()> {
        let whole = object.whole_object();
        self.lock_object(&whole, LockMode::AccessShare)?;
        if !self.catalog().object_exists(&whole) {
            return Err(DependError::ConcurrentlyDropped(whole.to_string()));
        }
        Ok(())
    }

    /// Take the row lock needed to update or delete a stored row, then make
    /// sure nobody committed a change to it since we read it.
    pub(crate) fn lock_row_for_update(
        &mut self,
        relation: CatalogId,
        row_id: u64,
        key: &[u8],
        expected: &[u8],
    ) -> DependResult<()> {
        self.ensure_active()?;
        self.shared.locks.acquire(
            self.id,
            LockTag::Tuple { relation, row_id },
            LockMode::Exclusive,
        )?;

        // Rows we already wrote are covered by the tuple lock taken back then
        if self.overlay.contains_key(key) {
            return Ok(());
        }
        match self.shared.tree.get(key)? {
            Some(current) if current == expected => Ok(()),
            Some(_) => Err(DependError::TupleConcurrentlyUpdated(format!(
                "row {} of relation {}",
                row_id, relation
            ))),
            None => Err(DependError::TupleConcurrentlyUpdated(format!(
                "row {} of relation {} was deleted",
                row_id, relation
            ))),
        }
    }

    pub(crate) fn allocate_row_id(&self) -> u64 {
        self.shared.allocate_row_id()
    }

    // ---- reads ----

    fn visible_version(&self, versions: &[Version]) -> Option<Option<Vec<u8>>> {
        versions
            .iter()
            .rev()
            .find(|v| v.command_id < self.command_id)
            .map(|v| v.value.clone())
    }

    pub(crate) fn get(&self, key: &[u8]) -> DependResult<Option<Vec<u8>>> {
        if let Some(versions) = self.overlay.get(key) {
            if let Some(value) = self.visible_version(versions) {
                return Ok(value);
            }
        }
        Ok(self.shared.tree.get(key)?)
    }

    /// All visible entries whose key starts with `prefix`, in key order
    pub(crate) fn scan_prefix(&self, prefix: &[u8]) -> DependResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut merged = BTreeMap::new();
        for item in self.shared.tree.scan_prefix(prefix)? {
            let (key, value) = item?;
            merged.insert(key, value);
        }

        let range = self
            .overlay
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix));
        for (key, versions) in range {
            match self.visible_version(versions) {
                Some(Some(value)) => {
                    merged.insert(key.clone(), value);
                }
                Some(None) => {
                    merged.remove(key);
                }
                None => {}
            }
        }
        Ok(merged.into_iter().collect())
    }

    // ---- writes ----

    fn push_version(&mut self, key: Vec<u8>, value: Option<Vec<u8>>) {
        let command_id = self.command_id;
        let versions = self.overlay.entry(key).or_default();
        match versions.last_mut() {
            Some(last) if last.command_id == command_id => last.value = value,
            _ => versions.push(Version { command_id, value }),
        }
    }

    /// Buffer a batch of writes under the current command id
    pub(crate) fn write_batch(&mut self, ops: Vec<BatchOp>) -> DependResult<()> {
        self.ensure_active()?;
        for op in ops {
            match op {
                BatchOp::Insert { key, value } => self.push_version(key, Some(value)),
                BatchOp::Remove { key } => self.push_version(key, None),
            }
        }
        Ok(())
    }

    /// Number of keys touched so far
    pub fn pending_writes(&self) -> usize {
        self.overlay.len()
    }

    // ---- end of transaction ----

    pub fn commit(&mut self) -> DependResult<()> {
        self.ensure_active()?;
        let ops: Vec<BatchOp> = std::mem::take(&mut self.overlay)
            .into_iter()
            .filter_map(|(key, mut versions)| {
                versions.pop().map(|last| match last.value {
                    Some(value) => BatchOp::Insert { key, value },
                    None => BatchOp::Remove { key },
                })
            })
            .collect();

        let result = self
            .shared
            .tree
            .apply_batch(&ops)
            .and_then(|_| self.shared.tree.flush());
        self.shared.locks.release_all(self.id);

        match result {
            Ok(()) => {
                self.status = TransactionStatus::Committed;
                log::debug!("{} committed {} index writes", self.id, ops.len());
                Ok(())
            }
            Err(e) => {
                self.status = TransactionStatus::RolledBack;
                log::warn!("{} failed to commit: {}", self.id, e);
                Err(e.into())
            }
        }
    }

    pub fn abort(&mut self) -> DependResult<()> {
        self.ensure_active()?;
        let discarded = self.overlay.len();
        self.overlay.clear();
        self.extension_context = None;
        self.status = TransactionStatus::RolledBack;
        self.shared.locks.release_all(self.id);
        log::debug!("{} rolled back, {} index writes discarded", self.id, discarded);
        Ok(())
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.status.is_active() {
            let _ = self.abort();
        }
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("database_id", &self.database_id)
            .field("status", &self.status)
            .field("command_id", &self.command_id)
            .field("pending_writes", &self.overlay.len())
            .finish()
    }
}
