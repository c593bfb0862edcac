// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Dependency stores
//!
//! The local store holds edges between objects of one database; the shared
//! store holds edges that point at cluster-wide objects (roles, tablespaces,
//! databases). Both are exposed as methods on [`Transaction`].

pub mod helpers;
pub mod local;
pub mod owned;
pub mod pin;
pub mod report;
pub mod shared;

pub use report::{DependentObject, DependentObjects, DependentReport, DependentVia, RemoteDependents};
pub use shared::AclDependencyDiff;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::{CatalogId, ObjectAddress, Oid};
use crate::error::{DependError, DependResult};
use crate::storage::{BatchOp, IndexId, KeyBuilder};
use crate::txn::{LockMode, Transaction};

/// Kind of a local dependency edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyKind {
    /// Referenced object cannot be dropped without cascading to the depender
    Normal,
    /// Depender can be dropped separately and goes away with the referenced object
    Auto,
    /// Depender is part of the referenced object's implementation
    Internal,
    /// Partition child object depends on its parent object
    PartitionPrimary,
    /// Partition child object depends on the partitioned relation
    PartitionSecondary,
    /// Depender is a member of the referenced extension
    Extension,
    /// Depender is dropped when the referenced extension is
    AutoExtension,
    /// Marker row: the referenced object is part of the system
    Pin,
}

impl DependencyKind {
    pub fn code(self) -> char {
        match self {
            DependencyKind::Normal => 'n',
            DependencyKind::Auto => 'a',
            DependencyKind::Internal => 'i',
            DependencyKind::PartitionPrimary => 'P',
            DependencyKind::PartitionSecondary => 'S',
            DependencyKind::Extension => 'e',
            DependencyKind::AutoExtension => 'x',
            DependencyKind::Pin => 'p',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        Some(match code {
            'n' => DependencyKind::Normal,
            'a' => DependencyKind::Auto,
            'i' => DependencyKind::Internal,
            'P' => DependencyKind::PartitionPrimary,
            'S' => DependencyKind::PartitionSecondary,
            'e' => DependencyKind::Extension,
            'x' => DependencyKind::AutoExtension,
            'p' => DependencyKind::Pin,
            _ => return None,
        })
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Kind of a shared dependency edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SharedDependencyKind {
    /// Referenced role owns the depender
    Owner,
    /// Referenced role appears in the depender's ACL (never the owner)
    Acl,
    /// Referenced role is a target of the depender policy
    Policy,
    /// Referenced tablespace stores the depender
    Tablespace,
    /// Marker row: the referenced object is part of the system
    Pin,
}

impl SharedDependencyKind {
    pub fn code(self) -> char {
        match self {
            SharedDependencyKind::Owner => 'o',
            SharedDependencyKind::Acl => 'a',
            SharedDependencyKind::Policy => 'r',
            SharedDependencyKind::Tablespace => 't',
            SharedDependencyKind::Pin => 'p',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        Some(match code {
            'o' => SharedDependencyKind::Owner,
            'a' => SharedDependencyKind::Acl,
            'r' => SharedDependencyKind::Policy,
            't' => SharedDependencyKind::Tablespace,
            'p' => SharedDependencyKind::Pin,
            _ => return None,
        })
    }
}

impl fmt::Display for SharedDependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One row of the local dependency relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalDependRow {
    pub database_id: Oid,
    pub depender: ObjectAddress,
    pub referenced: ObjectAddress,
    pub kind: DependencyKind,
}

/// One row of the shared dependency relation. `database_id` is zero when
/// the depender is itself a cluster-wide object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedDependRow {
    pub database_id: Oid,
    pub depender: ObjectAddress,
    pub referenced: ObjectAddress,
    pub kind: SharedDependencyKind,
}

/// A row together with its row id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredRow<R> {
    pub row_id: u64,
    pub row: R,
}

/// Common shape of the two relations, so row I/O is written once
pub(crate) trait DependRow: Serialize + for<'de> Deserialize<'de> + Copy {
    const RELATION: CatalogId;
    fn forward_key(&self, row_id: u64) -> Vec<u8>;
    fn backward_key(&self, row_id: u64) -> Vec<u8>;
}

impl DependRow for LocalDependRow {
    const RELATION: CatalogId = CatalogId::DEPEND;

    fn forward_key(&self, row_id: u64) -> Vec<u8> {
        KeyBuilder::new(IndexId::LocalForward)
            .oid(self.database_id)
            .oid(self.depender.catalog.oid())
            .oid(self.depender.object_id)
            .sub_id(self.depender.sub_id)
            .row_id(row_id)
            .finish()
    }

    fn backward_key(&self, row_id: u64) -> Vec<u8> {
        KeyBuilder::new(IndexId::LocalBackward)
            .oid(self.database_id)
            .oid(self.referenced.catalog.oid())
            .oid(self.referenced.object_id)
            .sub_id(self.referenced.sub_id)
            .row_id(row_id)
            .finish()
    }
}

impl DependRow for SharedDependRow {
    const RELATION: CatalogId = CatalogId::SHARED_DEPEND;

    fn forward_key(&self, row_id: u64) -> Vec<u8> {
        KeyBuilder::new(IndexId::SharedForward)
            .oid(self.database_id)
            .oid(self.depender.catalog.oid())
            .oid(self.depender.object_id)
            .row_id(row_id)
            .finish()
    }

    fn backward_key(&self, row_id: u64) -> Vec<u8> {
        KeyBuilder::new(IndexId::SharedBackward)
            .oid(self.referenced.catalog.oid())
            .oid(self.referenced.object_id)
            .row_id(row_id)
            .finish()
    }
}

/// Prefix of the local forward index: `db`, depender catalog and id, and
/// optionally the depender sub-id
pub(crate) fn local_forward_prefix(
    db: Oid,
    catalog: CatalogId,
    object_id: Oid,
    sub_id: Option<i32>,
) -> Vec<u8> {
    let builder = KeyBuilder::new(IndexId::LocalForward)
        .oid(db)
        .oid(catalog.oid())
        .oid(object_id);
    match sub_id {
        Some(sub_id) => builder.sub_id(sub_id).finish(),
        None => builder.finish(),
    }
}

pub(crate) fn local_backward_prefix(
    db: Oid,
    catalog: CatalogId,
    object_id: Oid,
    sub_id: Option<i32>,
) -> Vec<u8> {
    let builder = KeyBuilder::new(IndexId::LocalBackward)
        .oid(db)
        .oid(catalog.oid())
        .oid(object_id);
    match sub_id {
        Some(sub_id) => builder.sub_id(sub_id).finish(),
        None => builder.finish(),
    }
}

pub(crate) fn local_database_prefix(db: Oid) -> Vec<u8> {
    KeyBuilder::new(IndexId::LocalForward).oid(db).finish()
}

pub(crate) fn shared_forward_prefix(db: Oid, catalog: CatalogId, object_id: Oid) -> Vec<u8> {
    KeyBuilder::new(IndexId::SharedForward)
        .oid(db)
        .oid(catalog.oid())
        .oid(object_id)
        .finish()
}

pub(crate) fn shared_database_prefix(db: Oid) -> Vec<u8> {
    KeyBuilder::new(IndexId::SharedForward).oid(db).finish()
}

pub(crate) fn shared_backward_prefix(catalog: CatalogId, object_id: Oid) -> Vec<u8> {
    KeyBuilder::new(IndexId::SharedBackward)
        .oid(catalog.oid())
        .oid(object_id)
        .finish()
}

// Row I/O shared by both stores
impl Transaction {
    pub(crate) fn scan_rows<R: DependRow>(&self, prefix: &[u8]) -> DependResult<Vec<StoredRow<R>>> {
        self.scan_prefix(prefix)?
            .into_iter()
            .map(|(key, value)| {
                let row_id = crate::storage::row_id_of(&key).ok_or_else(|| {
                    DependError::Internal(format!("malformed index key of {} bytes", key.len()))
                })?;
                let row: R = bincode::deserialize(&value)?;
                Ok(StoredRow { row_id, row })
            })
            .collect()
    }

    pub(crate) fn insert_rows<R: DependRow>(&mut self, rows: &[R]) -> DependResult<()> {
        let mut ops = Vec::with_capacity(rows.len() * 2);
        for row in rows {
            let row_id = self.allocate_row_id();
            let value = bincode::serialize(row)?;
            ops.push(BatchOp::Insert {
                key: row.forward_key(row_id),
                value: value.clone(),
            });
            ops.push(BatchOp::Insert {
                key: row.backward_key(row_id),
                value,
            });
        }
        self.write_batch(ops)
    }

    pub(crate) fn delete_row<R: DependRow>(&mut self, stored: &StoredRow<R>) -> DependResult<()> {
        let forward = stored.row.forward_key(stored.row_id);
        let expected = bincode::serialize(&stored.row)?;
        self.lock_row_for_update(R::RELATION, stored.row_id, &forward, &expected)?;
        self.write_batch(vec![
            BatchOp::Remove { key: forward },
            BatchOp::Remove {
                key: stored.row.backward_key(stored.row_id),
            },
        ])
    }

    /// Rewrite a row in place, keeping its row id
    pub(crate) fn update_row<R: DependRow>(
        &mut self,
        stored: &StoredRow<R>,
        new_row: R,
    ) -> DependResult<()> {
        let forward = stored.row.forward_key(stored.row_id);
        let expected = bincode::serialize(&stored.row)?;
        self.lock_row_for_update(R::RELATION, stored.row_id, &forward, &expected)?;

        let value = bincode::serialize(&new_row)?;
        let new_forward = new_row.forward_key(stored.row_id);
        let new_backward = new_row.backward_key(stored.row_id);
        let mut ops = Vec::with_capacity(4);
        if new_forward != forward {
            ops.push(BatchOp::Remove { key: forward });
        }
        let old_backward = stored.row.backward_key(stored.row_id);
        if new_backward != old_backward {
            ops.push(BatchOp::Remove { key: old_backward });
        }
        ops.push(BatchOp::Insert {
            key: new_forward,
            value: value.clone(),
        });
        ops.push(BatchOp::Insert {
            key: new_backward,
            value,
        });
        self.write_batch(ops)
    }

    pub(crate) fn lock_local_relation(&mut self, mode: LockMode) -> DependResult<()> {
        self.lock_relation(CatalogId::DEPEND, mode)
    }

    pub(crate) fn lock_shared_relation(&mut self, mode: LockMode) -> DependResult<()> {
        self.lock_relation(CatalogId::SHARED_DEPEND, mode)
    }
}
