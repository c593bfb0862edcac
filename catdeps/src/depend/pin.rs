// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Pin registry
//!
//! A pinned object is permanently part of the system. Pins are marker rows:
//! a local marker has an all-zero depender, a shared marker an all-zero
//! depender in database zero. Neither store ever records a real edge whose
//! referenced side is pinned.

use crate::address::{CatalogId, ObjectAddress};
use crate::error::DependResult;
use crate::txn::{LockMode, Transaction};

use super::{
    local_backward_prefix, local_forward_prefix, shared_backward_prefix, shared_forward_prefix,
    DependencyKind, LocalDependRow, SharedDependRow, SharedDependencyKind,
};

impl Transaction {
    /// Whether `object` carries a pin marker. Sub-objects share the pin of
    /// their whole object.
    pub fn is_object_pinned(&mut self, object: &ObjectAddress) -> DependResult<bool> {
        if self.catalog().is_shared_catalog(object.catalog) {
            self.is_shared_object_pinned(object)
        } else {
            self.is_local_object_pinned(object)
        }
    }

    pub(crate) fn is_local_object_pinned(&mut self, object: &ObjectAddress) -> DependResult<bool> {
        self.lock_local_relation(LockMode::AccessShare)?;
        let prefix =
            local_backward_prefix(self.database_id(), object.catalog, object.object_id, None);
        let rows = self.scan_rows::<LocalDependRow>(&prefix)?;
        Ok(rows.iter().any(|r| r.row.kind == DependencyKind::Pin))
    }

    pub(crate) fn is_shared_object_pinned(&mut self, object: &ObjectAddress) -> DependResult<bool> {
        self.lock_shared_relation(LockMode::AccessShare)?;
        let prefix = shared_backward_prefix(object.catalog, object.object_id);
        let rows = self.scan_rows::<SharedDependRow>(&prefix)?;
        Ok(rows.iter().any(|r| r.row.kind == SharedDependencyKind::Pin))
    }

    /// Every object pinned in this database, then every cluster-wide pin.
    /// Pin markers all share the zero depender, so this is a single prefix
    /// scan per store.
    pub fn pinned_objects(&mut self) -> DependResult<Vec<ObjectAddress>> {
        self.lock_local_relation(LockMode::AccessShare)?;
        let local_prefix = local_forward_prefix(self.database_id(), CatalogId::INVALID, 0, None);
        let mut pinned: Vec<ObjectAddress> = self
            .scan_rows::<LocalDependRow>(&local_prefix)?
            .into_iter()
            .filter(|s| s.row.kind == DependencyKind::Pin)
            .map(|s| s.row.referenced)
            .collect();

        self.lock_shared_relation(LockMode::AccessShare)?;
        let shared_prefix = shared_forward_prefix(0, CatalogId::INVALID, 0);
        pinned.extend(
            self.scan_rows::<SharedDependRow>(&shared_prefix)?
                .into_iter()
                .filter(|s| s.row.kind == SharedDependencyKind::Pin)
                .map(|s| s.row.referenced),
        );
        Ok(pinned)
    }

    /// Write a pin marker for `object` into the store that owns it. Used while
    /// bootstrapping a cluster; pinning twice is a no-op.
    pub fn pin_object(&mut self, object: &ObjectAddress) -> DependResult<()> {
        self.ensure_active()?;
        let whole = object.whole_object();
        if self.is_object_pinned(&whole)? {
            return Ok(());
        }
        let nothing = ObjectAddress::new(CatalogId::INVALID, 0);

        if self.catalog().is_shared_catalog(whole.catalog) {
            self.lock_shared_relation(LockMode::RowExclusive)?;
            self.insert_rows(&[SharedDependRow {
                database_id: 0,
                depender: nothing,
                referenced: whole,
                kind: SharedDependencyKind::Pin,
            }])?;
        } else {
            self.lock_local_relation(LockMode::RowExclusive)?;
            self.insert_rows(&[LocalDependRow {
                database_id: self.database_id(),
                depender: nothing,
                referenced: whole,
                kind: DependencyKind::Pin,
            }])?;
        }
        log::debug!("Pinned {}", whole);
        Ok(())
    }
}
