// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Local dependency store
//!
//! Edges between objects of the transaction's database. Forward scans are
//! keyed by depender, backward scans by referenced object; both are prefix
//! scans of the covering indexes, never full scans.

use crate::address::{CatalogId, ObjectAddress, Oid};
use crate::catalog::RelationKind;
use crate::error::{DependError, DependResult};
use crate::txn::{LockMode, Transaction};

use super::{
    local_backward_prefix, local_forward_prefix, DependencyKind, LocalDependRow, StoredRow,
};

/// Approximate stored width of one local row, used to size insert batches
const LOCAL_ROW_WIDTH: usize = std::mem::size_of::<LocalDependRow>();

fn sub_id_filter(object: &ObjectAddress) -> Option<i32> {
    if object.is_whole_object() {
        None
    } else {
        Some(object.sub_id)
    }
}

impl Transaction {
    /// Record that `depender` depends on `referenced`.
    pub fn record_dependency(
        &mut self,
        depender: &ObjectAddress,
        referenced: &ObjectAddress,
        kind: DependencyKind,
    ) -> DependResult<()> {
        self.record_dependencies(depender, std::slice::from_ref(referenced), kind)
    }

    /// Record that `depender` depends on each of `referenced`. Pinned
    /// referenced objects are skipped silently.
    pub fn record_dependencies(
        &mut self,
        depender: &ObjectAddress,
        referenced: &[ObjectAddress],
        kind: DependencyKind,
    ) -> DependResult<()> {
        self.ensure_active()?;
        if kind == DependencyKind::Pin {
            return Err(DependError::IntegrityViolation(
                "pin markers cannot be recorded as dependencies".to_string(),
            ));
        }
        if referenced.is_empty() {
            return Ok(());
        }
        self.lock_local_relation(LockMode::RowExclusive)?;

        let mut rows = Vec::with_capacity(referenced.len());
        for target in referenced {
            if self.is_object_pinned(target)? {
                continue;
            }
            self.lock_and_check_object(target)?;
            rows.push(LocalDependRow {
                database_id: self.database_id(),
                depender: *depender,
                referenced: *target,
                kind,
            });
        }

        let per_batch = (self.config().multi_insert_bytes / LOCAL_ROW_WIDTH).max(1);
        for batch in rows.chunks(per_batch) {
            self.insert_rows(batch)?;
        }
        log::debug!(
            "Recorded {} of {} {} dependencies for {}",
            rows.len(),
            referenced.len(),
            kind,
            depender
        );
        Ok(())
    }

    /// Every edge whose depender is `object`. A whole-object address matches
    /// all of its sub-objects too.
    pub fn dependencies_of(
        &mut self,
        object: &ObjectAddress,
    ) -> DependResult<Vec<StoredRow<LocalDependRow>>> {
        self.lock_local_relation(LockMode::AccessShare)?;
        let prefix = local_forward_prefix(
            self.database_id(),
            object.catalog,
            object.object_id,
            sub_id_filter(object),
        );
        self.scan_rows(&prefix)
    }

    /// Every edge whose referenced side is `object`, pin markers included
    pub fn dependents_of(
        &mut self,
        object: &ObjectAddress,
    ) -> DependResult<Vec<StoredRow<LocalDependRow>>> {
        self.lock_local_relation(LockMode::AccessShare)?;
        let prefix = local_backward_prefix(
            self.database_id(),
            object.catalog,
            object.object_id,
            sub_id_filter(object),
        );
        self.scan_rows(&prefix)
    }

    fn delete_local_matching<F>(&mut self, depender: &ObjectAddress, keep: F) -> DependResult<usize>
    where
        F: Fn(&LocalDependRow) -> bool,
    {
        self.ensure_active()?;
        let rows = self.dependencies_of(depender)?;
        self.lock_local_relation(LockMode::RowExclusive)?;
        let mut removed = 0;
        for stored in rows.iter().filter(|s| !keep(&s.row)) {
            self.delete_row(stored)?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Delete every edge of `depender`, optionally keeping its extension
    /// membership. Returns the number of edges removed.
    pub fn delete_dependencies_for(
        &mut self,
        depender: &ObjectAddress,
        skip_extension_deps: bool,
    ) -> DependResult<usize> {
        let removed = self.delete_local_matching(depender, |row| {
            skip_extension_deps && row.kind == DependencyKind::Extension
        })?;
        log::debug!("Deleted {} dependencies of {}", removed, depender);
        Ok(removed)
    }

    /// Delete the edges of `depender` of one kind into one referenced catalog
    pub fn delete_dependencies_for_kind(
        &mut self,
        depender: &ObjectAddress,
        referenced_catalog: CatalogId,
        kind: DependencyKind,
    ) -> DependResult<usize> {
        self.delete_local_matching(depender, |row| {
            !(row.referenced.catalog == referenced_catalog && row.kind == kind)
        })
    }

    /// Delete the edges of `depender` of one kind onto one referenced object
    pub fn delete_dependencies_for_specific(
        &mut self,
        depender: &ObjectAddress,
        kind: DependencyKind,
        referenced: &ObjectAddress,
    ) -> DependResult<usize> {
        self.delete_local_matching(depender, |row| {
            !(row.referenced.catalog == referenced.catalog
                && row.referenced.object_id == referenced.object_id
                && row.kind == kind)
        })
    }

    /// Repoint the edges of one depender from `old_ref_id` to `new_ref_id`
    /// within `ref_catalog`.
    ///
    /// Returns the number of edges changed. When the old target is pinned
    /// there was nothing stored to change; the result is then 1 so callers
    /// can treat zero as "no such dependency".
    pub fn change_referenced(
        &mut self,
        depender_catalog: CatalogId,
        depender_id: Oid,
        ref_catalog: CatalogId,
        old_ref_id: Oid,
        new_ref_id: Oid,
    ) -> DependResult<usize> {
        self.ensure_active()?;
        let old_ref = ObjectAddress::new(ref_catalog, old_ref_id);
        let new_ref = ObjectAddress::new(ref_catalog, new_ref_id);
        let old_pinned = self.is_object_pinned(&old_ref)?;
        let new_pinned = self.is_object_pinned(&new_ref)?;
        let depender = ObjectAddress::new(depender_catalog, depender_id);

        if old_pinned {
            if !new_pinned {
                // Nothing was stored for the pinned target; start tracking now
                self.record_dependency(&depender, &new_ref, DependencyKind::Normal)?;
            }
            return Ok(1);
        }
        if !new_pinned {
            self.lock_and_check_object(&new_ref)?;
        }

        let rows = self.dependencies_of(&depender)?;
        self.lock_local_relation(LockMode::RowExclusive)?;
        let mut changed = 0;
        for stored in rows.iter().filter(|s| {
            s.row.referenced.catalog == ref_catalog && s.row.referenced.object_id == old_ref_id
        }) {
            if new_pinned {
                self.delete_row(stored)?;
            } else {
                let mut row = stored.row;
                row.referenced.object_id = new_ref_id;
                self.update_row(stored, row)?;
            }
            changed += 1;
        }
        Ok(changed)
    }

    /// Move every edge of depender `old_id` over to `new_id`, as when an
    /// object is rebuilt under a new id but logically continues.
    pub fn change_dependers_of(
        &mut self,
        depender_catalog: CatalogId,
        old_id: Oid,
        new_id: Oid,
    ) -> DependResult<usize> {
        self.ensure_active()?;
        let rows = self.dependencies_of(&ObjectAddress::new(depender_catalog, old_id))?;
        self.lock_local_relation(LockMode::RowExclusive)?;
        for stored in &rows {
            let mut row = stored.row;
            row.depender.object_id = new_id;
            self.update_row(stored, row)?;
        }
        Ok(rows.len())
    }

    /// Repoint every edge that references `old_ref_id`, whoever the depender.
    pub fn change_referenced_bulk(
        &mut self,
        ref_catalog: CatalogId,
        old_ref_id: Oid,
        new_ref_id: Oid,
    ) -> DependResult<usize> {
        self.ensure_active()?;
        let old_ref = ObjectAddress::new(ref_catalog, old_ref_id);
        if self.is_object_pinned(&old_ref)? {
            return Err(DependError::SystemObject(self.describe_or_address(&old_ref)));
        }
        let new_ref = ObjectAddress::new(ref_catalog, new_ref_id);
        let new_pinned = self.is_object_pinned(&new_ref)?;
        if !new_pinned {
            self.lock_and_check_object(&new_ref)?;
        }

        let rows = self.dependents_of(&old_ref)?;
        self.lock_local_relation(LockMode::RowExclusive)?;
        for stored in &rows {
            if new_pinned {
                self.delete_row(stored)?;
            } else {
                let mut row = stored.row;
                row.referenced.object_id = new_ref_id;
                self.update_row(stored, row)?;
            }
        }
        log::debug!(
            "Moved {} dependencies from {} to {}",
            rows.len(),
            old_ref,
            new_ref
        );
        Ok(rows.len())
    }

    /// Extension `object` is a member of. If several membership edges exist
    /// the first one found wins; callers never create more than one.
    pub fn extension_of(&mut self, object: &ObjectAddress) -> DependResult<Option<Oid>> {
        let rows = self.dependencies_of(&object.whole_object())?;
        Ok(rows
            .iter()
            .find(|s| {
                s.row.referenced.catalog == CatalogId::EXTENSION
                    && s.row.kind == DependencyKind::Extension
            })
            .map(|s| s.row.referenced.object_id))
    }

    /// Extensions whose removal automatically drops `object`
    pub fn auto_extensions_of(&mut self, object: &ObjectAddress) -> DependResult<Vec<Oid>> {
        let rows = self.dependencies_of(&object.whole_object())?;
        Ok(rows
            .iter()
            .filter(|s| {
                s.row.referenced.catalog == CatalogId::EXTENSION
                    && s.row.kind == DependencyKind::AutoExtension
            })
            .map(|s| s.row.referenced.object_id)
            .collect())
    }

    /// Table and column owning sequence `sequence_id` through an edge of
    /// `kind` (AUTO for serial columns, INTERNAL for identity columns).
    pub fn sequence_owner(
        &mut self,
        sequence_id: Oid,
        kind: DependencyKind,
    ) -> DependResult<Option<(Oid, i32)>> {
        let rows = self.dependencies_of(&ObjectAddress::relation(sequence_id))?;
        Ok(rows
            .iter()
            .find(|s| s.row.referenced.catalog == CatalogId::RELATION && s.row.kind == kind)
            .map(|s| (s.row.referenced.object_id, s.row.referenced.sub_id)))
    }

    /// Sequences owned by columns of `relation_id`; `attnum` zero means any
    /// column.
    pub fn owned_sequences(&mut self, relation_id: Oid, attnum: i32) -> DependResult<Vec<Oid>> {
        let target = ObjectAddress::with_sub_id(CatalogId::RELATION, relation_id, attnum);
        let rows = self.dependents_of(&target)?;
        let catalog = self.catalog();
        Ok(rows
            .iter()
            .filter(|s| {
                s.row.depender.catalog == CatalogId::RELATION
                    && s.row.depender.sub_id == 0
                    && s.row.referenced.sub_id != 0
                    && matches!(s.row.kind, DependencyKind::Auto | DependencyKind::Internal)
                    && catalog.relation_kind(s.row.depender.object_id)
                        == Some(RelationKind::Sequence)
            })
            .map(|s| s.row.depender.object_id)
            .collect())
    }

    /// Index implementing constraint `constraint_id`. The index is the
    /// internal dependent of its constraint.
    pub fn constraint_index(&mut self, constraint_id: Oid) -> DependResult<Option<Oid>> {
        let rows = self.dependents_of(&ObjectAddress::new(CatalogId::CONSTRAINT, constraint_id))?;
        let catalog = self.catalog();
        Ok(rows
            .iter()
            .find(|s| {
                s.row.depender.catalog == CatalogId::RELATION
                    && s.row.depender.sub_id == 0
                    && s.row.kind == DependencyKind::Internal
                    && catalog
                        .relation_kind(s.row.depender.object_id)
                        .map_or(false, |k| k.is_index())
            })
            .map(|s| s.row.depender.object_id))
    }

    /// Constraint that index `index_id` implements
    pub fn index_constraint(&mut self, index_id: Oid) -> DependResult<Option<Oid>> {
        let rows = self.dependencies_of(&ObjectAddress::relation(index_id))?;
        Ok(rows
            .iter()
            .find(|s| {
                s.row.referenced.catalog == CatalogId::CONSTRAINT
                    && s.row.referenced.sub_id == 0
                    && s.row.kind == DependencyKind::Internal
            })
            .map(|s| s.row.referenced.object_id))
    }

    /// Foreign-key constraints relying on index `index_id`
    pub fn index_ref_constraints(&mut self, index_id: Oid) -> DependResult<Vec<Oid>> {
        let rows = self.dependents_of(&ObjectAddress::relation(index_id))?;
        Ok(rows
            .iter()
            .filter(|s| {
                s.row.depender.catalog == CatalogId::CONSTRAINT
                    && s.row.depender.sub_id == 0
                    && s.row.kind == DependencyKind::Normal
            })
            .map(|s| s.row.depender.object_id)
            .collect())
    }

    pub(crate) fn describe_or_address(&self, object: &ObjectAddress) -> String {
        self.catalog()
            .describe_object(object)
            .unwrap_or_else(|| object.to_string())
    }
}
