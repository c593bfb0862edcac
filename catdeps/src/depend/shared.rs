// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Shared dependency store
//!
//! Edges from any object to a cluster-wide object: owners, ACL entries,
//! policy targets and tablespaces. A row is scoped to the depender's
//! database, or to database zero when the depender is itself cluster-wide.

use crate::address::{CatalogId, ObjectAddress, Oid};
use crate::error::{DependError, DependResult};
use crate::txn::{LockMode, Transaction};

use super::{
    local_database_prefix, shared_backward_prefix, shared_database_prefix,
    shared_forward_prefix, LocalDependRow, SharedDependRow, SharedDependencyKind, StoredRow,
};

/// Tablespace used when none is given explicitly; never recorded
pub const DEFAULT_TABLESPACE_OID: Oid = 1663;
/// Tablespace of the shared catalogs; never recorded
pub const GLOBAL_TABLESPACE_OID: Oid = 1664;

/// Roles added to and removed from an ACL by [`Transaction::update_acl_dependencies`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AclDependencyDiff {
    pub added: Vec<Oid>,
    pub removed: Vec<Oid>,
}

/// Merge two strictly ascending id lists. Returns the ids only in `old` and
/// the ids only in `new`.
pub fn oid_list_diff(old: &[Oid], new: &[Oid]) -> (Vec<Oid>, Vec<Oid>) {
    let mut only_old = Vec::new();
    let mut only_new = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < old.len() && j < new.len() {
        if old[i] == new[j] {
            i += 1;
            j += 1;
        } else if old[i] < new[j] {
            only_old.push(old[i]);
            i += 1;
        } else {
            only_new.push(new[j]);
            j += 1;
        }
    }
    only_old.extend_from_slice(&old[i..]);
    only_new.extend_from_slice(&new[j..]);
    (only_old, only_new)
}

fn check_ascending(ids: &[Oid], what: &str) -> DependResult<()> {
    if ids.windows(2).any(|w| w[0] >= w[1]) {
        return Err(DependError::IntegrityViolation(format!(
            "{} role list must be sorted and free of duplicates",
            what
        )));
    }
    Ok(())
}

impl Transaction {
    /// Database a shared row for `catalog` is scoped to
    fn shared_scope(&self, catalog: CatalogId) -> Oid {
        if self.catalog().is_shared_catalog(catalog) {
            0
        } else {
            self.database_id()
        }
    }

    fn check_shared_addresses(
        &self,
        depender: &ObjectAddress,
        referenced: &ObjectAddress,
    ) -> DependResult<()> {
        if !depender.is_whole_object() || !referenced.is_whole_object() {
            return Err(DependError::IntegrityViolation(format!(
                "shared dependency between {} and {} cannot involve sub-objects",
                depender, referenced
            )));
        }
        Ok(())
    }

    /// Every shared edge whose depender is `object`
    pub fn shared_dependencies_of(
        &mut self,
        object: &ObjectAddress,
    ) -> DependResult<Vec<StoredRow<SharedDependRow>>> {
        self.lock_shared_relation(LockMode::AccessShare)?;
        let db = self.shared_scope(object.catalog);
        self.scan_rows(&shared_forward_prefix(db, object.catalog, object.object_id))
    }

    /// Every shared edge pointing at `object`, from any database
    pub fn shared_dependents_of(
        &mut self,
        object: &ObjectAddress,
    ) -> DependResult<Vec<StoredRow<SharedDependRow>>> {
        self.lock_shared_relation(LockMode::AccessShare)?;
        self.scan_rows(&shared_backward_prefix(object.catalog, object.object_id))
    }

    fn add_shared_row(
        &mut self,
        depender: &ObjectAddress,
        referenced: &ObjectAddress,
        kind: SharedDependencyKind,
    ) -> DependResult<()> {
        self.lock_and_check_object(referenced)?;
        let row = SharedDependRow {
            database_id: self.shared_scope(depender.catalog),
            depender: *depender,
            referenced: *referenced,
            kind,
        };
        self.insert_rows(&[row])?;
        log::debug!("Recorded shared {} dependency {} -> {}", kind, depender, referenced);
        Ok(())
    }

    /// Delete the shared edges of `depender` that point at `referenced`
    /// (any object when `None`) with `kind` (any kind when `None`).
    fn drop_shared_rows(
        &mut self,
        depender: &ObjectAddress,
        referenced: Option<&ObjectAddress>,
        kind: Option<SharedDependencyKind>,
    ) -> DependResult<usize> {
        let rows = self.shared_dependencies_of(depender)?;
        self.lock_shared_relation(LockMode::RowExclusive)?;
        let mut removed = 0;
        for stored in &rows {
            if let Some(target) = referenced {
                if stored.row.referenced != *target {
                    continue;
                }
            }
            if let Some(kind) = kind {
                if stored.row.kind != kind {
                    continue;
                }
            }
            self.delete_row(stored)?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Record a shared dependency. Nothing is stored when `referenced` is
    /// pinned.
    pub fn record_shared_dependency(
        &mut self,
        depender: &ObjectAddress,
        referenced: &ObjectAddress,
        kind: SharedDependencyKind,
    ) -> DependResult<()> {
        self.ensure_active()?;
        self.check_shared_addresses(depender, referenced)?;
        if kind == SharedDependencyKind::Pin {
            return Err(DependError::IntegrityViolation(
                "pin markers cannot be recorded as dependencies".to_string(),
            ));
        }
        self.lock_shared_relation(LockMode::RowExclusive)?;
        if self.is_shared_object_pinned(referenced)? {
            return Ok(());
        }
        self.add_shared_row(depender, referenced, kind)
    }

    /// Record `owner` as the owner of a new object. The object must not have
    /// an owner edge yet.
    pub fn record_owner(&mut self, object: &ObjectAddress, owner: Oid) -> DependResult<()> {
        self.record_shared_dependency(object, &ObjectAddress::role(owner), SharedDependencyKind::Owner)
    }

    /// Replace the single edge of `kind` from `depender` into
    /// `ref_catalog`, pointing it at `new_ref_id`.
    fn change_single_shared_dependency(
        &mut self,
        depender: &ObjectAddress,
        ref_catalog: CatalogId,
        new_ref_id: Oid,
        kind: SharedDependencyKind,
    ) -> DependResult<()> {
        let new_ref = ObjectAddress::new(ref_catalog, new_ref_id);
        self.lock_and_check_object(&new_ref)?;

        let rows = self.shared_dependencies_of(depender)?;
        self.lock_shared_relation(LockMode::RowExclusive)?;
        let mut existing = None;
        for stored in rows
            .iter()
            .filter(|s| s.row.referenced.catalog == ref_catalog && s.row.kind == kind)
        {
            if existing.is_some() {
                return Err(DependError::Internal(format!(
                    "multiple shared dependency entries for object {}/{} deptype {}",
                    depender.catalog, depender.object_id, kind
                )));
            }
            existing = Some(*stored);
        }

        if self.is_shared_object_pinned(&new_ref)? {
            if let Some(stored) = existing {
                self.delete_row(&stored)?;
            }
        } else if let Some(stored) = existing {
            let mut row = stored.row;
            row.referenced = new_ref;
            self.update_row(&stored, row)?;
        } else {
            let row = SharedDependRow {
                database_id: self.shared_scope(depender.catalog),
                depender: *depender,
                referenced: new_ref,
                kind,
            };
            self.insert_rows(&[row])?;
        }
        Ok(())
    }

    /// Point the owner edge of `object` at `new_owner` and drop any ACL edge
    /// the new owner had on it, since an owner never has one.
    pub fn change_owner_dependency(
        &mut self,
        object: &ObjectAddress,
        new_owner: Oid,
    ) -> DependResult<()> {
        self.ensure_active()?;
        let object = object.whole_object();
        self.change_single_shared_dependency(
            &object,
            CatalogId::AUTH_ID,
            new_owner,
            SharedDependencyKind::Owner,
        )?;
        let removed = self.drop_shared_rows(
            &object,
            Some(&ObjectAddress::role(new_owner)),
            Some(SharedDependencyKind::Acl),
        )?;
        log::debug!(
            "Owner of {} is now role {} ({} ACL entries folded)",
            object,
            new_owner,
            removed
        );
        Ok(())
    }

    /// Record the non-default tablespace of a new object
    pub fn record_tablespace_dependency(
        &mut self,
        object: &ObjectAddress,
        tablespace: Oid,
    ) -> DependResult<()> {
        if tablespace == 0 || tablespace == DEFAULT_TABLESPACE_OID || tablespace == GLOBAL_TABLESPACE_OID {
            return Ok(());
        }
        self.record_shared_dependency(
            object,
            &ObjectAddress::tablespace(tablespace),
            SharedDependencyKind::Tablespace,
        )
    }

    /// Move an object to another tablespace. Moving to a default tablespace
    /// simply forgets the edge.
    pub fn change_tablespace_dependency(
        &mut self,
        object: &ObjectAddress,
        new_tablespace: Oid,
    ) -> DependResult<()> {
        self.ensure_active()?;
        let object = object.whole_object();
        if new_tablespace == 0
            || new_tablespace == DEFAULT_TABLESPACE_OID
            || new_tablespace == GLOBAL_TABLESPACE_OID
        {
            self.drop_shared_rows(&object, None, Some(SharedDependencyKind::Tablespace))?;
            return Ok(());
        }
        self.change_single_shared_dependency(
            &object,
            CatalogId::TABLESPACE,
            new_tablespace,
            SharedDependencyKind::Tablespace,
        )
    }

    /// Bring the ACL edges of `object` in line with a changed ACL.
    ///
    /// Both role lists must be sorted ascending without duplicates. The owner
    /// and pinned roles never get ACL edges. Returns the roles whose edges
    /// were actually added and removed.
    pub fn update_acl_dependencies(
        &mut self,
        object: &ObjectAddress,
        owner: Oid,
        old_members: &[Oid],
        new_members: &[Oid],
    ) -> DependResult<AclDependencyDiff> {
        self.ensure_active()?;
        check_ascending(old_members, "old")?;
        check_ascending(new_members, "new")?;
        let object = object.whole_object();

        let (only_old, only_new) = oid_list_diff(old_members, new_members);
        let mut diff = AclDependencyDiff::default();
        if only_old.is_empty() && only_new.is_empty() {
            return Ok(diff);
        }
        self.lock_shared_relation(LockMode::RowExclusive)?;

        for role_id in only_new {
            let role = ObjectAddress::role(role_id);
            if role_id == owner || self.is_shared_object_pinned(&role)? {
                continue;
            }
            self.add_shared_row(&object, &role, SharedDependencyKind::Acl)?;
            diff.added.push(role_id);
        }
        for role_id in only_old {
            let role = ObjectAddress::role(role_id);
            if role_id == owner || self.is_shared_object_pinned(&role)? {
                continue;
            }
            self.drop_shared_rows(&object, Some(&role), Some(SharedDependencyKind::Acl))?;
            diff.removed.push(role_id);
        }
        Ok(diff)
    }

    /// Forget every shared edge of a dropped object
    pub fn delete_shared_dependencies_for(&mut self, object: &ObjectAddress) -> DependResult<usize> {
        self.ensure_active()?;
        let removed = self.drop_shared_rows(&object.whole_object(), None, None)?;
        log::debug!("Deleted {} shared dependencies of {}", removed, object);
        Ok(removed)
    }

    /// Give a new database the dependencies of its template: the template's
    /// shared edges and its whole local relation are copied.
    pub fn copy_template_dependencies(
        &mut self,
        template_db: Oid,
        new_db: Oid,
    ) -> DependResult<usize> {
        self.ensure_active()?;
        self.lock_shared_relation(LockMode::RowExclusive)?;
        self.lock_local_relation(LockMode::RowExclusive)?;

        let shared: Vec<SharedDependRow> = self
            .scan_rows::<SharedDependRow>(&shared_database_prefix(template_db))?
            .into_iter()
            .map(|s| SharedDependRow {
                database_id: new_db,
                ..s.row
            })
            .collect();
        let local: Vec<LocalDependRow> = self
            .scan_rows::<LocalDependRow>(&local_database_prefix(template_db))?
            .into_iter()
            .map(|s| LocalDependRow {
                database_id: new_db,
                ..s.row
            })
            .collect();

        self.insert_rows(&shared)?;
        self.insert_rows(&local)?;
        log::info!(
            "Copied {} shared and {} local dependencies from database {} to {}",
            shared.len(),
            local.len(),
            template_db,
            new_db
        );
        Ok(shared.len() + local.len())
    }

    /// Remove everything recorded for a dropped database: shared edges of
    /// its objects, the database's own edges and its local relation.
    pub fn drop_database_dependencies(&mut self, database_id: Oid) -> DependResult<usize> {
        self.ensure_active()?;
        self.lock_shared_relation(LockMode::RowExclusive)?;

        let mut removed = 0;
        for stored in self.scan_rows::<SharedDependRow>(&shared_database_prefix(database_id))? {
            self.delete_row(&stored)?;
            removed += 1;
        }
        removed += self.drop_shared_rows(&ObjectAddress::database(database_id), None, None)?;
        self.lock_local_relation(LockMode::RowExclusive)?;
        for stored in self.scan_rows::<LocalDependRow>(&local_database_prefix(database_id))? {
            self.delete_row(&stored)?;
            removed += 1;
        }
        log::info!("Dropped {} dependencies of database {}", removed, database_id);
        Ok(removed)
    }
}
