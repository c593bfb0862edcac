// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Bulk role cleanup: DROP OWNED and REASSIGN OWNED
//!
//! Both walk the shared edges pointing at each role. They hold an exclusive
//! lock on the shared relation for their whole run so no new edge onto the
//! roles can appear midway.

use crate::address::{CatalogId, ObjectAddress, ObjectAddresses, Oid};
use crate::catalog::{DropBehavior, OwnerChange};
use crate::error::{DependError, DependResult};
use crate::txn::{LockMode, Transaction};

use super::{SharedDependRow, SharedDependencyKind, StoredRow};

impl Transaction {
    /// Shared edges onto `role` that concern this database: those of local
    /// objects and those of cluster-wide objects.
    fn role_edges_in_scope(&mut self, role_id: Oid) -> DependResult<Vec<StoredRow<SharedDependRow>>> {
        let my_db = self.database_id();
        Ok(self
            .shared_dependents_of(&ObjectAddress::role(role_id))?
            .into_iter()
            .filter(|s| s.row.database_id == my_db || s.row.database_id == 0)
            .collect())
    }

    /// Drop everything the roles own in this database and revoke their
    /// privileges everywhere they are recorded.
    ///
    /// ACL entries are revoked in place. A policy naming a role loses that
    /// role, or is dropped when it was the only one. Owned objects of this
    /// database (and role memberships) are deleted in one cascade batch,
    /// newest first.
    pub fn drop_owned(&mut self, roles: &[Oid], behavior: DropBehavior) -> DependResult<()> {
        self.ensure_active()?;
        self.lock_shared_relation(LockMode::Exclusive)?;
        let my_db = self.database_id();
        let mutator = self.mutator();
        let mut doomed = ObjectAddresses::new();

        for &role_id in roles {
            let role = ObjectAddress::role(role_id);
            if self.is_shared_object_pinned(&role)? {
                return Err(DependError::OwnedObjectsRequiredBySystem(
                    self.describe_or_address(&role),
                ));
            }

            for stored in self.role_edges_in_scope(role_id)? {
                let row = stored.row;
                match row.kind {
                    SharedDependencyKind::Pin => {
                        return Err(DependError::Internal(format!(
                            "unexpected dependency type {}",
                            row.kind
                        )));
                    }
                    SharedDependencyKind::Acl => {
                        // Membership grants are handled when the role is dropped
                        if row.depender.catalog == CatalogId::AUTH_MEMBERS {
                            continue;
                        }
                        mutator.revoke_all(self, &row.depender, role_id)?;
                    }
                    SharedDependencyKind::Policy => {
                        if !mutator.remove_role_from_policy(self, row.depender.object_id, role_id)? {
                            doomed.add(row.depender);
                        }
                    }
                    SharedDependencyKind::Owner => {
                        // Databases, tablespaces and other roles stay put
                        if row.database_id == my_db
                            || row.depender.catalog == CatalogId::AUTH_MEMBERS
                        {
                            doomed.add(row.depender);
                        }
                    }
                    SharedDependencyKind::Tablespace => {}
                }
            }
        }

        doomed.sort_reverse_creation();
        log::info!(
            "DROP OWNED for {} role(s): deleting {} object(s) with {:?}",
            roles.len(),
            doomed.len(),
            behavior
        );
        self.cascade().perform_deletions(self, &doomed, behavior)
    }

    /// Give every object the roles own, in this database or cluster-wide, to
    /// `new_role`.
    pub fn reassign_owned(&mut self, roles: &[Oid], new_role: Oid) -> DependResult<()> {
        self.ensure_active()?;
        self.lock_shared_relation(LockMode::Exclusive)?;
        let mut reassigned = 0usize;

        for &role_id in roles {
            let role = ObjectAddress::role(role_id);
            if self.is_shared_object_pinned(&role)? {
                return Err(DependError::ReassignRequiredBySystem(
                    self.describe_or_address(&role),
                ));
            }

            let owned: Vec<ObjectAddress> = self
                .role_edges_in_scope(role_id)?
                .into_iter()
                .filter(|s| s.row.kind == SharedDependencyKind::Owner)
                .map(|s| s.row.depender)
                .collect();

            for object in owned {
                let Some(change) = OwnerChange::classify(&object)? else {
                    continue;
                };
                change.apply(self, new_role)?;
                reassigned += 1;
                // Later objects must see this one's new owner
                self.command_counter_increment();
            }
        }

        log::info!(
            "REASSIGN OWNED for {} role(s): {} object(s) now owned by role {}",
            roles.len(),
            reassigned,
            new_role
        );
        Ok(())
    }
}
