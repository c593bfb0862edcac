// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Collaborator interfaces
//!
//! The dependency stores never touch catalog rows of other object kinds
//! directly. Everything they need from the rest of the system goes through
//! these traits: existence checks and descriptions, the privilege and owner
//! rewrites performed by the bulk role operations, and the cascade engine
//! that actually deletes objects.

use crate::address::{CatalogId, ObjectAddress, ObjectAddresses, Oid};
use crate::error::DependResult;
use crate::txn::Transaction;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Storage kind of a relation, as far as dependency lookups care
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    Table,
    PartitionedTable,
    Index,
    PartitionedIndex,
    Sequence,
    View,
    MaterializedView,
    CompositeType,
    ForeignTable,
    Toast,
}

impl RelationKind {
    pub fn is_index(&self) -> bool {
        matches!(self, RelationKind::Index | RelationKind::PartitionedIndex)
    }
}

/// How a cascade engine treats dependents of the objects it deletes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DropBehavior {
    /// Refuse if anything else depends on the objects
    #[default]
    Restrict,
    /// Delete dependents as well
    Cascade,
}

/// Read-only view of the rest of the catalog
pub trait ObjectCatalog: Send + Sync {
    /// Whether the object still exists. Called after the object is locked.
    fn object_exists(&self, object: &ObjectAddress) -> bool;

    /// Human description such as `table foo`. `None` when the object is
    /// gone; callers must tolerate that.
    fn describe_object(&self, object: &ObjectAddress) -> Option<String>;

    /// Bare name of the object, used inside quoted error messages
    fn object_name(&self, _object: &ObjectAddress) -> Option<String> {
        None
    }

    /// Whether rows of this catalog are visible from every database
    fn is_shared_catalog(&self, catalog: CatalogId) -> bool {
        catalog.is_shared()
    }

    fn relation_kind(&self, relation_id: Oid) -> Option<RelationKind>;
}

/// Catalog rewrites requested by drop-owned and reassign-owned.
///
/// Every owner-changing method is responsible for keeping the shared store
/// in sync, normally by calling [`Transaction::change_owner_dependency`].
pub trait CatalogMutator: Send + Sync {
    /// Remove every privilege `role` holds on `object`.
    fn revoke_all(&self, txn: &mut Transaction, object: &ObjectAddress, role: Oid)
        -> DependResult<()>;

    /// Remove `role` from the target list of a row-security policy.
    /// Returns `false` when the role was the last one and the policy must be
    /// dropped instead.
    fn remove_role_from_policy(
        &self,
        txn: &mut Transaction,
        policy_id: Oid,
        role: Oid,
    ) -> DependResult<bool>;

    fn alter_type_owner(&self, txn: &mut Transaction, type_id: Oid, new_owner: Oid)
        -> DependResult<()>;

    fn alter_schema_owner(
        &self,
        txn: &mut Transaction,
        namespace_id: Oid,
        new_owner: Oid,
    ) -> DependResult<()>;

    /// `recursing` is set when the relation may be visited before the table
    /// it belongs to (an index or an owned sequence).
    fn alter_relation_owner(
        &self,
        txn: &mut Transaction,
        relation_id: Oid,
        new_owner: Oid,
        recursing: bool,
    ) -> DependResult<()>;

    fn alter_foreign_server_owner(
        &self,
        txn: &mut Transaction,
        server_id: Oid,
        new_owner: Oid,
    ) -> DependResult<()>;

    fn alter_foreign_data_wrapper_owner(
        &self,
        txn: &mut Transaction,
        fdw_id: Oid,
        new_owner: Oid,
    ) -> DependResult<()>;

    fn alter_event_trigger_owner(
        &self,
        txn: &mut Transaction,
        trigger_id: Oid,
        new_owner: Oid,
    ) -> DependResult<()>;

    fn alter_publication_owner(
        &self,
        txn: &mut Transaction,
        publication_id: Oid,
        new_owner: Oid,
    ) -> DependResult<()>;

    fn alter_subscription_owner(
        &self,
        txn: &mut Transaction,
        subscription_id: Oid,
        new_owner: Oid,
    ) -> DependResult<()>;

    /// Rewrite the owner column of a catalog row that has no special owner
    /// handling. The shared OWNER edge is updated by the caller afterwards.
    fn rewrite_owner_column(
        &self,
        txn: &mut Transaction,
        object: &ObjectAddress,
        new_owner: Oid,
    ) -> DependResult<()>;
}

/// The engine that deletes a batch of objects and everything depending on them
pub trait CascadeEngine: Send + Sync {
    fn perform_deletions(
        &self,
        txn: &mut Transaction,
        objects: &ObjectAddresses,
        behavior: DropBehavior,
    ) -> DependResult<()>;
}

/// Bundle of collaborators handed to the dependency manager
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn ObjectCatalog>,
    pub mutator: Arc<dyn CatalogMutator>,
    pub cascade: Arc<dyn CascadeEngine>,
}

impl Collaborators {
    pub fn new(
        catalog: Arc<dyn ObjectCatalog>,
        mutator: Arc<dyn CatalogMutator>,
        cascade: Arc<dyn CascadeEngine>,
    ) -> Self {
        Self {
            catalog,
            mutator,
            cascade,
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
