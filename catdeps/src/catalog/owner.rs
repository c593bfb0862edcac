// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Per-catalog owner change dispatch used by reassign-owned

use crate::address::{CatalogId, ObjectAddress, Oid};
use crate::error::{DependError, DependResult};
use crate::txn::Transaction;

/// The alter-owner operation to run for one owned object.
///
/// The set of catalogs that can carry an owner is closed; anything else
/// reaching [`OwnerChange::classify`] means the shared store is corrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerChange {
    Type(Oid),
    Schema(Oid),
    /// Always recursing: indexes and owned sequences may be visited before
    /// the table they belong to.
    Relation(Oid),
    ForeignServer(Oid),
    ForeignDataWrapper(Oid),
    EventTrigger(Oid),
    Publication(Oid),
    Subscription(Oid),
    /// Catalogs whose owner is a plain column
    Generic(ObjectAddress),
}

impl OwnerChange {
    /// Pick the operation for an owned object. `Ok(None)` means the object is
    /// deliberately left alone (default privileges and user mappings belong
    /// to drop-owned, not reassign-owned).
    pub fn classify(object: &ObjectAddress) -> DependResult<Option<OwnerChange>> {
        let id = object.object_id;
        let change = match object.catalog {
            CatalogId::TYPE => OwnerChange::Type(id),
            CatalogId::NAMESPACE => OwnerChange::Schema(id),
            CatalogId::RELATION => OwnerChange::Relation(id),
            CatalogId::DEFAULT_ACL | CatalogId::USER_MAPPING => return Ok(None),
            CatalogId::FOREIGN_SERVER => OwnerChange::ForeignServer(id),
            CatalogId::FOREIGN_DATA_WRAPPER => OwnerChange::ForeignDataWrapper(id),
            CatalogId::EVENT_TRIGGER => OwnerChange::EventTrigger(id),
            CatalogId::PUBLICATION => OwnerChange::Publication(id),
            CatalogId::SUBSCRIPTION => OwnerChange::Subscription(id),
            CatalogId::COLLATION
            | CatalogId::CONVERSION
            | CatalogId::OPERATOR
            | CatalogId::PROCEDURE
            | CatalogId::LANGUAGE
            | CatalogId::LARGE_OBJECT
            | CatalogId::OPERATOR_FAMILY
            | CatalogId::OPERATOR_CLASS
            | CatalogId::EXTENSION
            | CatalogId::STATISTIC_EXT
            | CatalogId::TABLESPACE
            | CatalogId::DATABASE
            | CatalogId::TS_CONFIG
            | CatalogId::TS_DICTIONARY => OwnerChange::Generic(object.whole_object()),
            other => {
                return Err(DependError::Internal(format!("unexpected classid {}", other)));
            }
        };
        Ok(Some(change))
    }

    /// Run the operation, making `new_owner` the owner of the object.
    pub fn apply(&self, txn: &mut Transaction, new_owner: Oid) -> DependResult<()> {
        let mutator = txn.mutator();
        match *self {
            OwnerChange::Type(id) => mutator.alter_type_owner(txn, id, new_owner),
            OwnerChange::Schema(id) => mutator.alter_schema_owner(txn, id, new_owner),
            OwnerChange::Relation(id) => mutator.alter_relation_owner(txn, id, new_owner, true),
            OwnerChange::ForeignServer(id) => {
                mutator.alter_foreign_server_owner(txn, id, new_owner)
            }
            OwnerChange::ForeignDataWrapper(id) => {
                mutator.alter_foreign_data_wrapper_owner(txn, id, new_owner)
            }
            OwnerChange::EventTrigger(id) => mutator.alter_event_trigger_owner(txn, id, new_owner),
            OwnerChange::Publication(id) => mutator.alter_publication_owner(txn, id, new_owner),
            OwnerChange::Subscription(id) => {
                mutator.alter_subscription_owner(txn, id, new_owner)
            }
            OwnerChange::Generic(object) => {
                mutator.rewrite_owner_column(txn, &object, new_owner)?;
                txn.change_owner_dependency(&object, new_owner)
            }
        }
    }
}
