// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! # catdeps
//!
//! Dependency tracking for a relational catalog.
//!
//! Every catalog object can record which other objects it relies on so that
//! drops can be refused or cascaded, owners reassigned, and extension
//! membership answered. Two stores are provided:
//!
//! - the **local store**, edges between objects of one database
//! - the **shared store**, edges onto cluster-wide objects (roles,
//!   tablespaces, databases), including bulk role cleanup
//!
//! ## Quick start
//!
//! ```ignore
//! use catdeps::{Collaborators, DependConfig, DependencyKind, DependencyManager, ObjectAddress};
//!
//! let manager = DependencyManager::open(DependConfig::in_memory(), collaborators)?;
//! let mut txn = manager.begin(1)?;
//! txn.record_dependency(
//!     &ObjectAddress::relation(16400),
//!     &ObjectAddress::new(CatalogId::TYPE, 16390),
//!     DependencyKind::Normal,
//! )?;
//! txn.record_owner(&ObjectAddress::relation(16400), 16384)?;
//! txn.commit()?;
//! ```

pub mod address;
pub mod catalog;
pub mod config;
pub mod depend;
pub mod error;
pub mod storage;
pub mod txn;

pub use address::{CatalogId, ObjectAddress, ObjectAddresses, Oid, INVALID_OID};
pub use catalog::{
    CascadeEngine, CatalogMutator, Collaborators, DropBehavior, ObjectCatalog, OwnerChange,
    RelationKind,
};
pub use config::{DependConfig, StorageConfig};
pub use depend::shared::{oid_list_diff, DEFAULT_TABLESPACE_OID, GLOBAL_TABLESPACE_OID};
pub use depend::{
    AclDependencyDiff, DependencyKind, DependentObject, DependentObjects, DependentReport,
    DependentVia, LocalDependRow, RemoteDependents, SharedDependRow, SharedDependencyKind,
    StoredRow,
};
pub use error::{DependError, DependResult};
pub use storage::StorageType;
pub use txn::{
    DependencyManager, ExtensionScriptGuard, LockMode, StoreStatistics, Transaction,
    TransactionId, TransactionStatus,
};
