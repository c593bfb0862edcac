// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Interfaces to the rest of the catalog

pub mod owner;
pub mod traits;

pub use owner::OwnerChange;
pub use traits::{
    CascadeEngine, CatalogMutator, Collaborators, DropBehavior, ObjectCatalog, RelationKind,
};
