// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Object addresses
//!
//! Every catalog entry is identified by the catalog it lives in, its object id
//! within that catalog, and an optional sub-object id (a column number, for
//! instance). Dependency edges are recorded between two such addresses.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

/// Object identifier, unique within one catalog
pub type Oid = u32;

/// The "no object" id
pub const INVALID_OID: Oid = 0;

/// Identifier of the catalog an object belongs to (its kind)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CatalogId(pub Oid);

impl CatalogId {
    pub const INVALID: CatalogId = CatalogId(INVALID_OID);

    // Cluster-wide catalogs
    pub const TABLESPACE: CatalogId = CatalogId(1213);
    pub const SHARED_DEPEND: CatalogId = CatalogId(1214);
    pub const AUTH_ID: CatalogId = CatalogId(1260);
    pub const AUTH_MEMBERS: CatalogId = CatalogId(1261);
    pub const DATABASE: CatalogId = CatalogId(1262);
    pub const SUBSCRIPTION: CatalogId = CatalogId(6100);
    pub const PARAMETER_ACL: CatalogId = CatalogId(6243);

    // Per-database catalogs
    pub const DEFAULT_ACL: CatalogId = CatalogId(826);
    pub const FOREIGN_SERVER: CatalogId = CatalogId(1417);
    pub const USER_MAPPING: CatalogId = CatalogId(1418);
    pub const TYPE: CatalogId = CatalogId(1247);
    pub const PROCEDURE: CatalogId = CatalogId(1255);
    pub const RELATION: CatalogId = CatalogId(1259);
    pub const FOREIGN_DATA_WRAPPER: CatalogId = CatalogId(2328);
    pub const CONSTRAINT: CatalogId = CatalogId(2606);
    pub const CONVERSION: CatalogId = CatalogId(2607);
    pub const DEPEND: CatalogId = CatalogId(2608);
    pub const LANGUAGE: CatalogId = CatalogId(2612);
    pub const LARGE_OBJECT: CatalogId = CatalogId(2613);
    pub const NAMESPACE: CatalogId = CatalogId(2615);
    pub const OPERATOR_CLASS: CatalogId = CatalogId(2616);
    pub const OPERATOR: CatalogId = CatalogId(2617);
    pub const OPERATOR_FAMILY: CatalogId = CatalogId(2753);
    pub const EXTENSION: CatalogId = CatalogId(3079);
    pub const POLICY: CatalogId = CatalogId(3256);
    pub const STATISTIC_EXT: CatalogId = CatalogId(3381);
    pub const COLLATION: CatalogId = CatalogId(3456);
    pub const EVENT_TRIGGER: CatalogId = CatalogId(3466);
    pub const TS_DICTIONARY: CatalogId = CatalogId(3600);
    pub const TS_CONFIG: CatalogId = CatalogId(3602);
    pub const PUBLICATION: CatalogId = CatalogId(6104);

    /// Get the underlying id value
    pub fn oid(&self) -> Oid {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0 != INVALID_OID
    }

    /// Whether objects of this catalog are visible from every database
    pub fn is_shared(&self) -> bool {
        matches!(
            *self,
            CatalogId::TABLESPACE
                | CatalogId::SHARED_DEPEND
                | CatalogId::AUTH_ID
                | CatalogId::AUTH_MEMBERS
                | CatalogId::DATABASE
                | CatalogId::SUBSCRIPTION
                | CatalogId::PARAMETER_ACL
        )
    }

    const WELL_KNOWN: [CatalogId; 31] = [
        CatalogId::TABLESPACE,
        CatalogId::SHARED_DEPEND,
        CatalogId::AUTH_ID,
        CatalogId::AUTH_MEMBERS,
        CatalogId::DATABASE,
        CatalogId::SUBSCRIPTION,
        CatalogId::PARAMETER_ACL,
        CatalogId::DEFAULT_ACL,
        CatalogId::FOREIGN_SERVER,
        CatalogId::USER_MAPPING,
        CatalogId::TYPE,
        CatalogId::PROCEDURE,
        CatalogId::RELATION,
        CatalogId::FOREIGN_DATA_WRAPPER,
        CatalogId::CONSTRAINT,
        CatalogId::CONVERSION,
        CatalogId::DEPEND,
        CatalogId::LANGUAGE,
        CatalogId::LARGE_OBJECT,
        CatalogId::NAMESPACE,
        CatalogId::OPERATOR_CLASS,
        CatalogId::OPERATOR,
        CatalogId::OPERATOR_FAMILY,
        CatalogId::EXTENSION,
        CatalogId::POLICY,
        CatalogId::STATISTIC_EXT,
        CatalogId::COLLATION,
        CatalogId::EVENT_TRIGGER,
        CatalogId::TS_DICTIONARY,
        CatalogId::TS_CONFIG,
        CatalogId::PUBLICATION,
    ];

    /// Inverse of [`CatalogId::kind_name`] for the well-known catalogs
    pub fn from_kind_name(name: &str) -> Option<CatalogId> {
        Self::WELL_KNOWN
            .iter()
            .copied()
            .find(|c| c.kind_name().eq_ignore_ascii_case(name))
    }

    /// Human-readable kind name, used when no richer description is available
    pub fn kind_name(&self) -> &'static str {
        match *self {
            CatalogId::TABLESPACE => "tablespace",
            CatalogId::SHARED_DEPEND => "shared dependency",
            CatalogId::AUTH_ID => "role",
            CatalogId::AUTH_MEMBERS => "role membership",
            CatalogId::DATABASE => "database",
            CatalogId::SUBSCRIPTION => "subscription",
            CatalogId::PARAMETER_ACL => "parameter",
            CatalogId::DEFAULT_ACL => "default privileges",
            CatalogId::FOREIGN_SERVER => "server",
            CatalogId::USER_MAPPING => "user mapping",
            CatalogId::TYPE => "type",
            CatalogId::PROCEDURE => "function",
            CatalogId::RELATION => "relation",
            CatalogId::FOREIGN_DATA_WRAPPER => "foreign-data wrapper",
            CatalogId::CONSTRAINT => "constraint",
            CatalogId::CONVERSION => "conversion",
            CatalogId::DEPEND => "dependency",
            CatalogId::LANGUAGE => "language",
            CatalogId::LARGE_OBJECT => "large object",
            CatalogId::NAMESPACE => "schema",
            CatalogId::OPERATOR_CLASS => "operator class",
            CatalogId::OPERATOR => "operator",
            CatalogId::OPERATOR_FAMILY => "operator family",
            CatalogId::EXTENSION => "extension",
            CatalogId::POLICY => "policy",
            CatalogId::STATISTIC_EXT => "statistics object",
            CatalogId::COLLATION => "collation",
            CatalogId::EVENT_TRIGGER => "event trigger",
            CatalogId::TS_DICTIONARY => "text search dictionary",
            CatalogId::TS_CONFIG => "text search configuration",
            CatalogId::PUBLICATION => "publication",
            _ => "object",
        }
    }
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address of a catalog entry or one of its sub-parts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectAddress {
    pub catalog: CatalogId,
    pub object_id: Oid,
    /// Zero for the whole object, otherwise e.g. a column number
    pub sub_id: i32,
}

impl ObjectAddress {
    pub fn new(catalog: CatalogId, object_id: Oid) -> Self {
        Self {
            catalog,
            object_id,
            sub_id: 0,
        }
    }

    pub fn with_sub_id(catalog: CatalogId, object_id: Oid, sub_id: i32) -> Self {
        Self {
            catalog,
            object_id,
            sub_id,
        }
    }

    pub fn role(role_id: Oid) -> Self {
        Self::new(CatalogId::AUTH_ID, role_id)
    }

    pub fn relation(relation_id: Oid) -> Self {
        Self::new(CatalogId::RELATION, relation_id)
    }

    pub fn column(relation_id: Oid, attnum: i32) -> Self {
        Self::with_sub_id(CatalogId::RELATION, relation_id, attnum)
    }

    pub fn extension(extension_id: Oid) -> Self {
        Self::new(CatalogId::EXTENSION, extension_id)
    }

    pub fn database(database_id: Oid) -> Self {
        Self::new(CatalogId::DATABASE, database_id)
    }

    pub fn tablespace(tablespace_id: Oid) -> Self {
        Self::new(CatalogId::TABLESPACE, tablespace_id)
    }

    /// The whole-object address this address is part of
    pub fn whole_object(&self) -> Self {
        Self::new(self.catalog, self.object_id)
    }

    pub fn is_whole_object(&self) -> bool {
        self.sub_id == 0
    }

    pub fn is_shared(&self) -> bool {
        self.catalog.is_shared()
    }

    /// Order used to delete a batch of objects: newest (highest id) first,
    /// then by catalog, then whole objects before their sub-parts.
    fn reverse_creation_cmp(&self, other: &Self) -> Ordering {
        other
            .object_id
            .cmp(&self.object_id)
            .then_with(|| self.catalog.cmp(&other.catalog))
            .then_with(|| (self.sub_id as u32).cmp(&(other.sub_id as u32)))
    }
}

impl fmt::Display for ObjectAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.catalog.kind_name(), self.object_id)?;
        if self.sub_id != 0 {
            write!(f, " column {}", self.sub_id)?;
        }
        Ok(())
    }
}

/// Ordered collection of object addresses without duplicates
#[derive(Debug, Clone, Default)]
pub struct ObjectAddresses {
    addresses: Vec<ObjectAddress>,
    members: HashSet<ObjectAddress>,
}

impl ObjectAddresses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an address unless it is already present. Returns whether it was added.
    pub fn add(&mut self, address: ObjectAddress) -> bool {
        if !self.members.insert(address) {
            return false;
        }
        self.addresses.push(address);
        true
    }

    pub fn contains(&self, address: &ObjectAddress) -> bool {
        self.members.contains(address)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectAddress> {
        self.addresses.iter()
    }

    pub fn as_slice(&self) -> &[ObjectAddress] {
        &self.addresses
    }

    /// Sort into approximate reverse-creation order. Object ids are assigned
    /// increasingly, so deleting the highest ids first removes dependers before
    /// the objects they were created on top of.
    pub fn sort_reverse_creation(&mut self) {
        self.addresses.sort_by(|a, b| a.reverse_creation_cmp(b));
    }
}

impl PartialEq for ObjectAddresses {
    fn eq(&self, other: &Self) -> bool {
        self.addresses == other.addresses
    }
}

impl Eq for ObjectAddresses {}

impl FromIterator<ObjectAddress> for ObjectAddresses {
    fn from_iter<I: IntoIterator<Item = ObjectAddress>>(iter: I) -> Self {
        let mut addresses = ObjectAddresses::new();
        for address in iter {
            addresses.add(address);
        }
        addresses
    }
}

impl<'a> IntoIterator for &'a ObjectAddresses {
    type Item = &'a ObjectAddress;
    type IntoIter = std::slice::Iter<'a, ObjectAddress>;

    fn into_iter(self) -> Self::IntoIter {
        self.addresses.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_equality_uses_all_fields() {
        let a = ObjectAddress::column(16384, 1);
        let b = ObjectAddress::column(16384, 2);
        assert_ne!(a, b);
        assert_eq!(a.whole_object(), b.whole_object());
        assert_eq!(a, ObjectAddress::with_sub_id(CatalogId::RELATION, 16384, 1));
    }

    #[test]
    fn test_shared_catalogs() {
        assert!(CatalogId::AUTH_ID.is_shared());
        assert!(CatalogId::TABLESPACE.is_shared());
        assert!(CatalogId::DATABASE.is_shared());
        assert!(!CatalogId::RELATION.is_shared());
        assert!(!CatalogId::EXTENSION.is_shared());
    }

    #[test]
    fn test_kind_name_round_trip() {
        assert_eq!(CatalogId::from_kind_name("role"), Some(CatalogId::AUTH_ID));
        assert_eq!(CatalogId::from_kind_name("Schema"), Some(CatalogId::NAMESPACE));
        assert_eq!(
            CatalogId::from_kind_name("foreign-data wrapper"),
            Some(CatalogId::FOREIGN_DATA_WRAPPER)
        );
        assert_eq!(CatalogId::from_kind_name("object"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(ObjectAddress::relation(42).to_string(), "relation 42");
        assert_eq!(ObjectAddress::column(42, 3).to_string(), "relation 42 column 3");
        assert_eq!(ObjectAddress::role(10).to_string(), "role 10");
    }

    #[test]
    fn test_addresses_deduplicate() {
        let mut objects = ObjectAddresses::new();
        assert!(objects.add(ObjectAddress::relation(1)));
        assert!(!objects.add(ObjectAddress::relation(1)));
        assert!(objects.add(ObjectAddress::column(1, 1)));
        assert_eq!(objects.len(), 2);
    }

    #[test]
    fn test_addresses_keep_insertion_order_at_scale() {
        let mut objects = ObjectAddresses::new();
        for id in (1..=5000).rev() {
            assert!(objects.add(ObjectAddress::relation(id)));
        }
        for id in 1..=5000 {
            assert!(!objects.add(ObjectAddress::relation(id)));
        }
        assert_eq!(objects.len(), 5000);
        assert_eq!(objects.as_slice()[0], ObjectAddress::relation(5000));
        assert_eq!(objects.as_slice()[4999], ObjectAddress::relation(1));

        objects.sort_reverse_creation();
        assert!(objects.contains(&ObjectAddress::relation(42)));
        assert!(!objects.contains(&ObjectAddress::relation(5001)));
    }

    #[test]
    fn test_reverse_creation_sort() {
        let mut objects: ObjectAddresses = vec![
            ObjectAddress::relation(100),
            ObjectAddress::new(CatalogId::PROCEDURE, 300),
            ObjectAddress::new(CatalogId::TYPE, 300),
            ObjectAddress::column(200, 2),
            ObjectAddress::relation(200),
        ]
        .into_iter()
        .collect();

        objects.sort_reverse_creation();

        let sorted: Vec<_> = objects.iter().copied().collect();
        assert_eq!(
            sorted,
            vec![
                ObjectAddress::new(CatalogId::TYPE, 300),
                ObjectAddress::new(CatalogId::PROCEDURE, 300),
                ObjectAddress::relation(200),
                ObjectAddress::column(200, 2),
                ObjectAddress::relation(100),
            ]
        );
    }
}
