//! Test utilities for catdeps integration tests
//!
//! - MockCatalog: in-memory stand-in for the rest of the catalog that records
//!   every collaborator call
//! - TestFixture: a dependency manager wired to a MockCatalog

pub mod mock_catalog;
pub mod test_fixture;
