//! Test fixture for dependency store integration tests
//!
//! Wires a DependencyManager to a MockCatalog and offers a few helpers for
//! the ids the tests use over and over.

#![allow(dead_code)]

use super::mock_catalog::MockCatalog;
use catdeps::{
    Collaborators, DependConfig, DependencyManager, ObjectAddress, Oid, Transaction,
};
use std::sync::Arc;
use tempfile::TempDir;

/// Database most tests run in
pub const DB: Oid = 5;
/// A second database, for cross-database cases
pub const OTHER_DB: Oid = 6;

/// Bootstrap superuser, pinned by `TestFixture::bootstrap`
pub const SUPERUSER: Oid = 10;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct TestFixture {
    pub manager: DependencyManager,
    pub catalog: Arc<MockCatalog>,
    config: DependConfig,
    _temp_dir: Option<TempDir>,
}

impl TestFixture {
    /// Fresh in-memory store
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_config(DependConfig::in_memory())
    }

    pub fn with_config(config: DependConfig) -> Result<Self, Box<dyn std::error::Error>> {
        init_logging();
        let catalog = Arc::new(MockCatalog::new());
        let manager = DependencyManager::open(config.clone(), collaborators(&catalog))?;
        Ok(Self {
            manager,
            catalog,
            config,
            _temp_dir: None,
        })
    }

    /// Store persisted with sled in a temporary directory
    pub fn persistent() -> Result<Self, Box<dyn std::error::Error>> {
        init_logging();
        let temp_dir = TempDir::new()?;
        let config = DependConfig::sled(temp_dir.path().join("depend"));
        let catalog = Arc::new(MockCatalog::new());
        let manager = DependencyManager::open(config.clone(), collaborators(&catalog))?;
        Ok(Self {
            manager,
            catalog,
            config,
            _temp_dir: Some(temp_dir),
        })
    }

    /// Close the store and open it again over the same data
    pub fn reopen(self) -> Result<Self, Box<dyn std::error::Error>> {
        let TestFixture {
            manager,
            catalog,
            config,
            _temp_dir,
        } = self;
        manager.shutdown()?;
        drop(manager);
        let manager = DependencyManager::open(config.clone(), collaborators(&catalog))?;
        Ok(Self {
            manager,
            catalog,
            config,
            _temp_dir,
        })
    }

    /// Pin the bootstrap superuser and commit
    pub fn bootstrap(&self) -> Result<(), Box<dyn std::error::Error>> {
        let mut txn = self.begin();
        txn.pin_object(&ObjectAddress::role(SUPERUSER))?;
        txn.commit()?;
        Ok(())
    }

    /// Transaction in the default test database
    pub fn begin(&self) -> Transaction {
        self.begin_in(DB)
    }

    pub fn begin_in(&self, database_id: Oid) -> Transaction {
        self.manager
            .begin(database_id)
            .expect("Failed to begin transaction")
    }
}

fn collaborators(catalog: &Arc<MockCatalog>) -> Collaborators {
    Collaborators::new(catalog.clone(), catalog.clone(), catalog.clone())
}
