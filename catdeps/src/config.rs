// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Dependency store configuration

use crate::error::{DependError, DependResult};
use crate::storage::StorageType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where and how the dependency relations are persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend used for the dependency tree
    pub storage_type: StorageType,
    /// Directory of the on-disk store (ignored by the memory backend)
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageType::default(),
            path: PathBuf::from("./catdeps-data"),
        }
    }
}

/// Configuration for the dependency manager
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DependConfig {
    pub storage: StorageConfig,

    /// Maximum number of dependents described in a user-facing report
    pub max_reported_dependents: usize,

    /// Byte budget for one batched insert of dependency rows
    pub multi_insert_bytes: usize,

    /// How long a lock request may wait before failing
    pub lock_timeout_ms: u64,
}

impl Default for DependConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            max_reported_dependents: 100,
            multi_insert_bytes: 65535,
            lock_timeout_ms: 5000,
        }
    }
}

impl DependConfig {
    /// Configuration backed by the in-memory driver
    pub fn in_memory() -> Self {
        Self {
            storage: StorageConfig {
                storage_type: StorageType::Memory,
                path: PathBuf::new(),
            },
            ..Self::default()
        }
    }

    /// Configuration backed by sled at the given directory
    pub fn sled<P: AsRef<Path>>(path: P) -> Self {
        Self {
            storage: StorageConfig {
                storage_type: StorageType::Sled,
                path: path.as_ref().to_path_buf(),
            },
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> DependResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: DependConfig = serde_json::from_str(&text).map_err(|e| {
            DependError::Config(format!(
                "invalid configuration in {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DependResult<()> {
        if self.multi_insert_bytes == 0 {
            return Err(DependError::Config(
                "multi_insert_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}
