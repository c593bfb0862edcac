// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for the dependency stores

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DependError {
    /// Caller handed over a malformed or self-contradictory reference.
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    /// The referenced object disappeared between lookup and lock.
    #[error("{0} was concurrently dropped")]
    ConcurrentlyDropped(String),

    #[error("tuple concurrently updated: {0}")]
    TupleConcurrentlyUpdated(String),

    /// The object is pinned and cannot be dropped at all.
    #[error("cannot drop {0} because it is required by the database system")]
    RequiredBySystem(String),

    /// Bulk role operation attempted on a pinned role.
    #[error("cannot drop objects owned by {0} because they are required by the database system")]
    OwnedObjectsRequiredBySystem(String),

    #[error("cannot reassign ownership of objects owned by {0} because they are required by the database system")]
    ReassignRequiredBySystem(String),

    #[error("cannot remove dependency on {0} because it is a system object")]
    SystemObject(String),

    #[error("{message}")]
    NotInPrerequisiteState {
        message: String,
        detail: Option<String>,
    },

    #[error("cannot drop {object} because other objects depend on it")]
    DependentObjectsStillExist {
        object: String,
        detail: String,
        detail_log: String,
    },

    /// Internal-consistency failure; the catalog itself is suspect.
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Feature not supported: {0}")]
    FeatureNotSupported(String),

    #[error("Lock timeout: {0}")]
    LockTimeout(String),

    #[error("Transaction already finished: {0}")]
    TransactionFinished(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl DependError {
    pub(crate) fn not_in_prerequisite_state(message: impl Into<String>) -> Self {
        DependError::NotInPrerequisiteState {
            message: message.into(),
            detail: None,
        }
    }

    /// True for errors caused by a concurrent session rather than by the caller.
    pub fn is_concurrency_loss(&self) -> bool {
        matches!(
            self,
            DependError::ConcurrentlyDropped(_)
                | DependError::TupleConcurrentlyUpdated(_)
                | DependError::LockTimeout(_)
        )
    }
}

impl From<std::io::Error> for DependError {
    fn from(err: std::io::Error) -> Self {
        DependError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DependError {
    fn from(err: serde_json::Error) -> Self {
        DependError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for DependError {
    fn from(err: bincode::Error) -> Self {
        DependError::Serialization(err.to_string())
    }
}

impl From<crate::storage::StorageDriverError> for DependError {
    fn from(err: crate::storage::StorageDriverError) -> Self {
        DependError::Storage(err.to_string())
    }
}

pub type DependResult<T> = Result<T, DependError>;
