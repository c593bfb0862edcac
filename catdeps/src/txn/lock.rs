// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Heavyweight locks held until the owning transaction ends
//!
//! Locks are identified by a [`LockTag`] and taken in one of four modes with
//! the usual relational conflict table. A transaction never conflicts with
//! itself. Waiters block on a condition variable until the lock is granted or
//! the configured timeout expires.

use crate::address::{CatalogId, Oid};
use crate::error::{DependError, DependResult};
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use super::state::TransactionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LockMode {
    AccessShare,
    RowExclusive,
    Exclusive,
    AccessExclusive,
}

impl LockMode {
    pub fn conflicts_with(self, other: LockMode) -> bool {
        use LockMode::*;
        match (self, other) {
            (AccessExclusive, _) | (_, AccessExclusive) => true,
            (AccessShare, _) | (_, AccessShare) => false,
            (RowExclusive, RowExclusive) => false,
            _ => true,
        }
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LockMode::AccessShare => "AccessShareLock",
            LockMode::RowExclusive => "RowExclusiveLock",
            LockMode::Exclusive => "ExclusiveLock",
            LockMode::AccessExclusive => "AccessExclusiveLock",
        };
        write!(f, "{}", name)
    }
}

/// What a lock protects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockTag {
    /// A catalog object; `db` is zero for cluster-wide objects
    Object {
        db: Oid,
        catalog: CatalogId,
        object_id: Oid,
    },
    /// A whole relation; `db` is zero for shared relations
    Relation { db: Oid, relation: CatalogId },
    /// One row of a relation
    Tuple { relation: CatalogId, row_id: u64 },
}

impl fmt::Display for LockTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockTag::Object {
                db,
                catalog,
                object_id,
            } => write!(f, "object {}/{}/{}", db, catalog, object_id),
            LockTag::Relation { db, relation } => write!(f, "relation {}/{}", db, relation),
            LockTag::Tuple { relation, row_id } => write!(f, "tuple {} of relation {}", row_id, relation),
        }
    }
}

/// Process-wide table of granted locks
pub struct LockManager {
    granted: Mutex<HashMap<LockTag, Vec<(TransactionId, LockMode)>>>,
    released: Condvar,
    timeout: Duration,
}

impl LockManager {
    pub fn new(timeout: Duration) -> Self {
        Self {
            granted: Mutex::new(HashMap::new()),
            released: Condvar::new(),
            timeout,
        }
    }

    /// Block until `owner` holds `tag` in `mode`, or fail with `LockTimeout`.
    pub fn acquire(&self, owner: TransactionId, tag: LockTag, mode: LockMode) -> DependResult<()> {
        let deadline = Instant::now() + self.timeout;
        let mut granted = self.granted.lock();

        loop {
            let holders = granted.entry(tag).or_default();
            if holders.iter().any(|(o, m)| *o == owner && *m == mode) {
                return Ok(());
            }
            let blocked = holders
                .iter()
                .any(|(o, m)| *o != owner && m.conflicts_with(mode));
            if !blocked {
                holders.push((owner, mode));
                return Ok(());
            }

            log::debug!("{} waiting for {} on {}", owner, mode, tag);
            if self.released.wait_until(&mut granted, deadline).timed_out() {
                let still_blocked = granted.get(&tag).map_or(false, |holders| {
                    holders
                        .iter()
                        .any(|(o, m)| *o != owner && m.conflicts_with(mode))
                });
                if still_blocked {
                    return Err(DependError::LockTimeout(format!(
                        "could not obtain {} on {}",
                        mode, tag
                    )));
                }
            }
        }
    }

    /// Release every lock held by `owner` and wake all waiters.
    pub fn release_all(&self, owner: TransactionId) {
        let mut granted = self.granted.lock();
        granted.retain(|_, holders| {
            holders.retain(|(o, _)| *o != owner);
            !holders.is_empty()
        });
        drop(granted);
        self.released.notify_all();
    }

    pub fn holds(&self, owner: TransactionId, tag: &LockTag, mode: LockMode) -> bool {
        self.granted
            .lock()
            .get(tag)
            .map_or(false, |holders| holders.iter().any(|(o, m)| *o == owner && *m == mode))
    }

    /// Number of distinct tags currently locked by anyone
    pub fn locked_tag_count(&self) -> usize {
        self.granted.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn role_tag(id: Oid) -> LockTag {
        LockTag::Object {
            db: 0,
            catalog: CatalogId::AUTH_ID,
            object_id: id,
        }
    }

    #[test]
    fn test_conflict_table() {
        use LockMode::*;
        assert!(!AccessShare.conflicts_with(RowExclusive));
        assert!(!AccessShare.conflicts_with(Exclusive));
        assert!(AccessShare.conflicts_with(AccessExclusive));
        assert!(!RowExclusive.conflicts_with(RowExclusive));
        assert!(RowExclusive.conflicts_with(Exclusive));
        assert!(Exclusive.conflicts_with(Exclusive));
        assert!(AccessExclusive.conflicts_with(AccessShare));
    }

    #[test]
    fn test_same_owner_never_conflicts() {
        let locks = LockManager::new(Duration::from_millis(10));
        let owner = TransactionId::new();
        locks
            .acquire(owner, role_tag(1), LockMode::AccessExclusive)
            .unwrap();
        locks.acquire(owner, role_tag(1), LockMode::AccessShare).unwrap();
        assert!(locks.holds(owner, &role_tag(1), LockMode::AccessShare));
    }

    #[test]
    fn test_conflicting_request_times_out() {
        let locks = LockManager::new(Duration::from_millis(20));
        let a = TransactionId::new();
        let b = TransactionId::new();
        locks.acquire(a, role_tag(1), LockMode::AccessExclusive).unwrap();

        let err = locks
            .acquire(b, role_tag(1), LockMode::AccessShare)
            .unwrap_err();
        assert!(matches!(err, DependError::LockTimeout(_)));

        locks.release_all(a);
        locks.acquire(b, role_tag(1), LockMode::AccessShare).unwrap();
        assert_eq!(locks.locked_tag_count(), 1);
    }

    #[test]
    fn test_waiter_wakes_on_release() {
        let locks = Arc::new(LockManager::new(Duration::from_secs(5)));
        let a = TransactionId::new();
        let b = TransactionId::new();
        locks.acquire(a, role_tag(7), LockMode::Exclusive).unwrap();

        let waiter = {
            let locks = Arc::clone(&locks);
            std::thread::spawn(move || locks.acquire(b, role_tag(7), LockMode::RowExclusive))
        };
        std::thread::sleep(Duration::from_millis(20));
        locks.release_all(a);

        assert!(waiter.join().unwrap().is_ok());
        assert!(locks.holds(b, &role_tag(7), LockMode::RowExclusive));
    }
}
