// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Dependent-object discovery and reporting
//!
//! Used before dropping an object (typically a role or tablespace) to find
//! everything still depending on it. Dependents in the current database and
//! cluster-wide dependents can be described; for other databases only a
//! count per database is available.

use crate::address::{ObjectAddress, Oid};
use crate::error::{DependError, DependResult};
use crate::txn::Transaction;

use super::{DependencyKind, SharedDependencyKind};

/// Through which relation, and how, an object depends on the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependentVia {
    Local(DependencyKind),
    Shared(SharedDependencyKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependentObject {
    pub object: ObjectAddress,
    pub via: DependentVia,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteDependents {
    pub database_id: Oid,
    pub count: usize,
}

/// Everything found depending on one object, classified by where it lives
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependentObjects {
    /// Objects of the current database
    pub local: Vec<DependentObject>,
    /// Cluster-wide objects
    pub shared: Vec<DependentObject>,
    /// Objects of other databases, counted per database in discovery order
    pub remote: Vec<RemoteDependents>,
}

impl DependentObjects {
    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.shared.is_empty() && self.remote.is_empty()
    }

    pub fn contains(&self, object: &ObjectAddress) -> bool {
        self.local
            .iter()
            .chain(self.shared.iter())
            .any(|d| d.object == *object)
    }

    pub fn total(&self) -> usize {
        self.local.len() + self.shared.len() + self.remote.iter().map(|r| r.count).sum::<usize>()
    }
}

/// Rendered report: `detail` is capped for users, `detail_log` is complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependentReport {
    pub detail: String,
    pub detail_log: String,
}

fn push_line(buf: &mut String, line: &str) {
    if !buf.is_empty() {
        buf.push('\n');
    }
    buf.push_str(line);
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        one.to_string()
    } else {
        many.to_string()
    }
}

impl Transaction {
    /// Find every object depending on `object`, in either store.
    ///
    /// Fails with `RequiredBySystem` when the object, or the whole object it
    /// is part of, is pinned: a pinned object can never be dropped.
    pub fn collect_dependents(&mut self, object: &ObjectAddress) -> DependResult<DependentObjects> {
        if self.is_object_pinned(object)? {
            return Err(DependError::RequiredBySystem(self.describe_or_address(object)));
        }
        let mut found = DependentObjects::default();

        let local_rows = self.dependents_of(object)?;
        for stored in &local_rows {
            if stored.row.kind == DependencyKind::Pin {
                return Err(DependError::RequiredBySystem(self.describe_or_address(object)));
            }
            found.local.push(DependentObject {
                object: stored.row.depender,
                via: DependentVia::Local(stored.row.kind),
            });
        }

        let shared_rows = self.shared_dependents_of(&object.whole_object())?;
        let my_db = self.database_id();
        for stored in &shared_rows {
            let row = stored.row;
            if row.kind == SharedDependencyKind::Pin {
                return Err(DependError::RequiredBySystem(self.describe_or_address(object)));
            }
            let dependent = DependentObject {
                object: row.depender,
                via: DependentVia::Shared(row.kind),
            };
            if row.database_id == my_db {
                found.local.push(dependent);
            } else if row.database_id == 0 {
                found.shared.push(dependent);
            } else if let Some(remote) = found
                .remote
                .iter_mut()
                .find(|r| r.database_id == row.database_id)
            {
                remote.count += 1;
            } else {
                found.remote.push(RemoteDependents {
                    database_id: row.database_id,
                    count: 1,
                });
            }
        }
        Ok(found)
    }

    fn describe_dependent(&self, target: &ObjectAddress, dependent: &DependentObject) -> Option<String> {
        let catalog = self.catalog();
        let Some(description) = catalog.describe_object(&dependent.object) else {
            log::warn!("Skipping {} in dependency report: no description", dependent.object);
            return None;
        };
        Some(match dependent.via {
            DependentVia::Shared(SharedDependencyKind::Owner) => format!("owner of {}", description),
            DependentVia::Shared(SharedDependencyKind::Acl) => {
                format!("privileges for {}", description)
            }
            DependentVia::Shared(SharedDependencyKind::Policy) => {
                format!("target of {}", description)
            }
            DependentVia::Shared(SharedDependencyKind::Tablespace) => {
                format!("tablespace for {}", description)
            }
            DependentVia::Shared(SharedDependencyKind::Pin) => return None,
            DependentVia::Local(_) => {
                format!("{} depends on {}", description, self.describe_or_address(target))
            }
        })
    }

    /// Render dependents as a user detail (at most `max_reported_dependents`
    /// objects and databases) and a complete log detail. `None` when there is
    /// nothing to report, including when every dependent vanished before it
    /// could be described.
    pub fn report_dependents(
        &self,
        target: &ObjectAddress,
        dependents: &DependentObjects,
    ) -> Option<DependentReport> {
        if dependents.is_empty() {
            return None;
        }
        let max = self.config().max_reported_dependents;
        let mut detail = String::new();
        let mut detail_log = String::new();

        let mut reported = 0usize;
        let mut not_reported = 0usize;
        for dependent in dependents.local.iter().chain(dependents.shared.iter()) {
            let Some(line) = self.describe_dependent(target, dependent) else {
                continue;
            };
            if reported < max {
                reported += 1;
                push_line(&mut detail, &line);
            } else {
                not_reported += 1;
            }
            push_line(&mut detail_log, &line);
        }

        let mut reported_dbs = 0usize;
        let mut not_reported_dbs = 0usize;
        for remote in &dependents.remote {
            let database = ObjectAddress::database(remote.database_id);
            let line = format!(
                "{} {} in {}",
                remote.count,
                plural(remote.count, "object", "objects"),
                self.describe_or_address(&database)
            );
            if reported_dbs < max {
                reported_dbs += 1;
                push_line(&mut detail, &line);
            } else {
                not_reported_dbs += 1;
            }
            push_line(&mut detail_log, &line);
        }

        if detail_log.is_empty() {
            return None;
        }

        if not_reported > 0 {
            push_line(
                &mut detail,
                &format!(
                    "and {} other {} (see server log for list)",
                    not_reported,
                    plural(not_reported, "object", "objects")
                ),
            );
        }
        if not_reported_dbs > 0 {
            push_line(
                &mut detail,
                &format!(
                    "and objects in {} other {} (see server log for list)",
                    not_reported_dbs,
                    plural(not_reported_dbs, "database", "databases")
                ),
            );
        }
        if not_reported > 0 || not_reported_dbs > 0 {
            log::info!(
                "Objects depending on {}:\n{}",
                self.describe_or_address(target),
                detail_log
            );
        }

        Some(DependentReport { detail, detail_log })
    }

    /// Refuse to drop `object` while anything depends on it.
    pub fn ensure_no_shared_dependents(&mut self, object: &ObjectAddress) -> DependResult<()> {
        let dependents = self.collect_dependents(object)?;
        match self.report_dependents(object, &dependents) {
            None => Ok(()),
            Some(report) => Err(DependError::DependentObjectsStillExist {
                object: self.describe_or_address(object),
                detail: report.detail,
                detail_log: report.detail_log,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "object", "objects"), "object");
        assert_eq!(plural(3, "object", "objects"), "objects");
    }

    #[test]
    fn test_push_line_separates_entries() {
        let mut buf = String::new();
        push_line(&mut buf, "owner of table t");
        push_line(&mut buf, "privileges for schema s");
        assert_eq!(buf, "owner of table t\nprivileges for schema s");
    }

    #[test]
    fn test_dependent_objects_totals() {
        let mut deps = DependentObjects::default();
        assert!(deps.is_empty());
        deps.local.push(DependentObject {
            object: ObjectAddress::relation(5),
            via: DependentVia::Local(DependencyKind::Normal),
        });
        deps.remote.push(RemoteDependents {
            database_id: 7,
            count: 3,
        });
        assert_eq!(deps.total(), 4);
        assert!(deps.contains(&ObjectAddress::relation(5)));
        assert!(!deps.contains(&ObjectAddress::relation(6)));
    }
}
