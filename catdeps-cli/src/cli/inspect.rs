// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Read-only inspection of a persisted dependency store

use std::sync::Arc;

use catdeps::{
    CascadeEngine, CatalogMutator, Collaborators, DependConfig, DependError, DependResult,
    DependencyManager, DependentVia, DropBehavior, ObjectAddress, ObjectAddresses, ObjectCatalog,
    Oid, RelationKind, SharedDependencyKind, Transaction,
};
use colored::Colorize;

use super::commands::{Cli, OutputFormat};
use super::output::{Listing, ResultFormatter};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Catalog stand-in for offline inspection: every object is taken to exist
/// and is described by its address. Nothing can be changed through it.
pub struct InspectionCatalog;

impl ObjectCatalog for InspectionCatalog {
    fn object_exists(&self, _object: &ObjectAddress) -> bool {
        true
    }

    fn describe_object(&self, object: &ObjectAddress) -> Option<String> {
        Some(object.to_string())
    }

    fn relation_kind(&self, _relation_id: Oid) -> Option<RelationKind> {
        None
    }
}

fn read_only<T>(what: &str) -> DependResult<T> {
    Err(DependError::FeatureNotSupported(format!(
        "{} is not available in the inspector",
        what
    )))
}

impl CatalogMutator for InspectionCatalog {
    fn revoke_all(&self, _: &mut Transaction, _: &ObjectAddress, _: Oid) -> DependResult<()> {
        read_only("REVOKE")
    }

    fn remove_role_from_policy(&self, _: &mut Transaction, _: Oid, _: Oid) -> DependResult<bool> {
        read_only("ALTER POLICY")
    }

    fn alter_type_owner(&self, _: &mut Transaction, _: Oid, _: Oid) -> DependResult<()> {
        read_only("ALTER TYPE")
    }

    fn alter_schema_owner(&self, _: &mut Transaction, _: Oid, _: Oid) -> DependResult<()> {
        read_only("ALTER SCHEMA")
    }

    fn alter_relation_owner(&self, _: &mut Transaction, _: Oid, _: Oid, _: bool) -> DependResult<()> {
        read_only("ALTER TABLE")
    }

    fn alter_foreign_server_owner(&self, _: &mut Transaction, _: Oid, _: Oid) -> DependResult<()> {
        read_only("ALTER SERVER")
    }

    fn alter_foreign_data_wrapper_owner(
        &self,
        _: &mut Transaction,
        _: Oid,
        _: Oid,
    ) -> DependResult<()> {
        read_only("ALTER FOREIGN DATA WRAPPER")
    }

    fn alter_event_trigger_owner(&self, _: &mut Transaction, _: Oid, _: Oid) -> DependResult<()> {
        read_only("ALTER EVENT TRIGGER")
    }

    fn alter_publication_owner(&self, _: &mut Transaction, _: Oid, _: Oid) -> DependResult<()> {
        read_only("ALTER PUBLICATION")
    }

    fn alter_subscription_owner(&self, _: &mut Transaction, _: Oid, _: Oid) -> DependResult<()> {
        read_only("ALTER SUBSCRIPTION")
    }

    fn rewrite_owner_column(
        &self,
        _: &mut Transaction,
        _: &ObjectAddress,
        _: Oid,
    ) -> DependResult<()> {
        read_only("ALTER ... OWNER TO")
    }
}

impl CascadeEngine for InspectionCatalog {
    fn perform_deletions(
        &self,
        _: &mut Transaction,
        _: &ObjectAddresses,
        _: DropBehavior,
    ) -> DependResult<()> {
        read_only("DROP")
    }
}

/// Open the store named on the command line
pub fn open_store(cli: &Cli, max_reported: Option<usize>) -> DependResult<DependencyManager> {
    let mut config = match &cli.config {
        Some(path) => DependConfig::from_json_file(path)?,
        None => DependConfig::sled(&cli.path),
    };
    if let Some(max) = max_reported {
        config.max_reported_dependents = max;
    }
    let catalog = Arc::new(InspectionCatalog);
    DependencyManager::open(
        config,
        Collaborators::new(catalog.clone(), catalog.clone(), catalog),
    )
}

fn via_label(via: DependentVia) -> (&'static str, String) {
    match via {
        DependentVia::Local(kind) => ("local", format!("{:?}", kind).to_lowercase()),
        DependentVia::Shared(kind) => ("shared", format!("{:?}", kind).to_lowercase()),
    }
}

fn print(listing: &Listing, format: OutputFormat) {
    print!("{}", ResultFormatter::format(listing, format));
}

pub fn dependents_listing(
    txn: &mut Transaction,
    object: &ObjectAddress,
) -> DependResult<Listing> {
    let found = txn.collect_dependents(object)?;
    let mut listing = Listing::new(
        format!("Dependents of {}", object),
        &["object", "store", "kind", "database"],
    );
    for dependent in &found.local {
        let (store, kind) = via_label(dependent.via);
        listing.push(vec![
            dependent.object.to_string(),
            store.to_string(),
            kind,
            txn.database_id().to_string(),
        ]);
    }
    for dependent in &found.shared {
        let (store, kind) = via_label(dependent.via);
        listing.push(vec![
            dependent.object.to_string(),
            store.to_string(),
            kind,
            "0".to_string(),
        ]);
    }
    for remote in &found.remote {
        listing.push(vec![
            format!("{} object(s)", remote.count),
            "shared".to_string(),
            "-".to_string(),
            remote.database_id.to_string(),
        ]);
    }
    Ok(listing)
}

pub fn handle_dependents(cli: &Cli, object: ObjectAddress, report: Option<usize>) -> CliResult {
    let manager = open_store(cli, report)?;
    let mut txn = manager.begin(cli.database)?;

    match dependents_listing(&mut txn, &object) {
        Ok(listing) => print(&listing, cli.format),
        Err(DependError::RequiredBySystem(what)) => {
            println!("{}", format!("{} is pinned: required by the database system", what).yellow());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    if report.is_some() {
        let found = txn.collect_dependents(&object)?;
        if let Some(report) = txn.report_dependents(&object, &found) {
            println!("\n{}", "Report".bold());
            println!("{}", report.detail);
        }
    }
    txn.abort()?;
    Ok(())
}

pub fn handle_dependencies(cli: &Cli, object: ObjectAddress) -> CliResult {
    let manager = open_store(cli, None)?;
    let mut txn = manager.begin(cli.database)?;

    let mut listing = Listing::new(
        format!("Dependencies of {}", object),
        &["depender", "referenced", "store", "kind"],
    );
    for stored in txn.dependencies_of(&object)? {
        listing.push(vec![
            stored.row.depender.to_string(),
            stored.row.referenced.to_string(),
            "local".to_string(),
            format!("{:?}", stored.row.kind).to_lowercase(),
        ]);
    }
    for stored in txn.shared_dependencies_of(&object)? {
        listing.push(vec![
            stored.row.depender.to_string(),
            stored.row.referenced.to_string(),
            "shared".to_string(),
            format!("{:?}", stored.row.kind).to_lowercase(),
        ]);
    }
    print(&listing, cli.format);
    txn.abort()?;
    Ok(())
}

pub fn handle_pins(cli: &Cli) -> CliResult {
    let manager = open_store(cli, None)?;
    let mut txn = manager.begin(cli.database)?;

    let mut listing = Listing::new("Pinned objects", &["object", "catalog", "scope"]);
    for object in txn.pinned_objects()? {
        let scope = if object.is_shared() { "cluster" } else { "database" };
        listing.push(vec![
            object.to_string(),
            object.catalog.to_string(),
            scope.to_string(),
        ]);
    }
    print(&listing, cli.format);
    txn.abort()?;
    Ok(())
}

pub fn handle_owned_by(cli: &Cli, role: Oid) -> CliResult {
    let manager = open_store(cli, None)?;
    let mut txn = manager.begin(cli.database)?;

    let mut listing = Listing::new(format!("Objects owned by role {}", role), &["object", "database"]);
    for stored in txn.shared_dependents_of(&ObjectAddress::role(role))? {
        if stored.row.kind != SharedDependencyKind::Owner {
            continue;
        }
        let database = match stored.row.database_id {
            0 => "(cluster)".to_string(),
            db => db.to_string(),
        };
        listing.push(vec![stored.row.depender.to_string(), database]);
    }
    print(&listing, cli.format);
    txn.abort()?;
    Ok(())
}

pub fn handle_stats(cli: &Cli) -> CliResult {
    let manager = open_store(cli, None)?;
    let stats = manager.statistics()?;

    let mut listing = Listing::new("Dependency store statistics", &["metric", "value"]);
    for (metric, value) in [
        ("local edges", stats.local_edges),
        ("local pins", stats.local_pins),
        ("shared edges", stats.shared_edges),
        ("shared pins", stats.shared_pins),
        ("databases", stats.databases),
        ("size (bytes)", stats.size_bytes),
    ] {
        listing.push(vec![metric.to_string(), value.to_string()]);
    }
    print(&listing, cli.format);
    manager.shutdown()?;
    Ok(())
}
