//! Local dependency store tests
//!
//! Recording, listing, deleting and repointing edges between objects of one
//! database, plus the pin rules that apply to them.

#[path = "testutils/mod.rs"]
mod testutils;

use catdeps::{CatalogId, DependError, DependencyKind, ObjectAddress, RelationKind};
use testutils::test_fixture::TestFixture;

fn table(id: u32) -> ObjectAddress {
    ObjectAddress::relation(id)
}

fn function(id: u32) -> ObjectAddress {
    ObjectAddress::new(CatalogId::PROCEDURE, id)
}

#[test]
fn test_recorded_edge_is_seen_from_both_ends() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let mut txn = fixture.begin();
    let view = table(16500);
    let base = table(16400);

    txn.record_dependency(&view, &base, DependencyKind::Normal)
        .expect("record should succeed");
    txn.command_counter_increment();

    let dependents = txn.collect_dependents(&base).expect("collect should succeed");
    assert!(dependents.contains(&view));

    let forward = txn.dependencies_of(&view).expect("scan should succeed");
    assert_eq!(forward.len(), 1);
    assert_eq!(forward[0].row.referenced, base);
    assert_eq!(forward[0].row.kind, DependencyKind::Normal);
    assert_eq!(forward[0].row.database_id, testutils::test_fixture::DB);

    let removed = txn.delete_dependencies_for(&view, false).expect("delete should succeed");
    assert_eq!(removed, 1);
    txn.command_counter_increment();

    let dependents = txn.collect_dependents(&base).expect("collect should succeed");
    assert!(!dependents.contains(&view));
    assert!(dependents.is_empty());
}

#[test]
fn test_own_writes_need_command_counter_increment() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let mut txn = fixture.begin();
    let depender = function(16600);

    txn.record_dependency(&depender, &table(16400), DependencyKind::Normal)
        .expect("record should succeed");
    assert!(txn.dependencies_of(&depender).unwrap().is_empty());
    assert_eq!(txn.pending_writes(), 2);

    txn.command_counter_increment();
    assert_eq!(txn.dependencies_of(&depender).unwrap().len(), 1);
}

#[test]
fn test_pinned_target_is_never_recorded() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let pinned = table(1259);
    let depender = table(16400);

    let mut txn = fixture.begin();
    txn.pin_object(&pinned).expect("pin should succeed");
    txn.commit().expect("commit should succeed");

    let mut txn = fixture.begin();
    txn.record_dependency(&depender, &pinned, DependencyKind::Auto)
        .expect("record onto a pinned object is a silent no-op");
    txn.command_counter_increment();

    assert!(txn.is_object_pinned(&pinned).unwrap());
    assert!(txn.dependencies_of(&depender).unwrap().is_empty());
    // Only the pin marker references the object
    let rows = txn.dependents_of(&pinned).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].row.kind, DependencyKind::Pin);

    match txn.collect_dependents(&pinned) {
        Err(DependError::RequiredBySystem(what)) => assert_eq!(what, "relation 1259"),
        other => panic!("expected RequiredBySystem, got {:?}", other),
    }
}

#[test]
fn test_pin_covers_sub_objects_and_is_idempotent() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let mut txn = fixture.begin();
    txn.pin_object(&ObjectAddress::column(1259, 3)).unwrap();
    txn.command_counter_increment();
    txn.pin_object(&table(1259)).unwrap();
    txn.command_counter_increment();

    assert!(txn.is_object_pinned(&table(1259)).unwrap());
    assert!(txn.is_object_pinned(&ObjectAddress::column(1259, 7)).unwrap());
    assert_eq!(txn.dependents_of(&table(1259)).unwrap().len(), 1);
    txn.commit().unwrap();

    let stats = fixture.manager.statistics().unwrap();
    assert_eq!(stats.local_pins, 1);
    assert_eq!(stats.local_edges, 0);
}

#[test]
fn test_column_of_pinned_relation_is_required_by_system() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let column = ObjectAddress::column(1259, 2);

    let mut txn = fixture.begin();
    txn.pin_object(&table(1259)).unwrap();
    txn.command_counter_increment();
    txn.record_dependency(&table(16400), &column, DependencyKind::Auto)
        .expect("record onto a pinned column is a silent no-op");
    txn.command_counter_increment();

    assert!(txn.is_object_pinned(&column).unwrap());
    assert!(txn.dependencies_of(&table(16400)).unwrap().is_empty());
    match txn.collect_dependents(&column) {
        Err(DependError::RequiredBySystem(what)) => assert_eq!(what, "relation 1259 column 2"),
        other => panic!("expected RequiredBySystem, got {:?}", other),
    }
}

#[test]
fn test_pins_are_per_database() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let mut txn = fixture.begin();
    txn.pin_object(&table(1259)).unwrap();
    txn.commit().unwrap();

    let mut other = fixture.begin_in(testutils::test_fixture::OTHER_DB);
    assert!(!other.is_object_pinned(&table(1259)).unwrap());
}

#[test]
fn test_pinned_objects_lists_both_stores() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    fixture.bootstrap().unwrap();
    let public = ObjectAddress::new(CatalogId::NAMESPACE, 2200);

    let mut txn = fixture.begin();
    txn.pin_object(&public).unwrap();
    txn.command_counter_increment();
    txn.record_dependency(&table(16400), &public, DependencyKind::Normal).unwrap();
    txn.command_counter_increment();
    assert!(txn.dependencies_of(&table(16400)).unwrap().is_empty());

    assert_eq!(
        txn.pinned_objects().unwrap(),
        vec![public, ObjectAddress::role(testutils::test_fixture::SUPERUSER)]
    );
    let mut other = fixture.begin_in(testutils::test_fixture::OTHER_DB);
    assert_eq!(
        other.pinned_objects().unwrap(),
        vec![ObjectAddress::role(testutils::test_fixture::SUPERUSER)]
    );
}

#[test]
fn test_record_rejects_pin_kind() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let mut txn = fixture.begin();
    let result = txn.record_dependency(&table(1), &table(2), DependencyKind::Pin);
    assert!(matches!(result, Err(DependError::IntegrityViolation(_))));
    assert_eq!(txn.pending_writes(), 0);
}

#[test]
fn test_record_fails_on_concurrently_dropped_target() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    fixture.catalog.mark_dropped(function(16700));

    let mut txn = fixture.begin();
    let result = txn.record_dependency(&table(16400), &function(16700), DependencyKind::Normal);
    match result {
        Err(e @ DependError::ConcurrentlyDropped(_)) => {
            assert!(e.is_concurrency_loss());
            assert_eq!(e.to_string(), "function 16700 was concurrently dropped");
        }
        other => panic!("expected ConcurrentlyDropped, got {:?}", other),
    }
}

#[test]
fn test_record_many_in_small_batches() {
    let config = catdeps::DependConfig {
        multi_insert_bytes: 1,
        ..catdeps::DependConfig::in_memory()
    };
    let fixture = TestFixture::with_config(config).expect("Failed to create fixture");
    let mut txn = fixture.begin();

    let targets: Vec<_> = (16400..16410).map(table).collect();
    txn.record_dependencies(&function(16800), &targets, DependencyKind::Normal)
        .expect("record should succeed");
    txn.commit().unwrap();

    let mut txn = fixture.begin();
    let rows = txn.dependencies_of(&function(16800)).unwrap();
    assert_eq!(rows.len(), 10);
    let mut row_ids: Vec<_> = rows.iter().map(|s| s.row_id).collect();
    row_ids.dedup();
    assert_eq!(row_ids.len(), 10);
}

#[test]
fn test_duplicate_edges_are_kept_distinct() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let mut txn = fixture.begin();
    txn.record_dependency(&table(2), &table(1), DependencyKind::Normal).unwrap();
    txn.record_dependency(&table(2), &table(1), DependencyKind::Normal).unwrap();
    txn.command_counter_increment();

    assert_eq!(txn.dependencies_of(&table(2)).unwrap().len(), 2);
    assert_eq!(txn.delete_dependencies_for(&table(2), false).unwrap(), 2);
}

#[test]
fn test_column_edges_and_whole_object_scans() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let mut txn = fixture.begin();
    let tab = 16400;
    let typ = ObjectAddress::new(CatalogId::TYPE, 16390);
    let coll = ObjectAddress::new(CatalogId::COLLATION, 16391);

    txn.record_dependency(&ObjectAddress::column(tab, 1), &typ, DependencyKind::Normal)
        .unwrap();
    txn.record_dependency(&ObjectAddress::column(tab, 2), &coll, DependencyKind::Normal)
        .unwrap();
    txn.command_counter_increment();

    assert_eq!(txn.dependencies_of(&table(tab)).unwrap().len(), 2);
    let col1 = txn.dependencies_of(&ObjectAddress::column(tab, 1)).unwrap();
    assert_eq!(col1.len(), 1);
    assert_eq!(col1[0].row.referenced, typ);

    let on_type = txn.collect_dependents(&typ).unwrap();
    assert!(on_type.contains(&ObjectAddress::column(tab, 1)));
    assert!(!on_type.contains(&table(tab)));
}

#[test]
fn test_delete_can_keep_extension_membership() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let mut txn = fixture.begin();
    let object = function(16600);
    txn.record_dependency(&object, &table(16400), DependencyKind::Normal).unwrap();
    txn.record_dependency(&object, &ObjectAddress::extension(16300), DependencyKind::Extension)
        .unwrap();
    txn.command_counter_increment();

    assert_eq!(txn.delete_dependencies_for(&object, true).unwrap(), 1);
    txn.command_counter_increment();
    assert_eq!(txn.extension_of(&object).unwrap(), Some(16300));
    assert_eq!(txn.dependencies_of(&object).unwrap().len(), 1);
}

#[test]
fn test_delete_by_kind_and_by_target() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let mut txn = fixture.begin();
    let object = function(16600);
    let schema_a = ObjectAddress::new(CatalogId::NAMESPACE, 2200);
    let schema_b = ObjectAddress::new(CatalogId::NAMESPACE, 16380);
    txn.record_dependency(&object, &schema_a, DependencyKind::Normal).unwrap();
    txn.record_dependency(&object, &schema_b, DependencyKind::Auto).unwrap();
    txn.record_dependency(&object, &table(16400), DependencyKind::Normal).unwrap();
    txn.command_counter_increment();

    let removed = txn
        .delete_dependencies_for_specific(&object, DependencyKind::Auto, &schema_b)
        .unwrap();
    assert_eq!(removed, 1);
    txn.command_counter_increment();

    let removed = txn
        .delete_dependencies_for_kind(&object, CatalogId::NAMESPACE, DependencyKind::Normal)
        .unwrap();
    assert_eq!(removed, 1);
    txn.command_counter_increment();

    let left = txn.dependencies_of(&object).unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].row.referenced, table(16400));
}

#[test]
fn test_change_referenced_is_idempotent() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let mut txn = fixture.begin();
    let object = function(16600);
    let old_schema = ObjectAddress::new(CatalogId::NAMESPACE, 16380);
    txn.record_dependency(&object, &old_schema, DependencyKind::Normal).unwrap();
    txn.command_counter_increment();

    let changed = txn
        .change_referenced(CatalogId::PROCEDURE, 16600, CatalogId::NAMESPACE, 16380, 16381)
        .unwrap();
    assert_eq!(changed, 1);
    txn.command_counter_increment();

    let changed = txn
        .change_referenced(CatalogId::PROCEDURE, 16600, CatalogId::NAMESPACE, 16380, 16381)
        .unwrap();
    assert_eq!(changed, 0);
    txn.command_counter_increment();

    let rows = txn.dependencies_of(&object).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].row.referenced.object_id, 16381);
}

#[test]
fn test_change_referenced_away_from_pinned_target() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let mut txn = fixture.begin();
    let public = ObjectAddress::new(CatalogId::NAMESPACE, 2200);
    txn.pin_object(&public).unwrap();
    txn.command_counter_increment();

    // No edge was ever stored for the pinned schema, yet the call reports one change
    let changed = txn
        .change_referenced(CatalogId::PROCEDURE, 16600, CatalogId::NAMESPACE, 2200, 16381)
        .unwrap();
    assert_eq!(changed, 1);
    txn.command_counter_increment();

    let rows = txn.dependencies_of(&function(16600)).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].row.referenced, ObjectAddress::new(CatalogId::NAMESPACE, 16381));
    assert_eq!(rows[0].row.kind, DependencyKind::Normal);
}

#[test]
fn test_change_referenced_onto_pinned_target_drops_edge() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let mut txn = fixture.begin();
    let public = ObjectAddress::new(CatalogId::NAMESPACE, 2200);
    txn.pin_object(&public).unwrap();
    txn.record_dependency(
        &function(16600),
        &ObjectAddress::new(CatalogId::NAMESPACE, 16380),
        DependencyKind::Normal,
    )
    .unwrap();
    txn.command_counter_increment();

    let changed = txn
        .change_referenced(CatalogId::PROCEDURE, 16600, CatalogId::NAMESPACE, 16380, 2200)
        .unwrap();
    assert_eq!(changed, 1);
    txn.command_counter_increment();
    assert!(txn.dependencies_of(&function(16600)).unwrap().is_empty());
}

#[test]
fn test_change_dependers_of_moves_all_edges() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let mut txn = fixture.begin();
    txn.record_dependency(&table(16500), &table(16400), DependencyKind::Normal).unwrap();
    txn.record_dependency(&ObjectAddress::column(16500, 1), &function(16600), DependencyKind::Normal)
        .unwrap();
    txn.command_counter_increment();

    assert_eq!(txn.change_dependers_of(CatalogId::RELATION, 16500, 16501).unwrap(), 2);
    txn.command_counter_increment();

    assert!(txn.dependencies_of(&table(16500)).unwrap().is_empty());
    let moved = txn.dependencies_of(&table(16501)).unwrap();
    assert_eq!(moved.len(), 2);
    assert!(moved.iter().any(|s| s.row.depender == ObjectAddress::column(16501, 1)));
}

#[test]
fn test_change_referenced_bulk() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let mut txn = fixture.begin();
    let old = ObjectAddress::new(CatalogId::TYPE, 16390);
    for depender in [table(16500), table(16501), function(16600)] {
        txn.record_dependency(&depender, &old, DependencyKind::Normal).unwrap();
    }
    txn.pin_object(&ObjectAddress::new(CatalogId::TYPE, 23)).unwrap();
    txn.command_counter_increment();

    assert_eq!(txn.change_referenced_bulk(CatalogId::TYPE, 16390, 16391).unwrap(), 3);
    txn.command_counter_increment();
    assert!(txn.dependents_of(&old).unwrap().is_empty());
    assert_eq!(
        txn.dependents_of(&ObjectAddress::new(CatalogId::TYPE, 16391)).unwrap().len(),
        3
    );

    let result = txn.change_referenced_bulk(CatalogId::TYPE, 23, 16391);
    match result {
        Err(DependError::SystemObject(what)) => assert_eq!(what, "type 23"),
        other => panic!("expected SystemObject, got {:?}", other),
    }
}

#[test]
fn test_sequence_ownership_lookups() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    fixture.catalog.set_relation_kind(16410, RelationKind::Sequence);
    fixture.catalog.set_relation_kind(16411, RelationKind::Sequence);
    fixture.catalog.set_relation_kind(16400, RelationKind::Table);

    let mut txn = fixture.begin();
    // serial column 1, identity column 2
    txn.record_dependency(&table(16410), &ObjectAddress::column(16400, 1), DependencyKind::Auto)
        .unwrap();
    txn.record_dependency(&table(16411), &ObjectAddress::column(16400, 2), DependencyKind::Internal)
        .unwrap();
    // a view reading column 1 is not an owned sequence
    txn.record_dependency(&table(16500), &ObjectAddress::column(16400, 1), DependencyKind::Normal)
        .unwrap();
    txn.command_counter_increment();

    assert_eq!(txn.sequence_owner(16410, DependencyKind::Auto).unwrap(), Some((16400, 1)));
    assert_eq!(txn.sequence_owner(16411, DependencyKind::Internal).unwrap(), Some((16400, 2)));
    assert_eq!(txn.sequence_owner(16411, DependencyKind::Auto).unwrap(), None);

    let mut all = txn.owned_sequences(16400, 0).unwrap();
    all.sort_unstable();
    assert_eq!(all, vec![16410, 16411]);
    assert_eq!(txn.owned_sequences(16400, 2).unwrap(), vec![16411]);
    assert!(txn.owned_sequences(16400, 3).unwrap().is_empty());
}

#[test]
fn test_constraint_and_index_lookups() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    fixture.catalog.set_relation_kind(16420, RelationKind::Index);
    let pkey = ObjectAddress::new(CatalogId::CONSTRAINT, 16430);
    let fkey = ObjectAddress::new(CatalogId::CONSTRAINT, 16431);

    let mut txn = fixture.begin();
    txn.record_dependency(&table(16420), &pkey, DependencyKind::Internal).unwrap();
    txn.record_dependency(&fkey, &table(16420), DependencyKind::Normal).unwrap();
    txn.command_counter_increment();

    assert_eq!(txn.constraint_index(16430).unwrap(), Some(16420));
    assert_eq!(txn.index_constraint(16420).unwrap(), Some(16430));
    assert_eq!(txn.index_ref_constraints(16420).unwrap(), vec![16431]);
    assert_eq!(txn.constraint_index(16431).unwrap(), None);
}

#[test]
fn test_cyclic_edges_are_stored_as_given() {
    let fixture = TestFixture::new().expect("Failed to create fixture");
    let mut txn = fixture.begin();
    let a = ObjectAddress::extension(16300);
    let b = ObjectAddress::extension(16301);
    txn.record_dependency(&a, &b, DependencyKind::Normal).unwrap();
    txn.record_dependency(&b, &a, DependencyKind::Normal).unwrap();
    txn.command_counter_increment();

    assert!(txn.collect_dependents(&a).unwrap().contains(&b));
    assert!(txn.collect_dependents(&b).unwrap().contains(&a));
}
