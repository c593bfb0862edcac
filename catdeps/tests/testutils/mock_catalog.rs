//! Mock catalog collaborator
//!
//! Implements all three collaborator traits. Objects exist unless marked
//! dropped. Mutating callbacks behave like the real catalog code would: they
//! keep the shared store in sync through the transaction they are given.

#![allow(dead_code)]

use catdeps::{
    CascadeEngine, CatalogId, CatalogMutator, DependResult, DropBehavior, ObjectAddress,
    ObjectAddresses, ObjectCatalog, Oid, RelationKind, SharedDependencyKind, Transaction,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// One collaborator call, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    RevokeAll {
        object: ObjectAddress,
        role: Oid,
    },
    RemoveRoleFromPolicy {
        policy: Oid,
        role: Oid,
    },
    AlterOwner {
        handler: &'static str,
        object: ObjectAddress,
        new_owner: Oid,
    },
    RewriteOwnerColumn {
        object: ObjectAddress,
        new_owner: Oid,
    },
    PerformDeletions {
        objects: Vec<ObjectAddress>,
        behavior: DropBehavior,
    },
}

#[derive(Default)]
struct MockState {
    dropped: HashSet<ObjectAddress>,
    names: HashMap<ObjectAddress, String>,
    relation_kinds: HashMap<Oid, RelationKind>,
    policy_roles: HashMap<Oid, Vec<Oid>>,
    calls: Vec<Call>,
}

#[derive(Default)]
pub struct MockCatalog {
    state: Mutex<MockState>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_dropped(&self, object: ObjectAddress) {
        self.state.lock().dropped.insert(object.whole_object());
    }

    pub fn set_name(&self, object: ObjectAddress, name: &str) {
        self.state.lock().names.insert(object, name.to_string());
    }

    pub fn set_relation_kind(&self, relation_id: Oid, kind: RelationKind) {
        self.state.lock().relation_kinds.insert(relation_id, kind);
    }

    pub fn set_policy_roles(&self, policy_id: Oid, roles: Vec<Oid>) {
        self.state.lock().policy_roles.insert(policy_id, roles);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    fn push(&self, call: Call) {
        self.state.lock().calls.push(call);
    }

    fn alter_owner(
        &self,
        txn: &mut Transaction,
        handler: &'static str,
        object: ObjectAddress,
        new_owner: Oid,
    ) -> DependResult<()> {
        self.push(Call::AlterOwner {
            handler,
            object,
            new_owner,
        });
        txn.change_owner_dependency(&object, new_owner)
    }
}

impl ObjectCatalog for MockCatalog {
    fn object_exists(&self, object: &ObjectAddress) -> bool {
        !self.state.lock().dropped.contains(&object.whole_object())
    }

    fn describe_object(&self, object: &ObjectAddress) -> Option<String> {
        let state = self.state.lock();
        if state.dropped.contains(&object.whole_object()) {
            return None;
        }
        match state.names.get(object) {
            Some(name) => Some(format!("{} {}", object.catalog.kind_name(), name)),
            None => Some(object.to_string()),
        }
    }

    fn object_name(&self, object: &ObjectAddress) -> Option<String> {
        self.state.lock().names.get(object).cloned()
    }

    fn relation_kind(&self, relation_id: Oid) -> Option<RelationKind> {
        self.state.lock().relation_kinds.get(&relation_id).copied()
    }
}

impl CatalogMutator for MockCatalog {
    fn revoke_all(
        &self,
        txn: &mut Transaction,
        object: &ObjectAddress,
        role: Oid,
    ) -> DependResult<()> {
        self.push(Call::RevokeAll {
            object: *object,
            role,
        });
        txn.update_acl_dependencies(object, 0, &[role], &[])?;
        Ok(())
    }

    fn remove_role_from_policy(
        &self,
        txn: &mut Transaction,
        policy_id: Oid,
        role: Oid,
    ) -> DependResult<bool> {
        self.push(Call::RemoveRoleFromPolicy {
            policy: policy_id,
            role,
        });
        let remaining: Vec<Oid> = {
            let state = self.state.lock();
            state
                .policy_roles
                .get(&policy_id)
                .map(|roles| roles.iter().copied().filter(|r| *r != role).collect())
                .unwrap_or_default()
        };
        if remaining.is_empty() {
            return Ok(false);
        }

        let policy = ObjectAddress::new(CatalogId::POLICY, policy_id);
        txn.delete_shared_dependencies_for(&policy)?;
        for r in &remaining {
            txn.record_shared_dependency(&policy, &ObjectAddress::role(*r), SharedDependencyKind::Policy)?;
        }
        self.state.lock().policy_roles.insert(policy_id, remaining);
        Ok(true)
    }

    fn alter_type_owner(&self, txn: &mut Transaction, type_id: Oid, new_owner: Oid) -> DependResult<()> {
        self.alter_owner(txn, "type", ObjectAddress::new(CatalogId::TYPE, type_id), new_owner)
    }

    fn alter_schema_owner(
        &self,
        txn: &mut Transaction,
        namespace_id: Oid,
        new_owner: Oid,
    ) -> DependResult<()> {
        self.alter_owner(
            txn,
            "schema",
            ObjectAddress::new(CatalogId::NAMESPACE, namespace_id),
            new_owner,
        )
    }

    fn alter_relation_owner(
        &self,
        txn: &mut Transaction,
        relation_id: Oid,
        new_owner: Oid,
        recursing: bool,
    ) -> DependResult<()> {
        assert!(recursing, "reassign-owned must alter relations as recursing");
        self.alter_owner(txn, "relation", ObjectAddress::relation(relation_id), new_owner)
    }

    fn alter_foreign_server_owner(
        &self,
        txn: &mut Transaction,
        server_id: Oid,
        new_owner: Oid,
    ) -> DependResult<()> {
        self.alter_owner(
            txn,
            "foreign server",
            ObjectAddress::new(CatalogId::FOREIGN_SERVER, server_id),
            new_owner,
        )
    }

    fn alter_foreign_data_wrapper_owner(
        &self,
        txn: &mut Transaction,
        fdw_id: Oid,
        new_owner: Oid,
    ) -> DependResult<()> {
        self.alter_owner(
            txn,
            "foreign-data wrapper",
            ObjectAddress::new(CatalogId::FOREIGN_DATA_WRAPPER, fdw_id),
            new_owner,
        )
    }

    fn alter_event_trigger_owner(
        &self,
        txn: &mut Transaction,
        trigger_id: Oid,
        new_owner: Oid,
    ) -> DependResult<()> {
        self.alter_owner(
            txn,
            "event trigger",
            ObjectAddress::new(CatalogId::EVENT_TRIGGER, trigger_id),
            new_owner,
        )
    }

    fn alter_publication_owner(
        &self,
        txn: &mut Transaction,
        publication_id: Oid,
        new_owner: Oid,
    ) -> DependResult<()> {
        self.alter_owner(
            txn,
            "publication",
            ObjectAddress::new(CatalogId::PUBLICATION, publication_id),
            new_owner,
        )
    }

    fn alter_subscription_owner(
        &self,
        txn: &mut Transaction,
        subscription_id: Oid,
        new_owner: Oid,
    ) -> DependResult<()> {
        self.alter_owner(
            txn,
            "subscription",
            ObjectAddress::new(CatalogId::SUBSCRIPTION, subscription_id),
            new_owner,
        )
    }

    fn rewrite_owner_column(
        &self,
        _txn: &mut Transaction,
        object: &ObjectAddress,
        new_owner: Oid,
    ) -> DependResult<()> {
        self.push(Call::RewriteOwnerColumn {
            object: *object,
            new_owner,
        });
        Ok(())
    }
}

impl CascadeEngine for MockCatalog {
    fn perform_deletions(
        &self,
        txn: &mut Transaction,
        objects: &ObjectAddresses,
        behavior: DropBehavior,
    ) -> DependResult<()> {
        self.push(Call::PerformDeletions {
            objects: objects.as_slice().to_vec(),
            behavior,
        });
        for object in objects {
            txn.delete_dependencies_for(object, false)?;
            txn.delete_shared_dependencies_for(object)?;
            self.mark_dropped(*object);
        }
        Ok(())
    }
}
