// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Ownership and extension-membership helpers for object constructors

use crate::address::{CatalogId, ObjectAddress, Oid};
use crate::error::{DependError, DependResult};
use crate::txn::Transaction;

use super::DependencyKind;

impl Transaction {
    fn extension_label(&self, extension_id: Oid) -> String {
        let extension = ObjectAddress::extension(extension_id);
        self.catalog()
            .object_name(&extension)
            .unwrap_or_else(|| extension_id.to_string())
    }

    fn require_whole_object(object: &ObjectAddress) -> DependResult<()> {
        if object.is_whole_object() {
            Ok(())
        } else {
            Err(DependError::IntegrityViolation(format!(
                "only whole objects can be extension members, not {}",
                object
            )))
        }
    }

    /// Record `object` as a member of the extension whose script is running,
    /// if any.
    ///
    /// With `is_replace` the object already existed (CREATE OR REPLACE): it
    /// must then already belong to that same extension, and nothing is
    /// written.
    pub fn record_extension_membership(
        &mut self,
        object: &ObjectAddress,
        is_replace: bool,
    ) -> DependResult<()> {
        Self::require_whole_object(object)?;
        let Some(current) = self.creating_extension() else {
            return Ok(());
        };

        if is_replace {
            match self.extension_of(object)? {
                Some(existing) if existing == current => return Ok(()),
                Some(existing) => {
                    return Err(DependError::not_in_prerequisite_state(format!(
                        "{} is already a member of extension \"{}\"",
                        self.describe_or_address(object),
                        self.extension_label(existing)
                    )));
                }
                None => {
                    return Err(DependError::NotInPrerequisiteState {
                        message: format!(
                            "{} is not a member of extension \"{}\"",
                            self.describe_or_address(object),
                            self.extension_label(current)
                        ),
                        detail: Some(
                            "An extension is not allowed to replace an object that it does not own."
                                .to_string(),
                        ),
                    });
                }
            }
        }

        self.record_dependency(
            object,
            &ObjectAddress::extension(current),
            DependencyKind::Extension,
        )
    }

    /// CREATE ... IF NOT EXISTS inside an extension script may only skip an
    /// object the extension already owns.
    pub fn check_membership_in_current_extension(
        &mut self,
        object: &ObjectAddress,
    ) -> DependResult<()> {
        let Some(current) = self.creating_extension() else {
            return Ok(());
        };
        if self.extension_of(object)? != Some(current) {
            return Err(DependError::NotInPrerequisiteState {
                message: format!(
                    "{} is not a member of extension \"{}\"",
                    self.describe_or_address(object),
                    self.extension_label(current)
                ),
                detail: Some(
                    "An extension may only use CREATE ... IF NOT EXISTS to skip object creation if the conflicting object is one that it already owns."
                        .to_string(),
                ),
            });
        }
        Ok(())
    }

    /// ALTER EXTENSION ADD: attach a free-standing object to an extension
    pub fn add_extension_member(
        &mut self,
        extension_id: Oid,
        object: &ObjectAddress,
    ) -> DependResult<()> {
        Self::require_whole_object(object)?;
        if let Some(existing) = self.extension_of(object)? {
            return Err(DependError::not_in_prerequisite_state(format!(
                "{} is already a member of extension \"{}\"",
                self.describe_or_address(object),
                self.extension_label(existing)
            )));
        }
        self.record_dependency(
            object,
            &ObjectAddress::extension(extension_id),
            DependencyKind::Extension,
        )
    }

    /// ALTER EXTENSION DROP: detach a member object from its extension
    pub fn drop_extension_member(
        &mut self,
        extension_id: Oid,
        object: &ObjectAddress,
    ) -> DependResult<()> {
        Self::require_whole_object(object)?;
        if self.extension_of(object)? != Some(extension_id) {
            return Err(DependError::not_in_prerequisite_state(format!(
                "{} is not a member of extension \"{}\"",
                self.describe_or_address(object),
                self.extension_label(extension_id)
            )));
        }
        let removed =
            self.delete_dependencies_for_kind(object, CatalogId::EXTENSION, DependencyKind::Extension)?;
        if removed != 1 {
            return Err(DependError::Internal(
                "unexpected number of extension dependency records".to_string(),
            ));
        }
        Ok(())
    }
}
