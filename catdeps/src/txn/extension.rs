// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Scoped "extension being created" context

use std::ops::{Deref, DerefMut};

use crate::address::Oid;
use crate::error::{DependError, DependResult};

use super::transaction::Transaction;

/// While alive, objects created through the wrapped transaction are recorded
/// as members of the extension. Dropping the guard clears the context, on
/// success and on error paths alike.
pub struct ExtensionScriptGuard<'a> {
    txn: &'a mut Transaction,
    extension_id: Oid,
}

impl<'a> ExtensionScriptGuard<'a> {
    pub fn extension_id(&self) -> Oid {
        self.extension_id
    }
}

impl Transaction {
    /// Mark the start of an extension script. Scripts cannot nest.
    pub fn enter_extension_script(
        &mut self,
        extension_id: Oid,
    ) -> DependResult<ExtensionScriptGuard<'_>> {
        self.ensure_active()?;
        if let Some(current) = self.creating_extension() {
            return Err(DependError::not_in_prerequisite_state(format!(
                "nested CREATE EXTENSION is not supported (extension {} is being created)",
                current
            )));
        }
        log::debug!("{} entering script of extension {}", self.id(), extension_id);
        self.set_extension_context(Some(extension_id));
        Ok(ExtensionScriptGuard {
            txn: self,
            extension_id,
        })
    }
}

impl Deref for ExtensionScriptGuard<'_> {
    type Target = Transaction;

    fn deref(&self) -> &Transaction {
        self.txn
    }
}

impl DerefMut for ExtensionScriptGuard<'_> {
    fn deref_mut(&mut self) -> &mut Transaction {
        self.txn
    }
}

impl Drop for ExtensionScriptGuard<'_> {
    fn drop(&mut self) {
        log::debug!(
            "{} leaving script of extension {}",
            self.txn.id(),
            self.extension_id
        );
        self.txn.set_extension_context(None);
    }
}
