// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Index key encoding for the dependency relations
//!
//! Each dependency row is stored twice in the `depend` tree: once under its
//! forward (depender) key and once under its backward (referenced) key. All
//! integers are big-endian so that equality on a key prefix is a contiguous
//! range, and every key ends with the row id so duplicate edges stay distinct.

/// Name of the tree holding both dependency relations
pub const DEPEND_TREE: &str = "depend";

/// Which index a key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IndexId {
    /// `[db][classid][objid][objsubid][rowid]`
    LocalForward = 0x11,
    /// `[db][refclassid][refobjid][refobjsubid][rowid]`
    LocalBackward = 0x12,
    /// `[dbid][classid][objid][rowid]`
    SharedForward = 0x21,
    /// `[refclassid][refobjid][rowid]`
    SharedBackward = 0x22,
}

impl IndexId {
    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// Incremental builder for index keys and key prefixes
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    buf: Vec<u8>,
}

impl KeyBuilder {
    pub fn new(index: IndexId) -> Self {
        let mut buf = Vec::with_capacity(32);
        buf.push(index.tag());
        Self { buf }
    }

    pub fn oid(mut self, value: u32) -> Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Sub-ids are signed; flipping the sign bit keeps byte order equal to
    /// numeric order.
    pub fn sub_id(mut self, value: i32) -> Self {
        let flipped = (value as u32) ^ 0x8000_0000;
        self.buf.extend_from_slice(&flipped.to_be_bytes());
        self
    }

    pub fn row_id(mut self, value: u64) -> Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Row id carried in the last eight bytes of a full index key
pub fn row_id_of(key: &[u8]) -> Option<u64> {
    if key.len() < 9 {
        return None;
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&key[key.len() - 8..]);
    Some(u64::from_be_bytes(bytes))
}
