//! In-memory snapshot of one principal's catalog.
//!
//! A plain read replica with no locking: it is replaced wholesale after a
//! successful DDL or an explicit refresh, and never patched after a failure.

use std::collections::HashMap;

use jtable_commons::{TableName, VirtualTable};

use crate::error::{JsonTableError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaCache {
    tables: HashMap<TableName, VirtualTable>,
}

impl MetaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tables(tables: impl IntoIterator<Item = VirtualTable>) -> Self {
        Self {
            tables: tables.into_iter().map(|t| (t.name().clone(), t)).collect(),
        }
    }

    pub fn get(&self, name: &TableName) -> Option<&VirtualTable> {
        self.tables.get(name)
    }

    /// Lookup failing with `UnknownTable`.
    pub fn require(&self, name: &TableName) -> Result<&VirtualTable> {
        self.get(name)
            .ok_or_else(|| JsonTableError::UnknownTable(name.to_string()))
    }

    pub fn contains(&self, name: &TableName) -> bool {
        self.tables.contains_key(name)
    }

    /// Table names in sorted order.
    pub fn table_names(&self) -> Vec<&TableName> {
        let mut names: Vec<&TableName> = self.tables.keys().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
