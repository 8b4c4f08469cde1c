//! A named, ordered collection of catalog columns.

use serde::{Deserialize, Serialize};

use super::{ColumnMeta, TableName};
use crate::constants::FIRST_USER_COLUMN_ID;

/// Snapshot of one virtual table's catalog entries, ordered by column id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualTable {
    name: TableName,
    columns: Vec<ColumnMeta>,
}

impl VirtualTable {
    pub fn new(name: TableName) -> Self {
        Self {
            name,
            columns: Vec::new(),
        }
    }

    pub fn with_columns(name: TableName, mut columns: Vec<ColumnMeta>) -> Self {
        columns.sort_by_key(|c| c.column_id);
        Self { name, columns }
    }

    pub fn name(&self) -> &TableName {
        &self.name
    }

    pub fn set_name(&mut self, name: TableName) {
        self.name = name;
    }

    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMeta> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut ColumnMeta> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Appends a column, keeping id order.
    pub fn push_column(&mut self, column: ColumnMeta) {
        self.columns.push(column);
        self.columns.sort_by_key(|c| c.column_id);
    }

    pub fn remove_column(&mut self, name: &str) -> Option<ColumnMeta> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx))
    }

    pub fn max_column_id(&self) -> Option<i64> {
        self.columns.iter().map(|c| c.column_id).max()
    }

    /// Id for the next added column: `max + 1`.
    pub fn next_column_id(&self) -> i64 {
        self.max_column_id().map_or(FIRST_USER_COLUMN_ID, |max| max + 1)
    }
}
