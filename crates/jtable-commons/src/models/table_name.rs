//! Type-safe wrapper for virtual table names.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::is_reserved_table_name;

/// Name of a virtual table.
///
/// Unlike column types, table names keep the case they were declared with:
/// `t1` and `T1` are two different virtual tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableName(String);

impl TableName {
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_string(self) -> String {
        self.0
    }

    /// True when the name collides with one of the physical tables.
    pub fn is_reserved(&self) -> bool {
        is_reserved_table_name(&self.0)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TableName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TableName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
