//! # jtable-commons
//!
//! Shared types and constants for the JSON table engine.
//!
//! Every crate in the workspace addresses tenants, virtual tables and catalog
//! rows through the types defined here:
//! - `TenantId`: principal / row-owner identifier
//! - `TableName`: virtual table name (case preserved)
//! - `ColumnMeta` / `VirtualTable`: catalog models
//! - `SqlValue`: scalar exchanged with the underlying SQL engine
//!
//! ## Example Usage
//!
//! ```rust
//! use jtable_commons::models::{ColumnMeta, TableName, TenantId, VirtualTable};
//!
//! let tenant = TenantId::new(0);
//! let mut table = VirtualTable::new(TableName::new("t1"));
//! table.push_column(ColumnMeta::new(16, "c1", "INT"));
//!
//! assert_eq!(table.next_column_id(), 17);
//! assert_eq!(tenant.as_i64(), 0);
//! ```

pub mod constants;
pub mod models;

pub use constants::{
    DATA_TABLE_NAME, FIRST_USER_COLUMN_ID, META_TABLE_NAME, RESERVED_TABLE_NAMES,
};
pub use models::{ColumnMeta, SqlValue, TableName, TenantId, VirtualTable};
