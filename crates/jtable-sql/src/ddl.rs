//! DDL statement definitions.
//!
//! CREATE TABLE is extracted from sqlparser's AST; ALTER TABLE goes through the
//! grammar extension in `parser::extensions`.

pub mod alter_table;
pub mod column_def;
pub mod create_table;

/// Result type used by the DDL parsers.
/// Returns String errors so callers can map them into their own taxonomy.
pub type DdlResult<T> = Result<T, String>;

pub use alter_table::{AlterOperation, AlterTableStatement};
pub use column_def::ColumnDefinition;
pub use create_table::CreateTableStatement;
