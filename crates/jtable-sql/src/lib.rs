//! # jtable-sql
//!
//! SQL front end of the JSON table engine.
//!
//! - [`classifier`]: turns SQL text into a [`SqlStatement`] and rejects every
//!   statement kind the engine cannot serve
//! - [`ddl`]: CREATE TABLE extraction and the ALTER TABLE statement model
//! - [`parser`]: shared sqlparser helpers and the ALTER TABLE grammar
//!   extension (ADD / DROP / MODIFY / CHANGE / RENAME)
//!
//! # Example
//!
//! ```
//! use jtable_sql::{SqlStatement, SqlStatementKind};
//!
//! let stmt = SqlStatement::classify("ALTER TABLE t1 MODIFY COLUMN c1 VARCHAR(64) NOT NULL").unwrap();
//! assert!(matches!(stmt.kind(), SqlStatementKind::AlterTable(_)));
//! ```

pub mod classifier;
pub mod ddl;
pub mod parser;

pub use classifier::{SqlStatement, SqlStatementKind, StatementClassificationError};
pub use ddl::{AlterOperation, AlterTableStatement, ColumnDefinition, CreateTableStatement, DdlResult};
