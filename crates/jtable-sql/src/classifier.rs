//! Statement classification
//!
//! Dispatch is purely on the statement kind. Supported kinds are parsed once
//! and carried in [`SqlStatementKind`]; everything else is rejected.

pub mod engine;
pub mod types;

pub use types::{SqlStatement, SqlStatementKind, StatementClassificationError};
