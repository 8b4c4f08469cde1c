// Error types module
use thiserror::Error;

use crate::engine::EngineError;
use crate::types::TypeError;

/// Main error type for the JSON table engine
#[derive(Error, Debug)]
pub enum JsonTableError {
    #[error("Unsupported statement: {0}")]
    UnsupportedStatement(String),

    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    #[error("Table already exists: {0}")]
    DuplicateTable(String),

    #[error("Duplicate column '{column}' in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("Table not found: {0}")]
    UnknownTable(String),

    #[error("Unknown column '{column}' in table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Invalid default for column '{column}': {reason}")]
    InvalidDefault { column: String, reason: String },

    #[error("Type validation failed for column '{column}': {reason}")]
    TypeValidation { column: String, reason: String },

    #[error("Invalid SQL: {0}")]
    InvalidSql(String),

    #[error("A tenant id is required for {0} in admin mode")]
    TenantRequired(String),

    #[error("Underlying engine error: {0}")]
    Engine(#[from] EngineError),
}

impl JsonTableError {
    pub fn unknown_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        JsonTableError::UnknownColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn duplicate_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        JsonTableError::DuplicateColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn invalid_default(column: impl Into<String>, reason: impl ToString) -> Self {
        JsonTableError::InvalidDefault {
            column: column.into(),
            reason: reason.to_string(),
        }
    }

    /// Map a type failure raised while validating a DML value.
    pub fn from_value_error(column: &str, err: TypeError) -> Self {
        match err {
            TypeError::Unsupported(spec) => JsonTableError::UnsupportedType(spec),
            other => JsonTableError::TypeValidation {
                column: column.to_string(),
                reason: other.to_string(),
            },
        }
    }

    /// Map a type failure raised while validating a declared default.
    pub fn from_default_error(column: &str, err: TypeError) -> Self {
        match err {
            TypeError::Unsupported(spec) => JsonTableError::UnsupportedType(spec),
            other => JsonTableError::invalid_default(column, other),
        }
    }
}

impl From<jtable_sql::StatementClassificationError> for JsonTableError {
    fn from(err: jtable_sql::StatementClassificationError) -> Self {
        match err {
            jtable_sql::StatementClassificationError::Unsupported(kind) => {
                JsonTableError::UnsupportedStatement(kind)
            },
            invalid @ jtable_sql::StatementClassificationError::InvalidSql { .. } => {
                JsonTableError::InvalidSql(invalid.to_string())
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, JsonTableError>;
