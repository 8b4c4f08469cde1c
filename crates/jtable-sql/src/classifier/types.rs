use sqlparser::ast::{Delete, Insert, Query, Update};

use crate::ddl::{AlterTableStatement, CreateTableStatement};

/// Errors produced while classifying a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementClassificationError {
    /// The statement kind is outside the supported set.
    Unsupported(String),
    /// SQL parsing failed; message contains the parser error.
    InvalidSql { sql: String, message: String },
}

impl std::fmt::Display for StatementClassificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatementClassificationError::Unsupported(kind) => {
                write!(f, "Unsupported statement: {}", kind)
            },
            StatementClassificationError::InvalidSql { sql, message } => {
                write!(f, "Invalid SQL '{}': {}", sql, message)
            },
        }
    }
}

impl std::error::Error for StatementClassificationError {}

/// A classified statement together with the SQL text it came from.
#[derive(Debug, Clone)]
pub struct SqlStatement {
    pub(crate) sql_text: String,
    pub(crate) kind: SqlStatementKind,
}

/// Statement kinds served by the engine.
///
/// DDL variants hold the extracted statement; DML/DQL variants hold the
/// sqlparser AST so the rewriter never parses twice.
#[derive(Debug, Clone)]
pub enum SqlStatementKind {
    /// CREATE TABLE <name> (<columns>)
    CreateTable(CreateTableStatement),
    /// ALTER TABLE <name> <action>[, <action>...]
    AlterTable(AlterTableStatement),
    /// INSERT INTO <name> [(cols)] VALUES (...), ...
    Insert(Box<Insert>),
    /// UPDATE <name> SET ... [WHERE ...]
    Update(Box<Update>),
    /// DELETE FROM <name> [WHERE ...]
    Delete(Box<Delete>),
    /// SELECT ... FROM <name> ...
    Select(Box<Query>),
}

impl SqlStatement {
    pub fn new(sql_text: impl Into<String>, kind: SqlStatementKind) -> Self {
        Self {
            sql_text: sql_text.into(),
            kind,
        }
    }

    pub fn sql_text(&self) -> &str {
        &self.sql_text
    }

    pub fn kind(&self) -> &SqlStatementKind {
        &self.kind
    }

    pub fn into_kind(self) -> SqlStatementKind {
        self.kind
    }

    /// True for CREATE/ALTER.
    pub fn is_ddl(&self) -> bool {
        matches!(
            self.kind,
            SqlStatementKind::CreateTable(_) | SqlStatementKind::AlterTable(_)
        )
    }

    /// Name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self.kind {
            SqlStatementKind::CreateTable(_) => "CREATE TABLE",
            SqlStatementKind::AlterTable(_) => "ALTER TABLE",
            SqlStatementKind::Insert(_) => "INSERT",
            SqlStatementKind::Update(_) => "UPDATE",
            SqlStatementKind::Delete(_) => "DELETE",
            SqlStatementKind::Select(_) => "SELECT",
        }
    }
}
