//! Underlying SQL engine seam.
//!
//! The engine is an external collaborator: it runs SQL text with positional
//! `?` parameters inside a transaction and returns rows or an affected-row
//! count. [`SqliteEngine`] is the bundled adapter; any MySQL-compatible
//! backend plugs in by implementing [`SqlEngine`].

mod dialect;
mod sqlite;

pub use dialect::PhysicalDialect;
pub use sqlite::SqliteEngine;

use jtable_commons::SqlValue;
use thiserror::Error;

/// Errors reported by the underlying engine, passed through unmodified.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Transaction already finished")]
    TransactionClosed,
}

/// Rows returned by a query, in projection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl RowSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Vec<SqlValue>> {
        self.rows.iter()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// First cell of the first row, used for scalar `SELECT <expr>` evaluation.
    pub fn scalar(&self) -> Option<&SqlValue> {
        self.rows.first().and_then(|row| row.first())
    }
}

impl IntoIterator for RowSet {
    type Item = Vec<SqlValue>;
    type IntoIter = std::vec::IntoIter<Vec<SqlValue>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// Connection factory for the underlying engine.
pub trait SqlEngine: Send + Sync {
    /// SQL flavour used to render physical statements.
    fn dialect(&self) -> PhysicalDialect;

    /// Open a transaction. Dropping it without commit must roll back.
    fn begin(&self) -> Result<Box<dyn EngineTransaction + '_>, EngineError>;
}

/// An open transaction on the underlying engine.
pub trait EngineTransaction {
    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<RowSet, EngineError>;

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, EngineError>;

    fn commit(self: Box<Self>) -> Result<(), EngineError>;

    fn rollback(self: Box<Self>) -> Result<(), EngineError>;
}

/// One logical operation's transaction.
///
/// Rolls back on every exit path that does not reach [`commit`](Self::commit).
pub struct ScopedTransaction<'e> {
    inner: Option<Box<dyn EngineTransaction + 'e>>,
    label: &'static str,
}

impl<'e> ScopedTransaction<'e> {
    pub fn begin(engine: &'e dyn SqlEngine, label: &'static str) -> Result<Self, EngineError> {
        let inner = engine.begin()?;
        log::debug!("[{}] transaction opened", label);
        Ok(Self {
            inner: Some(inner),
            label,
        })
    }

    pub fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<RowSet, EngineError> {
        log::debug!("[{}] query: {} params={:?}", self.label, sql, params);
        self.inner
            .as_mut()
            .ok_or(EngineError::TransactionClosed)?
            .query(sql, params)
    }

    pub fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, EngineError> {
        log::debug!("[{}] execute: {} params={:?}", self.label, sql, params);
        self.inner
            .as_mut()
            .ok_or(EngineError::TransactionClosed)?
            .execute(sql, params)
    }

    pub fn commit(mut self) -> Result<(), EngineError> {
        let inner = self.inner.take().ok_or(EngineError::TransactionClosed)?;
        inner.commit()?;
        log::debug!("[{}] transaction committed", self.label);
        Ok(())
    }
}

impl Drop for ScopedTransaction<'_> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            log::warn!("[{}] rolling back transaction", self.label);
            if let Err(e) = inner.rollback() {
                log::warn!("[{}] rollback failed: {}", self.label, e);
            }
        }
    }
}
