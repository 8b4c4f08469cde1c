//! Default-Value Evaluator
//!
//! Default expressions are arbitrary scalar SQL; the engine computes them with
//! `SELECT <expr>` and the column type validates the result.

use std::collections::HashMap;

use jtable_commons::{ColumnMeta, SqlValue};

use crate::engine::ScopedTransaction;
use crate::error::{JsonTableError, Result};
use crate::types::{CanonicalValue, TypeDescriptor};

/// Run `SELECT <expr>` and return the single scalar it yields.
pub fn evaluate_scalar(txn: &mut ScopedTransaction<'_>, expr: &str) -> Result<SqlValue> {
    let rows = txn.query(&format!("SELECT {}", expr), &[])?;
    Ok(rows.scalar().cloned().unwrap_or(SqlValue::Null))
}

/// Evaluate one default expression under `ty`.
///
/// `None` stands for `DEFAULT NULL` and makes no round trip. Engine and
/// validation failures both surface as `InvalidDefault`.
pub fn evaluate(
    txn: &mut ScopedTransaction<'_>,
    column: &str,
    default_expr: Option<&str>,
    ty: &TypeDescriptor,
) -> Result<CanonicalValue> {
    let Some(expr) = default_expr else {
        return Ok(CanonicalValue::Null);
    };

    let raw = evaluate_scalar(txn, expr).map_err(|e| match e {
        JsonTableError::Engine(err) => JsonTableError::invalid_default(column, err),
        other => other,
    })?;
    let value = ty
        .validate(&raw)
        .map_err(|e| JsonTableError::from_default_error(column, e))?;
    log::debug!("Default of '{}' ({}) evaluated to {:?}", column, expr, value);
    Ok(value)
}

/// Evaluates each column's default at most once per statement.
#[derive(Debug, Default)]
pub struct DefaultCache {
    values: HashMap<i64, CanonicalValue>,
}

impl DefaultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value stored for `column` when an INSERT leaves it out.
    pub fn value_for(
        &mut self,
        txn: &mut ScopedTransaction<'_>,
        column: &ColumnMeta,
        ty: &TypeDescriptor,
    ) -> Result<CanonicalValue> {
        if let Some(value) = self.values.get(&column.column_id) {
            return Ok(value.clone());
        }

        let value = if column.has_default {
            evaluate(txn, &column.name, column.default_expr.as_deref(), ty)?
        } else {
            CanonicalValue::Null
        };
        if value.is_null() && !column.nullable {
            return Err(JsonTableError::invalid_default(
                &column.name,
                "NOT NULL column has no value and no default",
            ));
        }

        self.values.insert(column.column_id, value.clone());
        Ok(value)
    }
}
