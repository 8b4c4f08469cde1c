use jtable_commons::constants::data_columns;
use jtable_commons::{ColumnMeta, SqlValue, TenantId, VirtualTable, DATA_TABLE_NAME};
use serde_json::{Map, Value};
use sqlparser::ast::{Expr, Insert, SetExpr, TableObject};

use super::{check_not_null, column_type, literal_value, reject_placeholder, Rewriter};
use crate::defaults::{evaluate_scalar, DefaultCache};
use crate::engine::ScopedTransaction;
use crate::error::{JsonTableError, Result};
use crate::types::CanonicalValue;

/// One cell of an INSERT row, in catalog column order.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingValue {
    /// Literal already validated against the column type
    Ready(CanonicalValue),
    /// Expression the engine computes with `SELECT <expr>`
    Compute(String),
    /// Column left out of the statement
    Default,
}

/// A validated INSERT waiting for its defaults and computed values.
#[derive(Debug, Clone)]
pub struct InsertPlan<'a> {
    table: &'a VirtualTable,
    owner: TenantId,
    tenant: TenantId,
    rows: Vec<Vec<PendingValue>>,
}

impl<'a> Rewriter<'a> {
    /// Resolve and validate an INSERT without touching the engine.
    pub fn insert(&self, insert: &Insert) -> Result<InsertPlan<'a>> {
        if insert.on.is_some() {
            return Err(JsonTableError::UnsupportedStatement(
                "INSERT ... ON DUPLICATE KEY".to_string(),
            ));
        }
        let table = match &insert.table {
            TableObject::TableName(name) => self.table(name)?,
            other => {
                return Err(JsonTableError::UnsupportedStatement(format!(
                    "INSERT into {}",
                    other
                )))
            },
        };

        let positions = resolve_columns(table, insert)?;
        for column in table.columns() {
            let listed = positions.iter().any(|&idx| table.columns()[idx].name == column.name);
            if !listed && !column.may_be_omitted() {
                return Err(JsonTableError::invalid_default(
                    &column.name,
                    "NOT NULL column without default must be supplied",
                ));
            }
        }

        let source = insert
            .source
            .as_ref()
            .ok_or_else(|| JsonTableError::InvalidSql("INSERT without VALUES".to_string()))?;
        let SetExpr::Values(values) = source.body.as_ref() else {
            return Err(JsonTableError::UnsupportedStatement(
                "INSERT ... SELECT into virtual tables".to_string(),
            ));
        };

        let mut rows = Vec::with_capacity(values.rows.len());
        for tuple in &values.rows {
            if tuple.len() != positions.len() {
                return Err(JsonTableError::InvalidSql(format!(
                    "INSERT into '{}' has {} column(s) but {} value(s)",
                    table.name(),
                    positions.len(),
                    tuple.len()
                )));
            }

            let mut row = vec![PendingValue::Default; table.columns().len()];
            for (&idx, expr) in positions.iter().zip(tuple) {
                row[idx] = pending_value(&table.columns()[idx], expr)?;
            }
            rows.push(row);
        }

        let tenant = self.scope.write_tenant(self.tenant, "INSERT")?;
        Ok(InsertPlan {
            table,
            owner: self.scope.principal(),
            tenant,
            rows,
        })
    }
}

impl InsertPlan<'_> {
    pub fn table(&self) -> &VirtualTable {
        self.table
    }

    /// Principal stamped as `owner_id` on every row.
    pub fn owner(&self) -> TenantId {
        self.owner
    }

    pub fn tenant(&self) -> TenantId {
        self.tenant
    }

    pub fn rows(&self) -> &[Vec<PendingValue>] {
        &self.rows
    }

    /// Materialize every row and write it, returning the inserted count.
    ///
    /// Defaults are evaluated once and shared by all rows of the statement.
    pub fn execute(&self, txn: &mut ScopedTransaction<'_>) -> Result<u64> {
        let sql = format!(
            "INSERT INTO {} ({}, {}, {}, {}) VALUES (?, ?, ?, ?)",
            DATA_TABLE_NAME,
            data_columns::OWNER_ID,
            data_columns::USER_ID,
            data_columns::TABLE_NAME,
            data_columns::PAYLOAD
        );

        let mut defaults = DefaultCache::new();
        let mut inserted = 0;
        for row in &self.rows {
            let mut payload = Map::new();
            for (column, pending) in self.table.columns().iter().zip(row) {
                let ty = column_type(column)?;
                let value = match pending {
                    PendingValue::Ready(value) => value.clone(),
                    PendingValue::Default => defaults.value_for(txn, column, &ty)?,
                    PendingValue::Compute(expr) => {
                        let raw = evaluate_scalar(txn, expr)?;
                        let value = ty
                            .validate(&raw)
                            .map_err(|e| JsonTableError::from_value_error(&column.name, e))?;
                        check_not_null(column, &value)?;
                        value
                    },
                };
                payload.insert(column.name.clone(), value.to_json());
            }

            inserted += txn.execute(
                &sql,
                &[
                    SqlValue::Int(self.owner.as_i64()),
                    SqlValue::Int(self.tenant.as_i64()),
                    SqlValue::Text(self.table.name().as_str().to_string()),
                    SqlValue::Text(Value::Object(payload).to_string()),
                ],
            )?;
        }

        log::debug!(
            "Inserted {} row(s) into '{}' for tenant {}",
            inserted,
            self.table.name(),
            self.tenant
        );
        Ok(inserted)
    }
}

/// Catalog positions of the INSERT column list; all columns when omitted.
fn resolve_columns(table: &VirtualTable, insert: &Insert) -> Result<Vec<usize>> {
    if insert.columns.is_empty() {
        return Ok((0..table.columns().len()).collect());
    }

    let mut positions = Vec::with_capacity(insert.columns.len());
    for ident in &insert.columns {
        let idx = table
            .columns()
            .iter()
            .position(|c| c.name == ident.value)
            .ok_or_else(|| JsonTableError::unknown_column(table.name().as_str(), &ident.value))?;
        if positions.contains(&idx) {
            return Err(JsonTableError::duplicate_column(table.name().as_str(), &ident.value));
        }
        positions.push(idx);
    }
    Ok(positions)
}

fn pending_value(column: &ColumnMeta, expr: &Expr) -> Result<PendingValue> {
    reject_placeholder(expr)?;
    match literal_value(expr) {
        Some(raw) => {
            let value = column_type(column)?
                .validate(&raw)
                .map_err(|e| JsonTableError::from_value_error(&column.name, e))?;
            check_not_null(column, &value)?;
            Ok(PendingValue::Ready(value))
        },
        None => Ok(PendingValue::Compute(expr.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessScope;
    use crate::engine::PhysicalDialect;
    use crate::rewrite::test_support::sample_cache;
    use jtable_sql::{SqlStatement, SqlStatementKind};

    fn plan(sql: &str) -> Result<Vec<Vec<PendingValue>>> {
        let cache = sample_cache();
        let rewriter = Rewriter::new(&cache, PhysicalDialect::Sqlite, AccessScope::tenant(TenantId::new(1)));
        match SqlStatement::classify(sql).unwrap().into_kind() {
            SqlStatementKind::Insert(insert) => rewriter.insert(&insert).map(|p| p.rows().to_vec()),
            other => panic!("Expected INSERT, got {:?}", other),
        }
    }

    #[test]
    fn test_omitted_columns_use_defaults() {
        let rows = plan("INSERT INTO t1 (c2, c3) VALUES ('hello', 'foo'), ('a', 'b')").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            vec![
                PendingValue::Default,
                PendingValue::Ready(CanonicalValue::Varchar("hello".to_string())),
                PendingValue::Ready(CanonicalValue::Varchar("foo".to_string())),
            ]
        );
    }

    #[test]
    fn test_rows_are_stamped_with_principal_and_tenant() {
        let cache = sample_cache();
        let scope = AccessScope::new(TenantId::new(2), TenantId::new(9));
        let rewriter = Rewriter::new(&cache, PhysicalDialect::Sqlite, scope);
        let insert = match SqlStatement::classify("INSERT INTO t1 (c3) VALUES ('x')").unwrap().into_kind() {
            SqlStatementKind::Insert(insert) => insert,
            other => panic!("Expected INSERT, got {:?}", other),
        };

        let plan = rewriter.insert(&insert).unwrap();
        assert_eq!(plan.owner(), TenantId::new(2));
        assert_eq!(plan.tenant(), TenantId::new(9));
    }

    #[test]
    fn test_implicit_column_list_and_expressions() {
        let rows = plan("INSERT INTO t1 VALUES (10 + 10, NULL, 'x')").unwrap();
        assert_eq!(rows[0][0], PendingValue::Compute("10 + 10".to_string()));
        assert_eq!(rows[0][1], PendingValue::Ready(CanonicalValue::Null));
    }

    #[test]
    fn test_insert_rejections() {
        assert!(matches!(
            plan("INSERT INTO t1 (c1) VALUES (1)"),
            Err(JsonTableError::InvalidDefault { .. })
        ));
        assert!(matches!(
            plan("INSERT INTO t1 (c3, nope) VALUES ('a', 1)"),
            Err(JsonTableError::UnknownColumn { .. })
        ));
        assert!(matches!(
            plan("INSERT INTO t1 (c3, c3) VALUES ('a', 'b')"),
            Err(JsonTableError::DuplicateColumn { .. })
        ));
        assert!(matches!(
            plan("INSERT INTO t1 (c3) VALUES ('a', 'b')"),
            Err(JsonTableError::InvalidSql(_))
        ));
        assert!(matches!(
            plan("INSERT INTO t1 (c3) VALUES (NULL)"),
            Err(JsonTableError::TypeValidation { .. })
        ));
        assert!(matches!(
            plan("INSERT INTO t1 (c1, c3) VALUES ('abc', 'x')"),
            Err(JsonTableError::TypeValidation { .. })
        ));
    }
}
