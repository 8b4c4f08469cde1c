//! SQL Statement Rewriter
//!
//! Turns DML/DQL written against a virtual table into statements over
//! `_data_json_t`. Column references become typed JSON accessors, the row
//! filter of the access scope is conjoined with the caller's predicate, and
//! every lookup against the catalog happens before anything is sent to the
//! engine.

mod delete;
mod insert;
mod resolver;
mod select;
mod update;

pub use insert::{InsertPlan, PendingValue};
pub use update::{AssignedValue, UpdatePlan};
pub use resolver::ColumnResolver;

use jtable_commons::{ColumnMeta, SqlValue, TableName, TenantId, VirtualTable};
use jtable_sql::parser::utils::object_name_to_table;
use sqlparser::ast::{Expr, ObjectName, UnaryOperator, Value};

use crate::access::AccessScope;
use crate::catalog::MetaCache;
use crate::engine::PhysicalDialect;
use crate::error::{JsonTableError, Result};
use crate::types::{CanonicalValue, TypeDescriptor};

/// A statement ready for the underlying engine.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalStatement {
    pub sql: String,
    /// Positional parameters for the `?` placeholders of `sql`
    pub params: Vec<SqlValue>,
}

impl PhysicalStatement {
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Rewrites statements for one access scope against one catalog snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Rewriter<'a> {
    cache: &'a MetaCache,
    dialect: PhysicalDialect,
    scope: AccessScope,
    tenant: Option<TenantId>,
}

impl<'a> Rewriter<'a> {
    pub fn new(cache: &'a MetaCache, dialect: PhysicalDialect, scope: AccessScope) -> Self {
        Self {
            cache,
            dialect,
            scope,
            tenant: None,
        }
    }

    /// Per-call tenant overriding the scope's own.
    pub fn with_tenant(mut self, tenant: Option<TenantId>) -> Self {
        self.tenant = tenant;
        self
    }

    pub fn dialect(&self) -> PhysicalDialect {
        self.dialect
    }

    fn table(&self, name: &ObjectName) -> Result<&'a VirtualTable> {
        let name = object_name_to_table(name)
            .ok_or_else(|| JsonTableError::InvalidSql(format!("Invalid table name: {}", name)))?;
        self.cache.require(&TableName::new(name))
    }
}

/// Parsed type of a catalog column.
pub(crate) fn column_type(column: &ColumnMeta) -> Result<TypeDescriptor> {
    TypeDescriptor::parse(&column.type_spec)
        .map_err(|e| JsonTableError::from_value_error(&column.name, e))
}

/// Literal scalar of a VALUES/SET expression, `None` for anything the engine
/// has to compute.
pub(crate) fn literal_value(expr: &Expr) -> Option<SqlValue> {
    match expr {
        Expr::Value(val) => sql_value(&val.value),
        Expr::Nested(inner) => literal_value(inner),
        Expr::UnaryOp {
            op: UnaryOperator::Minus,
            expr,
        } => match literal_value(expr)? {
            SqlValue::Int(i) => i.checked_neg().map(SqlValue::Int),
            SqlValue::Float(f) => Some(SqlValue::Float(-f)),
            _ => None,
        },
        _ => None,
    }
}

fn sql_value(value: &Value) -> Option<SqlValue> {
    match value {
        Value::Number(n, _) => match n.parse::<i64>() {
            Ok(i) => Some(SqlValue::Int(i)),
            Err(_) => n.parse::<f64>().ok().map(SqlValue::Float),
        },
        Value::SingleQuotedString(s) | Value::DoubleQuotedString(s) => Some(SqlValue::Text(s.clone())),
        Value::Boolean(b) => Some(SqlValue::Bool(*b)),
        Value::Null => Some(SqlValue::Null),
        _ => None,
    }
}

/// Rejects `?`/`$n` placeholders in caller SQL; only the row filter binds
/// parameters.
pub(crate) fn reject_placeholder(expr: &Expr) -> Result<()> {
    match expr {
        Expr::Value(val) if matches!(val.value, Value::Placeholder(_)) => Err(JsonTableError::InvalidSql(
            format!("Placeholder '{}' is not supported in virtual table statements", val.value),
        )),
        _ => Ok(()),
    }
}

pub(crate) fn check_not_null(column: &ColumnMeta, value: &CanonicalValue) -> Result<()> {
    if value.is_null() && !column.nullable {
        return Err(JsonTableError::TypeValidation {
            column: column.name.clone(),
            reason: "NULL supplied for a NOT NULL column".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use jtable_commons::{ColumnMeta, TableName, VirtualTable};

    use crate::catalog::MetaCache;

    /// `t1 (c1 INT DEFAULT NULL, c2 VARCHAR(30) DEFAULT 'ca', c3 VARCHAR NOT NULL)`
    pub fn sample_cache() -> MetaCache {
        MetaCache::from_tables([VirtualTable::with_columns(
            TableName::new("t1"),
            vec![
                ColumnMeta::new(16, "c1", "INT").with_default(None),
                ColumnMeta::new(17, "c2", "VARCHAR(30)").with_default(Some("'ca'".to_string())),
                ColumnMeta::new(18, "c3", "VARCHAR").with_nullable(false),
            ],
        )])
    }
}
