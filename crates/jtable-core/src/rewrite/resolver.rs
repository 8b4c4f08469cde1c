use std::collections::HashSet;
use std::ops::ControlFlow;

use jtable_commons::{ColumnMeta, VirtualTable};
use jtable_sql::parser::utils::parse_sql_expr;
use sqlparser::ast::{visit_expressions_mut, Expr, Ident, VisitMut};

use super::{column_type, reject_placeholder};
use crate::engine::PhysicalDialect;
use crate::error::{JsonTableError, Result};

/// Replaces virtual column references with JSON accessors.
#[derive(Debug, Clone)]
pub struct ColumnResolver<'a> {
    table: &'a VirtualTable,
    dialect: PhysicalDialect,
    qualifiers: Vec<String>,
    aliases: HashSet<String>,
}

impl<'a> ColumnResolver<'a> {
    pub fn new(table: &'a VirtualTable, dialect: PhysicalDialect) -> Self {
        Self {
            table,
            dialect,
            qualifiers: vec![table.name().as_str().to_string()],
            aliases: HashSet::new(),
        }
    }

    /// Also accept `alias.column` for a table alias.
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifiers.push(qualifier.into());
        self
    }

    /// Projection aliases that ORDER BY / GROUP BY / HAVING may name.
    pub fn with_aliases(mut self, aliases: HashSet<String>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn table(&self) -> &'a VirtualTable {
        self.table
    }

    /// Accessor expression reading `column` out of the payload.
    pub fn accessor(&self, column: &ColumnMeta) -> Result<Expr> {
        let ty = column_type(column)?;
        let text = self.dialect.json_accessor(&column.name, &ty);
        parse_sql_expr(&text).map_err(|e| JsonTableError::InvalidSql(format!("{}: {}", text, e)))
    }

    /// Accessor for a column named in caller SQL.
    pub fn resolve(&self, name: &str) -> Result<Expr> {
        let column = self
            .table
            .column(name)
            .ok_or_else(|| JsonTableError::unknown_column(self.table.name().as_str(), name))?;
        self.accessor(column)
    }

    /// Rewrite every column reference inside `target`.
    ///
    /// With `allow_aliases`, a bare identifier naming a projection alias is
    /// left alone.
    pub fn rewrite<V: VisitMut>(&self, target: &mut V, allow_aliases: bool) -> Result<()> {
        let flow = visit_expressions_mut(target, |expr| match self.rewrite_expr(expr, allow_aliases) {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => ControlFlow::Break(e),
        });
        match flow {
            ControlFlow::Break(e) => Err(e),
            ControlFlow::Continue(()) => Ok(()),
        }
    }

    fn rewrite_expr(&self, expr: &mut Expr, allow_aliases: bool) -> Result<()> {
        reject_placeholder(expr)?;
        match expr {
            Expr::Identifier(ident) => {
                if allow_aliases && self.aliases.contains(&ident.value) {
                    return Ok(());
                }
                *expr = self.resolve(&ident.value)?;
            },
            Expr::CompoundIdentifier(parts) => {
                *expr = self.resolve_qualified(parts)?;
            },
            Expr::Subquery(_) | Expr::InSubquery { .. } | Expr::Exists { .. } => {
                return Err(JsonTableError::UnsupportedStatement(
                    "subqueries over virtual tables".to_string(),
                ));
            },
            _ => {},
        }
        Ok(())
    }

    fn resolve_qualified(&self, parts: &[Ident]) -> Result<Expr> {
        match parts {
            [qualifier, column] if self.qualifiers.iter().any(|q| q == &qualifier.value) => {
                self.resolve(&column.value)
            },
            _ => {
                let name: Vec<&str> = parts.iter().map(|p| p.value.as_str()).collect();
                Err(JsonTableError::unknown_column(
                    self.table.name().as_str(),
                    name.join("."),
                ))
            },
        }
    }
}

/// Output name for a projected catalog column.
pub(crate) fn column_ident(name: &str) -> Ident {
    let simple = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        Ident::new(name)
    } else {
        Ident::with_quote('`', name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::test_support::sample_cache;
    use jtable_commons::TableName;

    #[test]
    fn test_rewrite_where_clause() {
        let cache = sample_cache();
        let table = cache.get(&TableName::new("t1")).unwrap();
        let resolver = ColumnResolver::new(table, PhysicalDialect::Sqlite);

        let mut expr = parse_sql_expr("c1 > 10 AND t1.c2 = 'x'").unwrap();
        resolver.rewrite(&mut expr, false).unwrap();
        assert_eq!(
            expr.to_string(),
            "json_extract(jdata, '$.c1') > 10 AND json_extract(jdata, '$.c2') = 'x'"
        );
    }

    #[test]
    fn test_unknown_column() {
        let cache = sample_cache();
        let table = cache.get(&TableName::new("t1")).unwrap();
        let resolver = ColumnResolver::new(table, PhysicalDialect::Sqlite);

        let mut expr = parse_sql_expr("missing = 1").unwrap();
        match resolver.rewrite(&mut expr, false) {
            Err(JsonTableError::UnknownColumn { table, column }) => {
                assert_eq!(table, "t1");
                assert_eq!(column, "missing");
            },
            other => panic!("Expected UnknownColumn, got {:?}", other),
        }

        let mut expr = parse_sql_expr("other.c1 = 1").unwrap();
        assert!(matches!(
            resolver.rewrite(&mut expr, false),
            Err(JsonTableError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_aliases_only_when_allowed() {
        let cache = sample_cache();
        let table = cache.get(&TableName::new("t1")).unwrap();
        let resolver = ColumnResolver::new(table, PhysicalDialect::Sqlite)
            .with_aliases(HashSet::from(["total".to_string()]));

        let mut expr = parse_sql_expr("total").unwrap();
        resolver.rewrite(&mut expr, true).unwrap();
        assert_eq!(expr.to_string(), "total");

        let mut expr = parse_sql_expr("total").unwrap();
        assert!(resolver.rewrite(&mut expr, false).is_err());
    }

    #[test]
    fn test_column_ident_quoting() {
        assert_eq!(column_ident("c1").to_string(), "c1");
        assert_eq!(column_ident("my col").to_string(), "`my col`");
    }
}
