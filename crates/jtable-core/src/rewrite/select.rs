use std::collections::HashSet;

use jtable_commons::constants::data_columns;
use jtable_commons::DATA_TABLE_NAME;
use jtable_sql::parser::utils::parse_sql_expr;
use sqlparser::ast::{
    BinaryOperator, Expr, Ident, ObjectName, Query, Select, SelectItem, SetExpr, Statement,
    TableFactor,
};

use super::resolver::column_ident;
use super::{ColumnResolver, PhysicalStatement, Rewriter};
use crate::access::RowFilter;
use crate::error::{JsonTableError, Result};

impl Rewriter<'_> {
    /// SELECT over one virtual table.
    ///
    /// `*` expands to the catalog columns in id order, bare column
    /// projections keep their name as alias, and `expose_row_id` prepends the
    /// surrogate `jdata_id`.
    pub fn select(&self, query: &Query, expose_row_id: bool) -> Result<PhysicalStatement> {
        if query.with.is_some() {
            return Err(JsonTableError::UnsupportedStatement(
                "WITH over virtual tables".to_string(),
            ));
        }

        let mut query = query.clone();
        let SetExpr::Select(select) = query.body.as_mut() else {
            return Err(JsonTableError::UnsupportedStatement(
                "set operations over virtual tables".to_string(),
            ));
        };

        let (table_name, alias) = single_relation(select)?;
        let table = self.table(&table_name)?;
        let mut resolver = ColumnResolver::new(table, self.dialect);
        if let Some(alias) = alias {
            resolver = resolver.with_qualifier(alias);
        }

        name_bare_columns(&mut select.projection);
        let aliases = projection_aliases(&select.projection);
        let resolver = resolver.with_aliases(aliases);

        resolver.rewrite(&mut select.projection, false)?;
        resolver.rewrite(&mut select.selection, false)?;
        resolver.rewrite(&mut select.group_by, true)?;
        resolver.rewrite(&mut select.having, true)?;
        resolver.rewrite(&mut query.order_by, true)?;
        resolver.rewrite(&mut query.limit_clause, false)?;

        let SetExpr::Select(select) = query.body.as_mut() else {
            return Err(JsonTableError::UnsupportedStatement(
                "set operations over virtual tables".to_string(),
            ));
        };
        select.projection = expand_wildcards(&resolver, std::mem::take(&mut select.projection))?;
        if expose_row_id {
            select.projection.insert(
                0,
                SelectItem::UnnamedExpr(Expr::Identifier(Ident::new(data_columns::ROW_ID))),
            );
        }

        retarget_relation(select);
        let filter = self.scope.read_filter(table.name(), self.tenant);
        select.selection = Some(conjoin_filter(&filter, select.selection.take())?);

        let sql = Statement::Query(Box::new(query)).to_string();
        log::debug!("Rewrote SELECT on '{}': {}", table.name(), sql);
        Ok(PhysicalStatement::new(sql, filter.params()))
    }
}

/// Name and alias of the only relation of a join-free SELECT.
fn single_relation(select: &Select) -> Result<(ObjectName, Option<String>)> {
    let unsupported =
        || JsonTableError::UnsupportedStatement("SELECT must read exactly one virtual table".to_string());
    let [from] = select.from.as_slice() else {
        return Err(unsupported());
    };
    if !from.joins.is_empty() {
        return Err(JsonTableError::UnsupportedStatement(
            "joins across virtual tables".to_string(),
        ));
    }
    match &from.relation {
        TableFactor::Table { name, alias, .. } => {
            Ok((name.clone(), alias.as_ref().map(|a| a.name.value.clone())))
        },
        _ => Err(unsupported()),
    }
}

fn retarget_relation(select: &mut Select) {
    if let Some(from) = select.from.first_mut() {
        if let TableFactor::Table { name, .. } = &mut from.relation {
            *name = ObjectName::from(vec![Ident::new(DATA_TABLE_NAME)]);
        }
    }
}

/// `SELECT c1` keeps `c1` as the output column name once rewritten.
fn name_bare_columns(projection: &mut [SelectItem]) {
    for item in projection.iter_mut() {
        let alias = match item {
            SelectItem::UnnamedExpr(Expr::Identifier(ident)) => ident.clone(),
            SelectItem::UnnamedExpr(Expr::CompoundIdentifier(parts)) => match parts.last() {
                Some(last) => last.clone(),
                None => continue,
            },
            _ => continue,
        };
        if let SelectItem::UnnamedExpr(expr) = item {
            let expr = expr.clone();
            *item = SelectItem::ExprWithAlias { expr, alias };
        }
    }
}

fn projection_aliases(projection: &[SelectItem]) -> HashSet<String> {
    projection
        .iter()
        .filter_map(|item| match item {
            SelectItem::ExprWithAlias { alias, .. } => Some(alias.value.clone()),
            _ => None,
        })
        .collect()
}

fn expand_wildcards(resolver: &ColumnResolver<'_>, projection: Vec<SelectItem>) -> Result<Vec<SelectItem>> {
    let mut expanded = Vec::with_capacity(projection.len());
    for item in projection {
        match item {
            SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..) => {
                for column in resolver.table().columns() {
                    expanded.push(SelectItem::ExprWithAlias {
                        expr: resolver.accessor(column)?,
                        alias: column_ident(&column.name),
                    });
                }
            },
            other => expanded.push(other),
        }
    }
    Ok(expanded)
}

/// `<row filter> AND (<caller predicate>)`
pub(crate) fn conjoin_filter(filter: &RowFilter, selection: Option<Expr>) -> Result<Expr> {
    let predicate = filter.predicate();
    let filter_expr = parse_sql_expr(&predicate)
        .map_err(|e| JsonTableError::InvalidSql(format!("{}: {}", predicate, e)))?;
    Ok(match selection {
        Some(existing) => Expr::BinaryOp {
            left: Box::new(filter_expr),
            op: BinaryOperator::And,
            right: Box::new(Expr::Nested(Box::new(existing))),
        },
        None => filter_expr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessScope;
    use crate::engine::PhysicalDialect;
    use crate::rewrite::test_support::sample_cache;
    use jtable_commons::{SqlValue, TenantId};
    use jtable_sql::{SqlStatement, SqlStatementKind};

    fn rewrite(sql: &str, scope: AccessScope, expose_row_id: bool) -> Result<PhysicalStatement> {
        let cache = sample_cache();
        let rewriter = Rewriter::new(&cache, PhysicalDialect::Sqlite, scope);
        match SqlStatement::classify(sql).unwrap().into_kind() {
            SqlStatementKind::Select(query) => rewriter.select(&query, expose_row_id),
            other => panic!("Expected SELECT, got {:?}", other),
        }
    }

    #[test]
    fn test_star_expands_in_catalog_order() {
        let stmt = rewrite("SELECT * FROM t1", AccessScope::tenant(TenantId::new(7)), false).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT json_extract(jdata, '$.c1') AS c1, json_extract(jdata, '$.c2') AS c2, \
             json_extract(jdata, '$.c3') AS c3 FROM _data_json_t \
             WHERE owner_id = ? AND user_id = ? AND jtable_name = ?"
        );
        assert_eq!(
            stmt.params,
            vec![SqlValue::Int(7), SqlValue::Int(7), SqlValue::from("t1")]
        );
    }

    #[test]
    fn test_caller_predicate_is_conjoined() {
        let stmt = rewrite(
            "SELECT c2 FROM t1 WHERE c1 > 5 OR c3 = 'x'",
            AccessScope::tenant(TenantId::new(1)),
            false,
        )
        .unwrap();
        assert!(stmt.sql.starts_with("SELECT json_extract(jdata, '$.c2') AS c2 FROM _data_json_t"));
        assert!(stmt.sql.ends_with(
            "WHERE owner_id = ? AND user_id = ? AND jtable_name = ? AND (json_extract(jdata, '$.c1') > 5 \
             OR json_extract(jdata, '$.c3') = 'x')"
        ));
    }

    #[test]
    fn test_admin_read_has_no_tenant_filter() {
        let stmt = rewrite("SELECT c1 FROM t1", AccessScope::admin(TenantId::new(0)), false).unwrap();
        assert!(stmt.sql.ends_with("WHERE owner_id = ? AND jtable_name = ?"));
        assert_eq!(stmt.params, vec![SqlValue::Int(0), SqlValue::from("t1")]);
    }

    #[test]
    fn test_expose_row_id() {
        let stmt = rewrite("SELECT c1 FROM t1", AccessScope::tenant(TenantId::new(1)), true).unwrap();
        assert!(stmt.sql.starts_with("SELECT jdata_id, json_extract(jdata, '$.c1') AS c1"));
    }

    #[test]
    fn test_order_by_alias_and_column() {
        let stmt = rewrite(
            "SELECT c1 AS a FROM t1 ORDER BY a, c2 DESC LIMIT 3",
            AccessScope::tenant(TenantId::new(1)),
            false,
        )
        .unwrap();
        assert!(stmt.sql.contains("ORDER BY a, json_extract(jdata, '$.c2') DESC LIMIT 3"));
    }

    #[test]
    fn test_rejections() {
        let scope = AccessScope::tenant(TenantId::new(1));
        assert!(matches!(
            rewrite("SELECT * FROM missing", scope, false),
            Err(JsonTableError::UnknownTable(_))
        ));
        assert!(matches!(
            rewrite("SELECT nope FROM t1", scope, false),
            Err(JsonTableError::UnknownColumn { .. })
        ));
        assert!(matches!(
            rewrite("SELECT * FROM t1 JOIN t1 AS b ON t1.c1 = b.c1", scope, false),
            Err(JsonTableError::UnsupportedStatement(_))
        ));
        assert!(matches!(
            rewrite("SELECT c1 FROM t1 WHERE c1 = ?", scope, false),
            Err(JsonTableError::InvalidSql(_))
        ));
    }
}
