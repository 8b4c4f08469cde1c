use jtable_commons::DATA_TABLE_NAME;
use sqlparser::ast::{Delete, FromTable, TableFactor};

use super::select::conjoin_filter;
use super::{ColumnResolver, PhysicalStatement, Rewriter};
use crate::error::{JsonTableError, Result};

impl Rewriter<'_> {
    /// DELETE from one virtual table, scoped to the writing tenant.
    pub fn delete(&self, delete: &Delete) -> Result<PhysicalStatement> {
        let unsupported =
            || JsonTableError::UnsupportedStatement("DELETE must target exactly one virtual table".to_string());
        if !delete.tables.is_empty() || delete.using.is_some() {
            return Err(unsupported());
        }

        let from = match &delete.from {
            FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables) => tables,
        };
        let [target] = from.as_slice() else {
            return Err(unsupported());
        };
        if !target.joins.is_empty() {
            return Err(unsupported());
        }
        let (name, alias) = match &target.relation {
            TableFactor::Table { name, alias, .. } => (name, alias.as_ref().map(|a| a.name.value.clone())),
            _ => return Err(unsupported()),
        };

        let table = self.table(name)?;
        let mut resolver = ColumnResolver::new(table, self.dialect);
        if let Some(alias) = alias {
            resolver = resolver.with_qualifier(alias);
        }

        let mut selection = delete.selection.clone();
        resolver.rewrite(&mut selection, false)?;

        let filter = self.scope.write_filter(table.name(), self.tenant, "DELETE")?;
        let predicate = conjoin_filter(&filter, selection)?;

        let sql = format!("DELETE FROM {} WHERE {}", DATA_TABLE_NAME, predicate);
        log::debug!("Rewrote DELETE on '{}': {}", table.name(), sql);
        Ok(PhysicalStatement::new(sql, filter.params()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessScope;
    use crate::engine::PhysicalDialect;
    use crate::rewrite::test_support::sample_cache;
    use jtable_commons::{SqlValue, TenantId};
    use jtable_sql::{SqlStatement, SqlStatementKind};

    fn rewrite(sql: &str, scope: AccessScope) -> Result<PhysicalStatement> {
        let cache = sample_cache();
        let rewriter = Rewriter::new(&cache, PhysicalDialect::Sqlite, scope);
        match SqlStatement::classify(sql).unwrap().into_kind() {
            SqlStatementKind::Delete(delete) => rewriter.delete(&delete),
            other => panic!("Expected DELETE, got {:?}", other),
        }
    }

    #[test]
    fn test_delete_with_predicate() {
        let stmt = rewrite("DELETE FROM t1 WHERE c1 IS NULL", AccessScope::tenant(TenantId::new(2))).unwrap();
        assert_eq!(
            stmt.sql,
            "DELETE FROM _data_json_t WHERE owner_id = ? AND user_id = ? AND jtable_name = ? \
             AND (json_extract(jdata, '$.c1') IS NULL)"
        );
        assert_eq!(
            stmt.params,
            vec![SqlValue::Int(2), SqlValue::Int(2), SqlValue::from("t1")]
        );
    }

    #[test]
    fn test_delete_all_rows_of_tenant() {
        let stmt = rewrite("DELETE FROM t1", AccessScope::tenant(TenantId::new(2))).unwrap();
        assert_eq!(
            stmt.sql,
            "DELETE FROM _data_json_t WHERE owner_id = ? AND user_id = ? AND jtable_name = ?"
        );
    }

    #[test]
    fn test_delete_rejections() {
        let scope = AccessScope::tenant(TenantId::new(2));
        assert!(matches!(
            rewrite("DELETE FROM t1 WHERE nope = 1", scope),
            Err(JsonTableError::UnknownColumn { .. })
        ));
        assert!(matches!(
            rewrite("DELETE FROM t2", scope),
            Err(JsonTableError::UnknownTable(_))
        ));
        assert!(matches!(
            rewrite("DELETE FROM t1", AccessScope::admin(TenantId::new(0))),
            Err(JsonTableError::TenantRequired(_))
        ));
    }
}
