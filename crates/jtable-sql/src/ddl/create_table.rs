//! CREATE TABLE statement extraction
//!
//! Parses SQL statements like:
//! - CREATE TABLE t1 (c1 INT DEFAULT NULL, c2 VARCHAR(30) DEFAULT 'ca', c3 VARCHAR NOT NULL)
//! - CREATE TABLE IF NOT EXISTS `t2` (c1 DECIMAL(10, 2))

use jtable_commons::TableName;
use sqlparser::ast::{CreateTable, Statement};

use crate::ddl::{ColumnDefinition, DdlResult};
use crate::parser::utils::{object_name_to_table, parse_sql_statements};

/// CREATE TABLE statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableStatement {
    pub table_name: TableName,
    /// Columns in declaration order
    pub columns: Vec<ColumnDefinition>,
    pub if_not_exists: bool,
}

impl CreateTableStatement {
    pub fn parse(sql: &str) -> DdlResult<Self> {
        let statements = parse_sql_statements(sql).map_err(|e| e.to_string())?;
        match statements.as_slice() {
            [statement] => Self::from_statement(statement),
            [] => Err("Empty CREATE TABLE statement".to_string()),
            _ => Err("Expected a single CREATE TABLE statement".to_string()),
        }
    }

    pub fn from_statement(statement: &Statement) -> DdlResult<Self> {
        let Statement::CreateTable(CreateTable {
            name,
            columns,
            if_not_exists,
            query,
            ..
        }) = statement
        else {
            return Err("Expected CREATE TABLE statement".to_string());
        };

        if query.is_some() {
            return Err("CREATE TABLE ... AS SELECT is not supported".to_string());
        }

        let table_name =
            object_name_to_table(name).ok_or_else(|| "Table name is required".to_string())?;

        if columns.is_empty() {
            return Err(format!("Table '{}' must declare at least one column", table_name));
        }

        let columns = columns
            .iter()
            .map(ColumnDefinition::from_column_def)
            .collect::<DdlResult<Vec<_>>>()?;

        Ok(Self {
            table_name: TableName::new(table_name),
            columns,
            if_not_exists: *if_not_exists,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_table() {
        let stmt = CreateTableStatement::parse(
            "CREATE TABLE t1 (c1 INT DEFAULT NULL, c2 VARCHAR(30) DEFAULT 'ca', c3 VARCHAR NOT NULL)",
        )
        .unwrap();

        assert_eq!(stmt.table_name.as_str(), "t1");
        assert_eq!(stmt.columns.len(), 3);

        let c1 = &stmt.columns[0];
        assert_eq!(c1.data_type, "INT");
        assert!(c1.nullable);
        assert!(c1.has_default);
        assert_eq!(c1.default_expr, None);

        let c2 = &stmt.columns[1];
        assert_eq!(c2.data_type, "VARCHAR(30)");
        assert_eq!(c2.default_expr.as_deref(), Some("'ca'"));

        let c3 = &stmt.columns[2];
        assert_eq!(c3.data_type, "VARCHAR");
        assert!(!c3.nullable);
        assert!(!c3.has_default);
    }

    #[test]
    fn test_parse_backquoted_name_and_decimal() {
        let stmt = CreateTableStatement::parse(
            "create table `t2` (c1 int NOT NULL DEFAULT 10, c4 decimal(10, 2))",
        )
        .unwrap();

        assert_eq!(stmt.table_name.as_str(), "t2");
        assert!(!stmt.columns[0].nullable);
        assert_eq!(stmt.columns[0].default_expr.as_deref(), Some("10"));
        assert_eq!(stmt.columns[1].data_type, "DECIMAL(10,2)");
    }

    #[test]
    fn test_reject_unsupported_constraint() {
        let err = CreateTableStatement::parse("CREATE TABLE t1 (c1 INT PRIMARY KEY)").unwrap_err();
        assert!(err.contains("not supported"), "unexpected error: {}", err);
    }

    #[test]
    fn test_reject_create_table_as_select() {
        assert!(CreateTableStatement::parse("CREATE TABLE t1 AS SELECT 1").is_err());
    }
}
