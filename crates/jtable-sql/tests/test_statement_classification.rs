//! Tests for SQL statement classification
//!
//! Tests cover:
//! - CREATE TABLE / ALTER TABLE extraction through the classifier
//! - DML statement classification (INSERT, UPDATE, DELETE)
//! - SELECT classification (including CTEs)
//! - Rejection of every other statement kind

use jtable_sql::ddl::AlterOperation;
use jtable_sql::{SqlStatement, SqlStatementKind, StatementClassificationError};

#[test]
fn test_classify_create_table_with_defaults() {
    let sql = "CREATE TABLE t1 (c1 INT DEFAULT NULL, c2 VARCHAR(30) DEFAULT 'ca', c3 VARCHAR NOT NULL)";
    let stmt = SqlStatement::classify(sql).unwrap();

    match stmt.kind() {
        SqlStatementKind::CreateTable(create) => {
            assert_eq!(create.table_name.as_str(), "t1");
            let names: Vec<&str> = create.columns.iter().map(|c| c.name.as_str()).collect();
            assert_eq!(names, vec!["c1", "c2", "c3"]);
        },
        _ => panic!("Expected CreateTable"),
    }
    assert_eq!(stmt.sql_text(), sql);
}

#[test]
fn test_classify_alter_table_actions() {
    let stmt = SqlStatement::classify(
        "ALTER TABLE t2 CHANGE COLUMN c2 changed_col INT, RENAME TO t3",
    )
    .unwrap();

    match stmt.into_kind() {
        SqlStatementKind::AlterTable(alter) => {
            assert_eq!(alter.operations.len(), 2);
            assert!(matches!(alter.operations[0], AlterOperation::ChangeColumn { .. }));
            assert!(matches!(alter.operations[1], AlterOperation::RenameTable { .. }));
        },
        _ => panic!("Expected AlterTable"),
    }
}

#[test]
fn test_classify_dml() {
    assert!(matches!(
        SqlStatement::classify("INSERT INTO t1 (c2, c3) VALUES ('hello', 'foo')").unwrap().kind(),
        SqlStatementKind::Insert(_)
    ));
    assert!(matches!(
        SqlStatement::classify("UPDATE t1 SET c1 = c1 + 1 WHERE c2 = 'hello'").unwrap().kind(),
        SqlStatementKind::Update(_)
    ));
    assert!(matches!(
        SqlStatement::classify("DELETE FROM t1 WHERE c1 IS NULL").unwrap().kind(),
        SqlStatementKind::Delete(_)
    ));
}

#[test]
fn test_classify_simple_cte() {
    let sql = "WITH recent AS (SELECT * FROM t1) SELECT * FROM recent";
    let stmt = SqlStatement::classify(sql).unwrap();
    assert!(
        matches!(stmt.kind(), SqlStatementKind::Select(_)),
        "CTEs starting with WITH should be classified as SELECT"
    );
}

#[test]
fn test_classify_rejects_drop_table() {
    let err = SqlStatement::classify("DROP TABLE t1").unwrap_err();
    assert_eq!(err, StatementClassificationError::Unsupported("DROP".to_string()));
    assert!(err.to_string().contains("Unsupported statement"));
}

#[test]
fn test_classify_reports_alter_parse_errors() {
    match SqlStatement::classify("ALTER TABLE t1 ADD COLUMN") {
        Err(StatementClassificationError::InvalidSql { sql, .. }) => {
            assert_eq!(sql, "ALTER TABLE t1 ADD COLUMN");
        },
        other => panic!("Expected InvalidSql, got {:?}", other),
    }
}
