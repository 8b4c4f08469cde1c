//! ALTER TABLE tests against stored rows
//!
//! Tests:
//! - Column id assignment across ADD / DROP
//! - DROP + ADD of the same name shows the new default
//! - CHANGE / MODIFY COLUMN re-coerce existing values
//! - RENAME COLUMN and RENAME TABLE keep data reachable
//! - A failing action rolls back the whole statement
//! - The last column of a table cannot be dropped

mod common;

use common::{exec, memory_client, query, text};
use jtable_commons::SqlValue;
use jtable_core::{JsonTableClient, JsonTableError};

fn column_ids(client: &JsonTableClient, table: &str) -> Vec<(String, i64)> {
    client
        .table(table)
        .expect("table is cached")
        .columns()
        .iter()
        .map(|c| (c.name.clone(), c.column_id))
        .collect()
}

#[test]
fn test_column_ids_follow_catalog_sequence() {
    let mut client = memory_client(1);
    exec(
        &mut client,
        "CREATE TABLE t1 (c1 INT DEFAULT NULL, c2 VARCHAR(30) DEFAULT 'ca', c3 VARCHAR NOT NULL)",
    );
    assert_eq!(
        column_ids(&client, "t1"),
        vec![("c1".to_string(), 16), ("c2".to_string(), 17), ("c3".to_string(), 18)]
    );

    exec(&mut client, "ALTER TABLE t1 ADD COLUMN c4 INT");
    assert_eq!(column_ids(&client, "t1").last(), Some(&("c4".to_string(), 19)));

    exec(&mut client, "ALTER TABLE t1 DROP COLUMN c3");
    exec(&mut client, "ALTER TABLE t1 ADD COLUMN email VARCHAR(100)");
    assert_eq!(
        column_ids(&client, "t1"),
        vec![
            ("c1".to_string(), 16),
            ("c2".to_string(), 17),
            ("c4".to_string(), 19),
            ("email".to_string(), 20),
        ]
    );
}

#[test]
fn test_drop_then_add_shows_new_default() {
    let mut client = memory_client(1);
    exec(&mut client, "CREATE TABLE t (a INT, b INT DEFAULT 5)");
    exec(&mut client, "INSERT INTO t (a, b) VALUES (1, 7)");

    exec(&mut client, "ALTER TABLE t DROP COLUMN b");
    let rows = query(&client, "SELECT * FROM t");
    assert_eq!(rows.columns, vec!["a"]);

    exec(&mut client, "ALTER TABLE t ADD COLUMN b INT DEFAULT 9");
    let rows = query(&client, "SELECT a, b FROM t");
    assert_eq!(rows.rows, vec![vec![SqlValue::Int(1), SqlValue::Int(9)]]);
}

#[test]
fn test_add_not_null_without_default_needs_empty_table() {
    let mut client = memory_client(1);
    exec(&mut client, "CREATE TABLE t (a INT)");
    exec(&mut client, "ALTER TABLE t ADD COLUMN b INT NOT NULL");
    assert!(client.table("t").unwrap().contains_column("b"));

    exec(&mut client, "INSERT INTO t (a, b) VALUES (1, 2)");
    let err = client.execute("ALTER TABLE t ADD COLUMN c INT NOT NULL").unwrap_err();
    assert!(matches!(err, JsonTableError::InvalidDefault { .. }), "got {:?}", err);
    assert!(!client.table("t").unwrap().contains_column("c"));
}

#[test]
fn test_change_column_preserves_data() {
    let mut client = memory_client(1);
    exec(&mut client, "CREATE TABLE t3 (a INT, b VARCHAR(10))");
    exec(&mut client, "INSERT INTO t3 (a, b) VALUES (1, '10'), (2, NULL)");

    exec(&mut client, "ALTER TABLE t3 CHANGE COLUMN b b_num INT");

    let rows = query(&client, "SELECT * FROM t3 ORDER BY a");
    assert_eq!(rows.columns, vec!["a", "b_num"]);
    assert_eq!(
        rows.rows,
        vec![
            vec![SqlValue::Int(1), SqlValue::Int(10)],
            vec![SqlValue::Int(2), SqlValue::Null],
        ]
    );
    let changed = client.table("t3").unwrap().column("b_num").unwrap();
    assert_eq!(changed.column_id, 17);
    assert_eq!(changed.type_spec, "INT");
}

#[test]
fn test_modify_column_fills_nulls_with_default() {
    let mut client = memory_client(1);
    exec(&mut client, "CREATE TABLE t (a INT, b VARCHAR(10))");
    exec(&mut client, "INSERT INTO t (a) VALUES (1)");

    exec(&mut client, "ALTER TABLE t MODIFY COLUMN b VARCHAR(20) NOT NULL DEFAULT 'none'");

    let rows = query(&client, "SELECT b FROM t");
    assert_eq!(rows.rows, vec![vec![text("none")]]);
    assert!(!client.table("t").unwrap().column("b").unwrap().nullable);
}

#[test]
fn test_failed_alter_rolls_back() {
    let mut client = memory_client(1);
    exec(&mut client, "CREATE TABLE t3 (a INT, b VARCHAR(10))");
    exec(&mut client, "INSERT INTO t3 (a, b) VALUES (1, '10')");
    let before = client.table("t3").cloned().unwrap();

    let err = client.execute("ALTER TABLE t3 MODIFY COLUMN b VARCHAR(1)").unwrap_err();
    assert!(matches!(err, JsonTableError::TypeValidation { .. }), "got {:?}", err);

    let err = client
        .execute("ALTER TABLE t3 ADD COLUMN c INT DEFAULT 3, DROP COLUMN nope")
        .unwrap_err();
    assert!(matches!(err, JsonTableError::UnknownColumn { .. }), "got {:?}", err);

    assert_eq!(client.table("t3"), Some(&before));
    client.refresh().unwrap();
    assert_eq!(client.table("t3"), Some(&before));

    let rows = query(&client, "SELECT * FROM t3");
    assert_eq!(rows.rows, vec![vec![SqlValue::Int(1), text("10")]]);
}

#[test]
fn test_rename_column_and_table() {
    let mut client = memory_client(1);
    exec(&mut client, "CREATE TABLE t4 (a INT, b VARCHAR(10))");
    exec(&mut client, "INSERT INTO t4 VALUES (1, 'x')");

    exec(&mut client, "ALTER TABLE t4 RENAME COLUMN a TO id");
    exec(&mut client, "ALTER TABLE t4 RENAME TO t5");

    assert!(client.table("t4").is_none());
    assert!(matches!(
        client.execute("SELECT * FROM t4"),
        Err(JsonTableError::UnknownTable(_))
    ));

    let rows = query(&client, "SELECT id, b FROM t5");
    assert_eq!(rows.rows, vec![vec![SqlValue::Int(1), text("x")]]);
    assert_eq!(client.table("t5").unwrap().column("id").unwrap().column_id, 16);
}

#[test]
fn test_rename_onto_existing_table_fails() {
    let mut client = memory_client(1);
    exec(&mut client, "CREATE TABLE a (x INT)");
    exec(&mut client, "CREATE TABLE b (y INT)");

    assert!(matches!(
        client.execute("ALTER TABLE a RENAME TO b"),
        Err(JsonTableError::DuplicateTable(_))
    ));
    assert!(client.table("a").is_some());
}

#[test]
fn test_drop_last_column_is_rejected() {
    let mut client = memory_client(1);
    exec(&mut client, "CREATE TABLE solo (only_col INT)");
    exec(&mut client, "INSERT INTO solo VALUES (4)");

    let err = client.execute("ALTER TABLE solo DROP COLUMN only_col").unwrap_err();
    assert!(matches!(err, JsonTableError::InvalidSql(_)), "got {:?}", err);

    client.refresh().unwrap();
    assert_eq!(client.table("solo").unwrap().columns().len(), 1);
    assert_eq!(query(&client, "SELECT only_col FROM solo").rows, vec![vec![SqlValue::Int(4)]]);
}
