//! Multi-tenant access over one shared database file
//!
//! Tests:
//! - Tenants of one principal only see their own rows
//! - Admin reads union all tenants, writes need an explicit tenant
//! - A second client picks up catalog changes on refresh
//! - reset() clears the principal's tables
//! - Principals sharing a table name never see or rewrite each other's rows

mod common;

use common::{exec, file_client, query, text};
use jtable_commons::{SqlValue, TenantId};
use jtable_core::{AccessScope, ExecutionResult, JsonTableError, QueryOptions};
use tempfile::TempDir;

fn shared_db() -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("jtable.db");
    (dir, path)
}

fn tenant_scope(tenant: i64) -> AccessScope {
    AccessScope::new(TenantId::new(1), TenantId::new(tenant))
}

#[test]
fn test_tenants_are_isolated() {
    let (_dir, path) = shared_db();
    let mut alice = file_client(&path, tenant_scope(10));
    exec(&mut alice, "CREATE TABLE notes (body VARCHAR(20))");
    exec(&mut alice, "INSERT INTO notes VALUES ('a')");

    let mut bob = file_client(&path, tenant_scope(20));
    exec(&mut bob, "INSERT INTO notes VALUES ('b')");

    assert_eq!(query(&alice, "SELECT body FROM notes").rows, vec![vec![text("a")]]);
    assert_eq!(query(&bob, "SELECT body FROM notes").rows, vec![vec![text("b")]]);

    assert_eq!(
        exec(&mut bob, "DELETE FROM notes"),
        ExecutionResult::RowsAffected(1)
    );
    assert_eq!(query(&alice, "SELECT COUNT(*) FROM notes").scalar(), Some(&SqlValue::Int(1)));
}

#[test]
fn test_admin_reads_union_and_writes_per_tenant() {
    let (_dir, path) = shared_db();
    let mut alice = file_client(&path, tenant_scope(10));
    exec(&mut alice, "CREATE TABLE notes (body VARCHAR(20))");
    exec(&mut alice, "INSERT INTO notes VALUES ('a')");
    let mut bob = file_client(&path, tenant_scope(20));
    exec(&mut bob, "INSERT INTO notes VALUES ('b')");

    let mut admin = file_client(&path, AccessScope::admin(TenantId::new(1)));
    let rows = query(&admin, "SELECT body FROM notes ORDER BY body");
    assert_eq!(rows.rows, vec![vec![text("a")], vec![text("b")]]);

    let only_bob = admin
        .query_with(
            "SELECT body FROM notes",
            QueryOptions {
                expose_row_id: false,
                tenant: Some(TenantId::new(20)),
            },
        )
        .unwrap();
    assert_eq!(only_bob.rows, vec![vec![text("b")]]);

    assert!(matches!(
        admin.execute("INSERT INTO notes VALUES ('c')"),
        Err(JsonTableError::TenantRequired(_))
    ));
    assert!(matches!(
        admin.execute("UPDATE notes SET body = 'z'"),
        Err(JsonTableError::TenantRequired(_))
    ));

    admin
        .execute_as("INSERT INTO notes VALUES ('c')", TenantId::new(30))
        .unwrap();
    assert_eq!(query(&alice, "SELECT body FROM notes").rows, vec![vec![text("a")]]);
    assert_eq!(query(&admin, "SELECT COUNT(*) FROM notes").scalar(), Some(&SqlValue::Int(3)));
}

#[test]
fn test_other_principal_has_own_catalog() {
    let (_dir, path) = shared_db();
    let mut first = file_client(&path, AccessScope::tenant(TenantId::new(1)));
    exec(&mut first, "CREATE TABLE notes (body VARCHAR(20))");

    let second = file_client(&path, AccessScope::tenant(TenantId::new(2)));
    assert!(second.table("notes").is_none());
}

#[test]
fn test_refresh_picks_up_catalog_changes() {
    let (_dir, path) = shared_db();
    let mut writer = file_client(&path, tenant_scope(10));
    let mut reader = file_client(&path, tenant_scope(20));

    exec(
        &mut writer,
        "CREATE TABLE items (id INT NOT NULL, price DECIMAL(8,2) DEFAULT 1.5, seen TIMESTAMP DEFAULT NULL)",
    );
    assert!(matches!(
        reader.execute("SELECT * FROM items"),
        Err(JsonTableError::UnknownTable(_))
    ));

    reader.refresh().unwrap();
    assert_eq!(reader.table("items"), writer.table("items"));

    exec(&mut writer, "ALTER TABLE items ADD COLUMN label VARCHAR(5) DEFAULT 'new'");
    reader.refresh().unwrap();
    assert_eq!(reader.table("items"), writer.table("items"));

    let late = file_client(&path, tenant_scope(30));
    assert_eq!(late.table("items"), writer.table("items"));
}

#[test]
fn test_reset_clears_principal_tables() {
    let (_dir, path) = shared_db();
    let mut client = file_client(&path, tenant_scope(10));
    exec(&mut client, "CREATE TABLE notes (body VARCHAR(20))");
    exec(&mut client, "INSERT INTO notes VALUES ('a')");

    client.reset().unwrap();
    assert!(client.tables().is_empty());

    exec(&mut client, "CREATE TABLE notes (body VARCHAR(20))");
    assert_eq!(query(&client, "SELECT COUNT(*) FROM notes").scalar(), Some(&SqlValue::Int(0)));
}

#[test]
fn test_principals_sharing_a_table_name_stay_apart() {
    let (_dir, path) = shared_db();
    let mut first = file_client(&path, AccessScope::tenant(TenantId::new(1)));
    let mut second = file_client(&path, AccessScope::tenant(TenantId::new(2)));
    exec(&mut first, "CREATE TABLE notes (body VARCHAR(20))");
    exec(&mut second, "CREATE TABLE notes (body VARCHAR(20))");
    exec(&mut first, "INSERT INTO notes VALUES ('mine')");
    exec(&mut second, "INSERT INTO notes VALUES ('theirs')");

    let admin = file_client(&path, AccessScope::admin(TenantId::new(1)));
    assert_eq!(query(&admin, "SELECT body FROM notes").rows, vec![vec![text("mine")]]);

    exec(&mut first, "ALTER TABLE notes RENAME COLUMN body TO content");
    exec(&mut first, "ALTER TABLE notes ADD COLUMN extra INT DEFAULT 7");
    exec(&mut first, "ALTER TABLE notes RENAME TO gone");
    assert_eq!(
        query(&first, "SELECT content, extra FROM gone").rows,
        vec![vec![text("mine"), SqlValue::Int(7)]]
    );
    assert_eq!(query(&second, "SELECT body FROM notes").rows, vec![vec![text("theirs")]]);

    first.reset().unwrap();
    assert_eq!(query(&second, "SELECT body FROM notes").rows, vec![vec![text("theirs")]]);
    exec(&mut first, "CREATE TABLE notes (body VARCHAR(20))");
    assert_eq!(query(&first, "SELECT COUNT(*) FROM notes").scalar(), Some(&SqlValue::Int(0)));
}
