//! Shared helpers for jtable-core integration tests.
#![allow(dead_code)]

use std::path::Path;

use jtable_commons::{SqlValue, TenantId};
use jtable_core::{AccessScope, ExecutionResult, JsonTableClient, RowSet, SqliteEngine};

pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .is_test(true)
        .try_init();
}

/// Client over a private in-memory database where principal and tenant
/// are both `id`.
pub fn memory_client(id: i64) -> JsonTableClient {
    init_logging();
    let engine = SqliteEngine::open_in_memory().expect("open in-memory SQLite");
    JsonTableClient::connect(Box::new(engine), AccessScope::tenant(TenantId::new(id)))
        .expect("connect client")
}

/// Client over a shared database file.
pub fn file_client(path: &Path, scope: AccessScope) -> JsonTableClient {
    init_logging();
    let engine = SqliteEngine::open(path).expect("open SQLite file");
    JsonTableClient::connect(Box::new(engine), scope).expect("connect client")
}

pub fn exec(client: &mut JsonTableClient, sql: &str) -> ExecutionResult {
    client
        .execute(sql)
        .unwrap_or_else(|e| panic!("'{}' failed: {}", sql, e))
}

pub fn query(client: &JsonTableClient, sql: &str) -> RowSet {
    client
        .query(sql)
        .unwrap_or_else(|e| panic!("'{}' failed: {}", sql, e))
}

pub fn text(s: &str) -> SqlValue {
    SqlValue::Text(s.to_string())
}
