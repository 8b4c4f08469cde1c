//! SQLite adapter built on `rusqlite` (bundled SQLite with JSON1).

use std::path::Path;
use std::time::Duration;

use jtable_commons::SqlValue;
use jtable_configs::defaults::default_busy_timeout_ms;
use jtable_configs::EngineSettings;
use parking_lot::{Mutex, MutexGuard};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use super::{EngineError, EngineTransaction, PhysicalDialect, RowSet, SqlEngine};

const IN_MEMORY_PATH: &str = ":memory:";

/// Single-connection SQLite engine.
///
/// Transactions serialize on the connection mutex, which matches SQLite's
/// single-writer model.
pub struct SqliteEngine {
    conn: Mutex<Connection>,
}

impl SqliteEngine {
    pub fn open_in_memory() -> Result<Self, EngineError> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_millis(default_busy_timeout_ms()))?;
        Ok(Self::from_connection(conn))
    }

    /// Open the database described by the `[engine]` config section.
    pub fn from_settings(settings: &EngineSettings) -> Result<Self, EngineError> {
        let conn = if settings.path == IN_MEMORY_PATH {
            Connection::open_in_memory()?
        } else {
            Connection::open(&settings.path)?
        };
        conn.busy_timeout(Duration::from_millis(settings.busy_timeout_ms))?;
        log::info!("Opened SQLite engine at {}", settings.path);
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl SqlEngine for SqliteEngine {
    fn dialect(&self) -> PhysicalDialect {
        PhysicalDialect::Sqlite
    }

    fn begin(&self) -> Result<Box<dyn EngineTransaction + '_>, EngineError> {
        let conn = self.conn.lock();
        conn.execute_batch("BEGIN")?;
        Ok(Box::new(SqliteTransaction {
            conn,
            finished: false,
        }))
    }
}

struct SqliteTransaction<'a> {
    conn: MutexGuard<'a, Connection>,
    finished: bool,
}

impl SqliteTransaction<'_> {
    /// A failed COMMIT leaves the transaction open; `finished` stays unset
    /// so drop rolls it back.
    fn finish(&mut self, sql: &str) -> Result<(), EngineError> {
        self.conn.execute_batch(sql)?;
        self.finished = true;
        Ok(())
    }
}

impl EngineTransaction for SqliteTransaction<'_> {
    fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<RowSet, EngineError> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let column_count = columns.len();

        let values = to_sqlite_values(params);
        let mut rows = stmt.query(params_from_iter(values.iter()))?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                let value: Value = row.get(idx)?;
                record.push(from_sqlite_value(value));
            }
            out.push(record);
        }

        Ok(RowSet::new(columns, out))
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, EngineError> {
        let values = to_sqlite_values(params);
        let changed = self.conn.execute(sql, params_from_iter(values.iter()))?;
        Ok(changed as u64)
    }

    fn commit(mut self: Box<Self>) -> Result<(), EngineError> {
        self.finish("COMMIT")
    }

    fn rollback(mut self: Box<Self>) -> Result<(), EngineError> {
        self.finish("ROLLBACK")
    }
}

impl Drop for SqliteTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished && !self.conn.is_autocommit() {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                log::warn!("SQLite rollback on drop failed: {}", e);
            }
        }
    }
}

fn to_sqlite_values(params: &[SqlValue]) -> Vec<Value> {
    params
        .iter()
        .map(|param| match param {
            SqlValue::Null => Value::Null,
            SqlValue::Bool(b) => Value::Integer(i64::from(*b)),
            SqlValue::Int(i) => Value::Integer(*i),
            SqlValue::Float(f) => Value::Real(*f),
            SqlValue::Text(s) => Value::Text(s.clone()),
        })
        .collect()
}

fn from_sqlite_value(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Int(i),
        Value::Real(f) => SqlValue::Float(f),
        Value::Text(s) => SqlValue::Text(s),
        Value::Blob(bytes) => SqlValue::Text(String::from_utf8_lossy(&bytes).into_owned()),
    }
}
