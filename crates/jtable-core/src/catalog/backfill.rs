use jtable_commons::constants::data_columns as dc;
use jtable_commons::{ColumnMeta, SqlValue, TableName, TenantId, DATA_TABLE_NAME};
use serde_json::{Map, Value};

use crate::engine::{EngineError, PhysicalDialect, ScopedTransaction};
use crate::error::{JsonTableError, Result};
use crate::types::{CanonicalValue, TypeDescriptor};

/// Payload rewrites that keep stored rows in step with catalog changes.
///
/// A backfill touches every row of one principal's table, whichever tenant
/// owns it. Rows of a same-named table under another principal are never
/// read or written.
#[derive(Debug, Clone, Copy)]
pub struct DataBackfill {
    dialect: PhysicalDialect,
    owner: TenantId,
}

impl DataBackfill {
    pub fn new(dialect: PhysicalDialect, owner: TenantId) -> Self {
        Self { dialect, owner }
    }

    pub fn owner(&self) -> TenantId {
        self.owner
    }

    /// Set `column` to `value` in every row.
    pub fn add_key(
        &self,
        txn: &mut ScopedTransaction<'_>,
        table: &TableName,
        column: &str,
        value: &CanonicalValue,
    ) -> Result<u64> {
        let assignment = self
            .dialect
            .json_set(&[(column.to_string(), self.dialect.json_param().to_string())]);
        let sql = format!(
            "UPDATE {} SET {} = {} WHERE {}",
            DATA_TABLE_NAME,
            dc::PAYLOAD,
            assignment,
            table_predicate()
        );
        let [owner, name] = self.table_params(table);
        let changed = txn.execute(&sql, &[value.to_json_param(), owner, name])?;
        log::debug!("Backfilled '{}' into {} row(s) of '{}'", column, changed, table);
        Ok(changed)
    }

    /// Remove `column` from every row.
    pub fn remove_key(
        &self,
        txn: &mut ScopedTransaction<'_>,
        table: &TableName,
        column: &str,
    ) -> Result<u64> {
        let sql = format!(
            "UPDATE {} SET {} = {} WHERE {}",
            DATA_TABLE_NAME,
            dc::PAYLOAD,
            self.dialect.json_remove(column),
            table_predicate()
        );
        let changed = txn.execute(&sql, &self.table_params(table))?;
        log::debug!("Removed '{}' from {} row(s) of '{}'", column, changed, table);
        Ok(changed)
    }

    /// Re-validate `old_name` under `column`'s new type and store it as
    /// `column.name`.
    ///
    /// Absent or null values take `default`. A null result for a NOT NULL
    /// column aborts the whole backfill.
    pub fn recoerce(
        &self,
        txn: &mut ScopedTransaction<'_>,
        table: &TableName,
        old_name: &str,
        column: &ColumnMeta,
        ty: &TypeDescriptor,
        default: &CanonicalValue,
    ) -> Result<u64> {
        let changed = self.rewrite_payloads(txn, table, |payload| {
            let existing = payload.remove(old_name).unwrap_or(Value::Null);
            let value = match SqlValue::from_json(&existing) {
                SqlValue::Null => default.clone(),
                raw => ty
                    .validate(&raw)
                    .map_err(|e| JsonTableError::from_value_error(&column.name, e))?,
            };
            if value.is_null() && !column.nullable {
                return Err(JsonTableError::TypeValidation {
                    column: column.name.clone(),
                    reason: "existing row has no value for a NOT NULL column".to_string(),
                });
            }
            payload.insert(column.name.clone(), value.to_json());
            Ok(())
        })?;
        log::debug!(
            "Re-coerced '{}' as '{}' {} in {} row(s) of '{}'",
            old_name,
            column.name,
            ty,
            changed,
            table
        );
        Ok(changed)
    }

    /// Move the value stored under `old_name` to `new_name`, unchanged.
    pub fn rename_key(
        &self,
        txn: &mut ScopedTransaction<'_>,
        table: &TableName,
        old_name: &str,
        new_name: &str,
    ) -> Result<u64> {
        self.rewrite_payloads(txn, table, |payload| {
            let value = payload.remove(old_name).unwrap_or(Value::Null);
            payload.insert(new_name.to_string(), value);
            Ok(())
        })
    }

    /// Point every row of `old_name` at `new_name`; payloads are untouched.
    pub fn relabel_table(
        &self,
        txn: &mut ScopedTransaction<'_>,
        old_name: &TableName,
        new_name: &TableName,
    ) -> Result<u64> {
        let sql = format!(
            "UPDATE {} SET {} = ? WHERE {}",
            DATA_TABLE_NAME,
            dc::TABLE_NAME,
            table_predicate()
        );
        let [owner, name] = self.table_params(old_name);
        Ok(txn.execute(&sql, &[table_param(new_name), owner, name])?)
    }

    /// Delete every row of the owner, in any table.
    pub fn purge(&self, txn: &mut ScopedTransaction<'_>) -> Result<u64> {
        let sql = format!("DELETE FROM {} WHERE {} = ?", DATA_TABLE_NAME, dc::OWNER_ID);
        Ok(txn.execute(&sql, &[SqlValue::Int(self.owner.as_i64())])?)
    }

    /// Read-modify-write every payload of `table` in row id order.
    fn rewrite_payloads<F>(&self, txn: &mut ScopedTransaction<'_>, table: &TableName, mut edit: F) -> Result<u64>
    where
        F: FnMut(&mut Map<String, Value>) -> Result<()>,
    {
        let select = format!(
            "SELECT {}, {} FROM {} WHERE {} ORDER BY {}",
            dc::ROW_ID,
            dc::PAYLOAD,
            DATA_TABLE_NAME,
            table_predicate(),
            dc::ROW_ID
        );

        let rows = txn.query(&select, &self.table_params(table))?;
        let mut changed = 0;
        for row in rows {
            let [row_id, payload] = row.as_slice() else {
                return Err(malformed("expected row id and payload"));
            };
            let row_id = row_id
                .as_i64()
                .ok_or_else(|| malformed("row id is not an integer"))?;

            let mut document = parse_payload(payload)?;
            edit(&mut document)?;
            changed += write_payload(txn, row_id, document)?;
        }
        Ok(changed)
    }

    fn table_params(&self, table: &TableName) -> [SqlValue; 2] {
        [SqlValue::Int(self.owner.as_i64()), table_param(table)]
    }
}

/// `owner_id = ? AND jtable_name = ?`
fn table_predicate() -> String {
    format!("{} = ? AND {} = ?", dc::OWNER_ID, dc::TABLE_NAME)
}

/// JSON object stored in a `jdata` cell.
pub(crate) fn parse_payload(payload: &SqlValue) -> Result<Map<String, Value>> {
    match payload {
        SqlValue::Text(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => Err(malformed("payload is not a JSON object")),
        },
        SqlValue::Null => Ok(Map::new()),
        _ => Err(malformed("payload is not JSON text")),
    }
}

/// Replace the payload of one row by id.
pub(crate) fn write_payload(
    txn: &mut ScopedTransaction<'_>,
    row_id: i64,
    document: Map<String, Value>,
) -> Result<u64> {
    let update = format!(
        "UPDATE {} SET {} = ? WHERE {} = ?",
        DATA_TABLE_NAME,
        dc::PAYLOAD,
        dc::ROW_ID
    );
    let text = Value::Object(document).to_string();
    Ok(txn.execute(&update, &[SqlValue::Text(text), SqlValue::Int(row_id)])?)
}

fn table_param(name: &TableName) -> SqlValue {
    SqlValue::Text(name.as_str().to_string())
}

pub(crate) fn malformed(detail: &str) -> JsonTableError {
    JsonTableError::Engine(EngineError::Backend(format!(
        "Malformed {} row: {}",
        DATA_TABLE_NAME, detail
    )))
}
