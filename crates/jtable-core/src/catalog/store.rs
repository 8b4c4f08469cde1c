use std::collections::BTreeMap;

use jtable_commons::constants::meta_columns as mc;
use jtable_commons::{ColumnMeta, SqlValue, TableName, TenantId, VirtualTable, META_TABLE_NAME};

use super::MetaCache;
use crate::engine::{EngineError, PhysicalDialect, ScopedTransaction};
use crate::error::{JsonTableError, Result};

/// Reads and mutates one principal's rows of `_meta_json_t`.
///
/// Every mutation validates against, and then updates, the caller's working
/// copy of the table so several ALTER actions can be chained inside one
/// transaction.
#[derive(Debug, Clone, Copy)]
pub struct CatalogStore {
    principal: TenantId,
}

impl CatalogStore {
    pub fn new(principal: TenantId) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> TenantId {
        self.principal
    }

    /// Create the physical tables if they are missing.
    pub fn bootstrap(txn: &mut ScopedTransaction<'_>, dialect: PhysicalDialect) -> Result<()> {
        for ddl in dialect.bootstrap_statements() {
            txn.execute(&ddl, &[])?;
        }
        log::info!("Physical catalog/data tables ready ({:?})", dialect);
        Ok(())
    }

    /// Reflect every virtual table of the principal.
    pub fn load(&self, txn: &mut ScopedTransaction<'_>) -> Result<MetaCache> {
        let sql = format!(
            "SELECT {}, {}, {}, {}, {}, {}, {} FROM {} WHERE {} = ? ORDER BY {}, {}",
            mc::TABLE_NAME,
            mc::COLUMN_ID,
            mc::COLUMN_NAME,
            mc::COLUMN_TYPE,
            mc::NULLABLE,
            mc::HAS_DEFAULT,
            mc::DEFAULT,
            META_TABLE_NAME,
            mc::USER_ID,
            mc::TABLE_NAME,
            mc::COLUMN_ID,
        );
        let rows = txn.query(&sql, &[self.principal_param()])?;

        let mut tables: BTreeMap<String, Vec<ColumnMeta>> = BTreeMap::new();
        for row in rows {
            let [table, id, name, type_spec, nullable, has_default, default] = row.as_slice() else {
                return Err(catalog_row_error("expected 7 columns"));
            };
            let has_default = cell_bool(has_default)?;
            let default_expr = match default {
                SqlValue::Null => None,
                payload => ColumnMeta::default_from_payload(&cell_text(payload)?),
            };
            tables.entry(cell_text(table)?).or_default().push(ColumnMeta {
                column_id: cell_i64(id)?,
                name: cell_text(name)?,
                type_spec: cell_text(type_spec)?,
                nullable: cell_bool(nullable)?,
                has_default,
                default_expr: if has_default { default_expr } else { None },
            });
        }

        log::debug!(
            "Loaded {} virtual table(s) for principal {}",
            tables.len(),
            self.principal
        );
        Ok(MetaCache::from_tables(
            tables
                .into_iter()
                .map(|(name, columns)| VirtualTable::with_columns(TableName::new(name), columns)),
        ))
    }

    /// Register a new table, assigning ids from the first user column id in
    /// declaration order.
    pub fn create_table(
        &self,
        txn: &mut ScopedTransaction<'_>,
        cache: &MetaCache,
        name: &TableName,
        columns: Vec<ColumnMeta>,
    ) -> Result<VirtualTable> {
        if name.is_reserved() || cache.contains(name) {
            return Err(JsonTableError::DuplicateTable(name.to_string()));
        }

        let mut table = VirtualTable::new(name.clone());
        for mut column in columns {
            if table.contains_column(&column.name) {
                return Err(JsonTableError::duplicate_column(name.as_str(), column.name));
            }
            column.column_id = table.next_column_id();
            self.insert_column(txn, name, &column)?;
            table.push_column(column);
        }

        log::debug!("Registered table '{}' with {} column(s)", name, table.columns().len());
        Ok(table)
    }

    /// Append a column with id `max + 1`.
    pub fn add_column(
        &self,
        txn: &mut ScopedTransaction<'_>,
        table: &mut VirtualTable,
        mut column: ColumnMeta,
    ) -> Result<ColumnMeta> {
        if table.contains_column(&column.name) {
            return Err(JsonTableError::duplicate_column(table.name().as_str(), column.name));
        }
        column.column_id = table.next_column_id();
        self.insert_column(txn, table.name(), &column)?;
        table.push_column(column.clone());
        Ok(column)
    }

    pub fn drop_column(
        &self,
        txn: &mut ScopedTransaction<'_>,
        table: &mut VirtualTable,
        column_name: &str,
    ) -> Result<ColumnMeta> {
        let existing = table
            .column(column_name)
            .ok_or_else(|| JsonTableError::unknown_column(table.name().as_str(), column_name))?;
        if table.columns().len() == 1 {
            return Err(JsonTableError::InvalidSql(format!(
                "Cannot drop '{}', the only column of '{}'",
                column_name,
                table.name()
            )));
        }

        let sql = format!(
            "DELETE FROM {} WHERE {} = ? AND {} = ? AND {} = ?",
            META_TABLE_NAME,
            mc::USER_ID,
            mc::TABLE_NAME,
            mc::COLUMN_ID
        );
        txn.execute(
            &sql,
            &[
                self.principal_param(),
                table_param(table.name()),
                SqlValue::Int(existing.column_id),
            ],
        )?;

        table
            .remove_column(column_name)
            .ok_or_else(|| JsonTableError::unknown_column(table.name().as_str(), column_name))
    }

    /// Replace type and constraints of `column.name`, keeping its id.
    pub fn modify_column(
        &self,
        txn: &mut ScopedTransaction<'_>,
        table: &mut VirtualTable,
        column: ColumnMeta,
    ) -> Result<ColumnMeta> {
        let old_name = column.name.clone();
        self.rename_column(txn, table, &old_name, column)
    }

    /// Replace `old_name` by `column`, keeping the catalog id so iteration
    /// order is preserved.
    pub fn rename_column(
        &self,
        txn: &mut ScopedTransaction<'_>,
        table: &mut VirtualTable,
        old_name: &str,
        mut column: ColumnMeta,
    ) -> Result<ColumnMeta> {
        let table_name = table.name().clone();
        let existing_id = table
            .column(old_name)
            .map(|c| c.column_id)
            .ok_or_else(|| JsonTableError::unknown_column(table_name.as_str(), old_name))?;
        if column.name != old_name && table.contains_column(&column.name) {
            return Err(JsonTableError::duplicate_column(table_name.as_str(), column.name));
        }
        column.column_id = existing_id;

        let sql = format!(
            "UPDATE {} SET {} = ?, {} = ?, {} = ?, {} = ?, {} = ? WHERE {} = ? AND {} = ? AND {} = ?",
            META_TABLE_NAME,
            mc::COLUMN_NAME,
            mc::COLUMN_TYPE,
            mc::NULLABLE,
            mc::HAS_DEFAULT,
            mc::DEFAULT,
            mc::USER_ID,
            mc::TABLE_NAME,
            mc::COLUMN_ID
        );
        txn.execute(
            &sql,
            &[
                SqlValue::Text(column.name.clone()),
                SqlValue::Text(column.type_spec.clone()),
                SqlValue::Bool(column.nullable),
                SqlValue::Bool(column.has_default),
                SqlValue::Text(column.default_payload()),
                self.principal_param(),
                table_param(&table_name),
                SqlValue::Int(existing_id),
            ],
        )?;

        if let Some(slot) = table.column_mut(old_name) {
            *slot = column.clone();
        }
        Ok(column)
    }

    /// Relabel every catalog row of the table.
    pub fn rename_table(
        &self,
        txn: &mut ScopedTransaction<'_>,
        cache: &MetaCache,
        table: &mut VirtualTable,
        new_name: &TableName,
    ) -> Result<()> {
        if new_name.is_reserved() || cache.contains(new_name) || new_name == table.name() {
            return Err(JsonTableError::DuplicateTable(new_name.to_string()));
        }

        let sql = format!(
            "UPDATE {} SET {} = ? WHERE {} = ? AND {} = ?",
            META_TABLE_NAME,
            mc::TABLE_NAME,
            mc::USER_ID,
            mc::TABLE_NAME
        );
        txn.execute(
            &sql,
            &[
                table_param(new_name),
                self.principal_param(),
                table_param(table.name()),
            ],
        )?;

        table.set_name(new_name.clone());
        Ok(())
    }

    /// Delete every catalog row of the principal.
    pub fn clear(&self, txn: &mut ScopedTransaction<'_>) -> Result<u64> {
        let sql = format!("DELETE FROM {} WHERE {} = ?", META_TABLE_NAME, mc::USER_ID);
        Ok(txn.execute(&sql, &[self.principal_param()])?)
    }

    fn insert_column(
        &self,
        txn: &mut ScopedTransaction<'_>,
        table: &TableName,
        column: &ColumnMeta,
    ) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            META_TABLE_NAME,
            mc::USER_ID,
            mc::TABLE_NAME,
            mc::COLUMN_ID,
            mc::COLUMN_NAME,
            mc::COLUMN_TYPE,
            mc::NULLABLE,
            mc::HAS_DEFAULT,
            mc::DEFAULT
        );
        txn.execute(
            &sql,
            &[
                self.principal_param(),
                table_param(table),
                SqlValue::Int(column.column_id),
                SqlValue::Text(column.name.clone()),
                SqlValue::Text(column.type_spec.clone()),
                SqlValue::Bool(column.nullable),
                SqlValue::Bool(column.has_default),
                SqlValue::Text(column.default_payload()),
            ],
        )?;
        Ok(())
    }

    fn principal_param(&self) -> SqlValue {
        SqlValue::Int(self.principal.as_i64())
    }
}

fn table_param(name: &TableName) -> SqlValue {
    SqlValue::Text(name.as_str().to_string())
}

fn catalog_row_error(detail: &str) -> JsonTableError {
    JsonTableError::Engine(EngineError::Backend(format!(
        "Malformed {} row: {}",
        META_TABLE_NAME, detail
    )))
}

fn cell_text(value: &SqlValue) -> Result<String> {
    match value {
        SqlValue::Text(s) => Ok(s.clone()),
        other => Err(catalog_row_error(&format!("expected text, found {}", other))),
    }
}

fn cell_i64(value: &SqlValue) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| catalog_row_error(&format!("expected integer, found {}", value)))
}

fn cell_bool(value: &SqlValue) -> Result<bool> {
    cell_i64(value).map(|v| v != 0)
}
