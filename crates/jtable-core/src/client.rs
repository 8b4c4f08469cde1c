//! `JsonTableClient`: the entry point callers hand SQL text to.
//!
//! Every public operation runs in its own [`ScopedTransaction`]. DDL works
//! on a copy of the cached table and only replaces the cache after the
//! transaction committed, so a failed statement leaves both the catalog and
//! the snapshot as they were.

use jtable_commons::{ColumnMeta, TableName, TenantId, VirtualTable};
use jtable_configs::{EngineKind, JsonTableConfig};
use jtable_sql::{
    AlterOperation, AlterTableStatement, ColumnDefinition, CreateTableStatement, SqlStatement,
    SqlStatementKind,
};

use crate::access::AccessScope;
use crate::catalog::{CatalogStore, DataBackfill, MetaCache};
use crate::defaults;
use crate::engine::{PhysicalDialect, RowSet, ScopedTransaction, SqlEngine, SqliteEngine};
use crate::error::{JsonTableError, Result};
use crate::rewrite::{PhysicalStatement, Rewriter};
use crate::types::{CanonicalValue, TypeDescriptor};

/// Outcome of [`JsonTableClient::execute`].
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// DDL completed; carries a short description
    Success(String),
    /// INSERT/UPDATE/DELETE row count
    RowsAffected(u64),
    /// SELECT result in projection order
    Rows(RowSet),
}

/// Per-call options of [`JsonTableClient::query_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Prepend the surrogate `jdata_id` column
    pub expose_row_id: bool,
    /// Narrow an admin client's read to one tenant
    pub tenant: Option<TenantId>,
}

/// Client construction switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// Create the physical tables when they are missing
    pub auto_bootstrap: bool,
    /// Default for [`QueryOptions::expose_row_id`] on [`JsonTableClient::query`]
    pub expose_row_id: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            auto_bootstrap: true,
            expose_row_id: false,
        }
    }
}

pub struct JsonTableClient {
    engine: Box<dyn SqlEngine>,
    dialect: PhysicalDialect,
    scope: AccessScope,
    options: ClientOptions,
    cache: MetaCache,
}

impl JsonTableClient {
    /// Connect with default options: bootstrap the physical tables and load
    /// the principal's catalog.
    pub fn connect(engine: Box<dyn SqlEngine>, scope: AccessScope) -> Result<Self> {
        Self::connect_with(engine, scope, ClientOptions::default())
    }

    pub fn connect_with(
        engine: Box<dyn SqlEngine>,
        scope: AccessScope,
        options: ClientOptions,
    ) -> Result<Self> {
        let dialect = engine.dialect();
        let mut client = Self {
            engine,
            dialect,
            scope,
            options,
            cache: MetaCache::new(),
        };

        if options.auto_bootstrap {
            let mut txn = ScopedTransaction::begin(client.engine.as_ref(), "bootstrap")?;
            CatalogStore::bootstrap(&mut txn, dialect)?;
            txn.commit()?;
        }
        client.refresh()?;

        log::info!(
            "JSON table client ready: principal={}, tenant={}, {} table(s)",
            scope.principal(),
            scope
                .tenant_id()
                .map_or_else(|| "<admin>".to_string(), |t| t.to_string()),
            client.cache.len()
        );
        Ok(client)
    }

    /// Build a client from configuration, opening the bundled SQLite engine.
    pub fn from_config(config: &JsonTableConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let engine: Box<dyn SqlEngine> = match config.engine.kind {
            EngineKind::Sqlite => Box::new(
                SqliteEngine::from_settings(&config.engine)
                    .map_err(|e| anyhow::anyhow!("Failed to open SQLite engine: {}", e))?,
            ),
            EngineKind::Mysql => {
                return Err(anyhow::anyhow!(
                    "No built-in MySQL engine; use JsonTableClient::connect with a SqlEngine implementation"
                ))
            },
        };
        let options = ClientOptions {
            auto_bootstrap: config.catalog.auto_bootstrap,
            expose_row_id: config.query.expose_row_id,
        };
        Self::connect_with(engine, AccessScope::from_config(config), options)
            .map_err(|e| anyhow::anyhow!("Failed to connect JSON table client: {}", e))
    }

    pub fn scope(&self) -> AccessScope {
        self.scope
    }

    pub fn dialect(&self) -> PhysicalDialect {
        self.dialect
    }

    pub fn tables(&self) -> Vec<&TableName> {
        self.cache.table_names()
    }

    pub fn table(&self, name: &str) -> Option<&VirtualTable> {
        self.cache.get(&TableName::new(name))
    }

    /// Replace the catalog snapshot with what is committed now.
    pub fn refresh(&mut self) -> Result<()> {
        let store = self.store();
        let mut txn = ScopedTransaction::begin(self.engine.as_ref(), "refresh")?;
        let cache = store.load(&mut txn)?;
        txn.commit()?;
        self.cache = cache;
        Ok(())
    }

    /// Delete every catalog entry and data row of the principal.
    pub fn reset(&mut self) -> Result<()> {
        let store = self.store();
        let mut txn = ScopedTransaction::begin(self.engine.as_ref(), "reset")?;
        let rows = self.backfill().purge(&mut txn)?;
        let removed = store.clear(&mut txn)?;
        txn.commit()?;
        log::debug!(
            "Reset principal {}: removed {} catalog row(s) and {} data row(s)",
            store.principal(),
            removed,
            rows
        );
        self.cache = MetaCache::new();
        Ok(())
    }

    /// Run any supported statement.
    pub fn execute(&mut self, sql: &str) -> Result<ExecutionResult> {
        self.execute_inner(sql, None)
    }

    /// Run a statement for an explicit tenant; admin clients need this for
    /// writes.
    pub fn execute_as(&mut self, sql: &str, tenant: TenantId) -> Result<ExecutionResult> {
        self.execute_inner(sql, Some(tenant))
    }

    /// Run a SELECT with the client's default options.
    pub fn query(&self, sql: &str) -> Result<RowSet> {
        self.query_with(
            sql,
            QueryOptions {
                expose_row_id: self.options.expose_row_id,
                tenant: None,
            },
        )
    }

    pub fn query_with(&self, sql: &str, options: QueryOptions) -> Result<RowSet> {
        let statement = SqlStatement::classify(sql)?;
        let SqlStatementKind::Select(query) = statement.kind() else {
            return Err(JsonTableError::UnsupportedStatement(format!(
                "{} is not a query",
                statement.name()
            )));
        };
        let physical = self
            .rewriter(options.tenant)
            .select(query, options.expose_row_id)?;
        self.run_query(&physical)
    }

    /// Physical form of a SELECT, UPDATE or DELETE without running it.
    pub fn translate(&self, sql: &str) -> Result<PhysicalStatement> {
        let statement = SqlStatement::classify(sql)?;
        let rewriter = self.rewriter(None);
        match statement.kind() {
            SqlStatementKind::Select(query) => rewriter.select(query, self.options.expose_row_id),
            SqlStatementKind::Update(update) => rewriter.update(update).map(|plan| plan.statement()),
            SqlStatementKind::Delete(delete) => rewriter.delete(delete),
            _ => Err(JsonTableError::UnsupportedStatement(format!(
                "translate {}",
                statement.name()
            ))),
        }
    }

    fn execute_inner(&mut self, sql: &str, tenant: Option<TenantId>) -> Result<ExecutionResult> {
        let statement = SqlStatement::classify(sql)?;
        let label = statement.name();
        log::debug!("Executing {} (tenant override: {:?})", label, tenant);

        match statement.into_kind() {
            SqlStatementKind::CreateTable(create) => self.create_table(create),
            SqlStatementKind::AlterTable(alter) => self.alter_table(alter),
            SqlStatementKind::Insert(insert) => {
                let plan = self.rewriter(tenant).insert(&insert)?;
                let mut txn = ScopedTransaction::begin(self.engine.as_ref(), label)?;
                let inserted = plan.execute(&mut txn)?;
                txn.commit()?;
                Ok(ExecutionResult::RowsAffected(inserted))
            },
            SqlStatementKind::Update(update) => {
                let plan = self.rewriter(tenant).update(&update)?;
                let mut txn = ScopedTransaction::begin(self.engine.as_ref(), label)?;
                let updated = plan.execute(&mut txn)?;
                txn.commit()?;
                Ok(ExecutionResult::RowsAffected(updated))
            },
            SqlStatementKind::Delete(delete) => {
                let physical = self.rewriter(tenant).delete(&delete)?;
                self.run_write(label, &physical)
            },
            SqlStatementKind::Select(query) => {
                let physical = self
                    .rewriter(tenant)
                    .select(&query, self.options.expose_row_id)?;
                self.run_query(&physical).map(ExecutionResult::Rows)
            },
        }
    }

    fn create_table(&mut self, create: CreateTableStatement) -> Result<ExecutionResult> {
        if create.if_not_exists && self.cache.contains(&create.table_name) {
            return Ok(ExecutionResult::Success(format!(
                "Table '{}' already exists",
                create.table_name
            )));
        }

        let store = self.store();
        let mut txn = ScopedTransaction::begin(self.engine.as_ref(), "CREATE TABLE")?;
        let mut columns = Vec::with_capacity(create.columns.len());
        for def in &create.columns {
            let prepared = prepare_column(&mut txn, def)?;
            columns.push(prepared.meta);
        }
        let table = store.create_table(&mut txn, &self.cache, &create.table_name, columns)?;
        txn.commit()?;
        self.refresh()?;

        log::debug!("Created table '{}' ({} columns)", table.name(), table.columns().len());
        Ok(ExecutionResult::Success(format!("Table '{}' created", table.name())))
    }

    fn alter_table(&mut self, alter: AlterTableStatement) -> Result<ExecutionResult> {
        let mut table = self.cache.require(&alter.table_name)?.clone();
        let store = self.store();
        let backfill = self.backfill();

        let mut txn = ScopedTransaction::begin(self.engine.as_ref(), "ALTER TABLE")?;
        for operation in &alter.operations {
            log::debug!("ALTER TABLE '{}': {}", table.name(), operation.label());
            match operation {
                AlterOperation::AddColumn(def) => {
                    let prepared = prepare_column(&mut txn, def)?;
                    let added = store.add_column(&mut txn, &mut table, prepared.meta)?;
                    let touched = backfill.add_key(&mut txn, table.name(), &added.name, &prepared.default)?;
                    if touched > 0 && prepared.default.is_null() && !added.nullable {
                        return Err(JsonTableError::invalid_default(
                            &added.name,
                            "existing rows need a default for a NOT NULL column",
                        ));
                    }
                },
                AlterOperation::DropColumn { column_name } => {
                    store.drop_column(&mut txn, &mut table, column_name)?;
                    backfill.remove_key(&mut txn, table.name(), column_name)?;
                },
                AlterOperation::ModifyColumn(def) => {
                    let prepared = prepare_column(&mut txn, def)?;
                    let column = store.modify_column(&mut txn, &mut table, prepared.meta)?;
                    backfill.recoerce(
                        &mut txn,
                        table.name(),
                        &def.name,
                        &column,
                        &prepared.ty,
                        &prepared.default,
                    )?;
                },
                AlterOperation::ChangeColumn { old_name, column } => {
                    let prepared = prepare_column(&mut txn, column)?;
                    let column = store.rename_column(&mut txn, &mut table, old_name, prepared.meta)?;
                    backfill.recoerce(
                        &mut txn,
                        table.name(),
                        old_name,
                        &column,
                        &prepared.ty,
                        &prepared.default,
                    )?;
                },
                AlterOperation::RenameColumn { old_name, new_name } => {
                    let mut column = table
                        .column(old_name)
                        .cloned()
                        .ok_or_else(|| JsonTableError::unknown_column(table.name().as_str(), old_name))?;
                    column.name = new_name.clone();
                    store.rename_column(&mut txn, &mut table, old_name, column)?;
                    backfill.rename_key(&mut txn, table.name(), old_name, new_name)?;
                },
                AlterOperation::RenameTable { new_name } => {
                    let old_name = table.name().clone();
                    store.rename_table(&mut txn, &self.cache, &mut table, new_name)?;
                    backfill.relabel_table(&mut txn, &old_name, new_name)?;
                },
            }
        }
        txn.commit()?;
        self.refresh()?;

        Ok(ExecutionResult::Success(format!(
            "Table '{}' altered ({} action(s))",
            table.name(),
            alter.operations.len()
        )))
    }

    fn run_write(&self, label: &'static str, physical: &PhysicalStatement) -> Result<ExecutionResult> {
        let mut txn = ScopedTransaction::begin(self.engine.as_ref(), label)?;
        let affected = txn.execute(&physical.sql, &physical.params)?;
        txn.commit()?;
        Ok(ExecutionResult::RowsAffected(affected))
    }

    fn run_query(&self, physical: &PhysicalStatement) -> Result<RowSet> {
        let mut txn = ScopedTransaction::begin(self.engine.as_ref(), "SELECT")?;
        let rows = txn.query(&physical.sql, &physical.params)?;
        txn.commit()?;
        Ok(rows)
    }

    fn rewriter(&self, tenant: Option<TenantId>) -> Rewriter<'_> {
        Rewriter::new(&self.cache, self.dialect, self.scope).with_tenant(tenant)
    }

    fn store(&self) -> CatalogStore {
        CatalogStore::new(self.scope.principal())
    }

    fn backfill(&self) -> DataBackfill {
        DataBackfill::new(self.dialect, self.scope.principal())
    }
}

/// A DDL column checked and ready for the catalog.
struct PreparedColumn {
    meta: ColumnMeta,
    ty: TypeDescriptor,
    default: CanonicalValue,
}

/// Validate type and default of a DDL column, evaluating the default once.
fn prepare_column(txn: &mut ScopedTransaction<'_>, def: &ColumnDefinition) -> Result<PreparedColumn> {
    let meta = def.to_column_meta(0);
    let ty = TypeDescriptor::parse(&meta.type_spec)
        .map_err(|e| JsonTableError::from_default_error(&meta.name, e))?;

    if meta.defaults_to_null_but_required() {
        return Err(JsonTableError::invalid_default(
            &meta.name,
            "a NOT NULL column cannot default to NULL",
        ));
    }

    let default = if meta.has_default {
        defaults::evaluate(txn, &meta.name, meta.default_expr.as_deref(), &ty)?
    } else {
        CanonicalValue::Null
    };
    if meta.has_default && default.is_null() && !meta.nullable {
        return Err(JsonTableError::invalid_default(
            &meta.name,
            "default evaluates to NULL for a NOT NULL column",
        ));
    }

    Ok(PreparedColumn { meta, ty, default })
}
