//! Tenant/Admin Access Layer
//!
//! A client acts for a principal, which keys the catalog and owns every data
//! row written through it, and optionally for a tenant, which owns rows
//! inside the principal. Without a tenant the client is in admin mode: reads
//! see every tenant's rows of the principal and writes must name a tenant per
//! call.

use jtable_commons::constants::data_columns;
use jtable_commons::{SqlValue, TableName, TenantId};
use jtable_configs::JsonTableConfig;

use crate::error::{JsonTableError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessScope {
    principal: TenantId,
    tenant: Option<TenantId>,
}

impl AccessScope {
    /// Principal and row owner are the same identity.
    pub fn tenant(id: TenantId) -> Self {
        Self {
            principal: id,
            tenant: Some(id),
        }
    }

    /// Rows owned by `tenant` inside `principal`'s catalog.
    pub fn new(principal: TenantId, tenant: TenantId) -> Self {
        Self {
            principal,
            tenant: Some(tenant),
        }
    }

    /// Multi-tenant mode over `principal`'s catalog.
    pub fn admin(principal: TenantId) -> Self {
        Self {
            principal,
            tenant: None,
        }
    }

    pub fn from_config(config: &JsonTableConfig) -> Self {
        let principal = TenantId::new(config.access.principal_id);
        match config.effective_tenant_id() {
            Some(tenant) => Self::new(principal, TenantId::new(tenant)),
            None => Self::admin(principal),
        }
    }

    pub fn principal(&self) -> TenantId {
        self.principal
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant
    }

    pub fn is_admin(&self) -> bool {
        self.tenant.is_none()
    }

    /// Row filter for reads; a per-call tenant narrows an admin client.
    pub fn read_filter(&self, table: &TableName, override_tenant: Option<TenantId>) -> RowFilter {
        RowFilter {
            principal: self.principal,
            tenant: override_tenant.or(self.tenant),
            table: table.clone(),
        }
    }

    /// Row filter for writes; admin clients must name a tenant.
    pub fn write_filter(
        &self,
        table: &TableName,
        override_tenant: Option<TenantId>,
        operation: &str,
    ) -> Result<RowFilter> {
        let tenant = self.write_tenant(override_tenant, operation)?;
        Ok(RowFilter {
            principal: self.principal,
            tenant: Some(tenant),
            table: table.clone(),
        })
    }

    /// Owner stamped on rows written by this call.
    pub fn write_tenant(&self, override_tenant: Option<TenantId>, operation: &str) -> Result<TenantId> {
        override_tenant
            .or(self.tenant)
            .ok_or_else(|| JsonTableError::TenantRequired(operation.to_string()))
    }
}

/// `owner_id = ? AND user_id = ? AND jtable_name = ?` predicate scoping one
/// virtual table; admin reads drop the `user_id` term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFilter {
    principal: TenantId,
    tenant: Option<TenantId>,
    table: TableName,
}

impl RowFilter {
    pub fn principal(&self) -> TenantId {
        self.principal
    }

    pub fn tenant(&self) -> Option<TenantId> {
        self.tenant
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// Predicate text with positional placeholders.
    pub fn predicate(&self) -> String {
        match self.tenant {
            Some(_) => format!(
                "{} = ? AND {} = ? AND {} = ?",
                data_columns::OWNER_ID,
                data_columns::USER_ID,
                data_columns::TABLE_NAME
            ),
            None => format!(
                "{} = ? AND {} = ?",
                data_columns::OWNER_ID,
                data_columns::TABLE_NAME
            ),
        }
    }

    /// Parameters for [`predicate`](Self::predicate), in order.
    pub fn params(&self) -> Vec<SqlValue> {
        let mut params = vec![SqlValue::Int(self.principal.as_i64())];
        if let Some(tenant) = self.tenant {
            params.push(SqlValue::Int(tenant.as_i64()));
        }
        params.push(SqlValue::Text(self.table.as_str().to_string()));
        params
    }
}
