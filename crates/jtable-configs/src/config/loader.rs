use super::types::{EngineKind, JsonTableConfig};
use std::fs;
use std::path::Path;

impl JsonTableConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: JsonTableConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration settings
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.engine.kind == EngineKind::Sqlite && self.engine.path.trim().is_empty() {
            return Err(anyhow::anyhow!("SQLite engine path cannot be empty"));
        }

        if self.access.principal_id < 0 {
            return Err(anyhow::anyhow!(
                "Principal id must be non-negative, got {}",
                self.access.principal_id
            ));
        }

        if let Some(tenant_id) = self.access.tenant_id {
            if self.access.admin {
                return Err(anyhow::anyhow!(
                    "Admin mode spans all tenants; remove tenant_id = {} or set admin = false",
                    tenant_id
                ));
            }
            if tenant_id < 0 {
                return Err(anyhow::anyhow!("Tenant id must be non-negative, got {}", tenant_id));
            }
        }

        Ok(())
    }

    /// Row owner for this configuration; `None` in admin mode.
    pub fn effective_tenant_id(&self) -> Option<i64> {
        if self.access.admin {
            None
        } else {
            Some(self.access.tenant_id.unwrap_or(self.access.principal_id))
        }
    }
}
