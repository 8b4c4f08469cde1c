use serde::{Deserialize, Serialize};

use super::defaults::*;

/// Top-level configuration of a JSON table client.
///
/// Every section is optional in the TOML file:
///
/// ```toml
/// [engine]
/// kind = "sqlite"
/// path = "./jtable.db"
///
/// [access]
/// principal_id = 1
/// tenant_id = 7
///
/// [query]
/// expose_row_id = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JsonTableConfig {
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub access: AccessSettings,
    #[serde(default)]
    pub query: QuerySettings,
}

/// Flavour of the underlying SQL engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Sqlite,
    Mysql,
}

/// Underlying engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "default_engine_kind")]
    pub kind: EngineKind,
    /// SQLite database file, `:memory:` for an in-process database
    #[serde(default = "default_sqlite_path")]
    pub path: String,
    /// How long SQLite waits on a locked database before failing
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            kind: default_engine_kind(),
            path: default_sqlite_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// Catalog settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Create `_meta_json_t` / `_data_json_t` when they are missing
    #[serde(default = "default_true")]
    pub auto_bootstrap: bool,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            auto_bootstrap: default_true(),
        }
    }
}

/// Identity the client acts as.
///
/// The principal keys the catalog. Rows belong to `tenant_id`, which falls
/// back to the principal. With `admin = true` no tenant is fixed: reads span
/// every tenant and writes must name one per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessSettings {
    #[serde(default = "default_principal_id")]
    pub principal_id: i64,
    #[serde(default)]
    pub tenant_id: Option<i64>,
    #[serde(default)]
    pub admin: bool,
}

impl Default for AccessSettings {
    fn default() -> Self {
        Self {
            principal_id: default_principal_id(),
            tenant_id: None,
            admin: false,
        }
    }
}

/// Query settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuerySettings {
    /// Prepend the surrogate row id to every SELECT projection
    #[serde(default)]
    pub expose_row_id: bool,
}
