use super::types::EngineKind;

// Default value functions
pub fn default_engine_kind() -> EngineKind {
    EngineKind::Sqlite
}

pub fn default_sqlite_path() -> String {
    ":memory:".to_string() // In-process database, nothing written to disk
}

pub fn default_true() -> bool {
    true
}

pub fn default_principal_id() -> i64 {
    0
}

pub fn default_busy_timeout_ms() -> u64 {
    5000
}
