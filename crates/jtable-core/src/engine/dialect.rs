use jtable_commons::constants::{data_columns, meta_columns};
use jtable_commons::{DATA_TABLE_NAME, META_TABLE_NAME};
use jtable_configs::EngineKind;

use crate::types::TypeDescriptor;

/// SQL flavour of the underlying engine.
///
/// Passed explicitly to the catalog store and the rewriter; nothing is
/// registered globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalDialect {
    MySql,
    Sqlite,
}

impl PhysicalDialect {
    /// DDL creating both physical tables when they are missing.
    pub fn bootstrap_statements(&self) -> Vec<String> {
        match self {
            PhysicalDialect::Sqlite => vec![
                format!(
                    "CREATE TABLE IF NOT EXISTS {meta} (\
                     {uid} INTEGER NOT NULL, \
                     {tname} VARCHAR(512) NOT NULL, \
                     {cid} INTEGER NOT NULL, \
                     {cname} VARCHAR(512) NOT NULL, \
                     {ctype} VARCHAR(128) NOT NULL, \
                     {nullable} TINYINT NOT NULL, \
                     {has_default} TINYINT NOT NULL, \
                     {default} TEXT NOT NULL, \
                     PRIMARY KEY ({uid}, {tname}, {cid}, {cname}))",
                    meta = META_TABLE_NAME,
                    uid = meta_columns::USER_ID,
                    tname = meta_columns::TABLE_NAME,
                    cid = meta_columns::COLUMN_ID,
                    cname = meta_columns::COLUMN_NAME,
                    ctype = meta_columns::COLUMN_TYPE,
                    nullable = meta_columns::NULLABLE,
                    has_default = meta_columns::HAS_DEFAULT,
                    default = meta_columns::DEFAULT,
                ),
                format!(
                    "CREATE TABLE IF NOT EXISTS {data} (\
                     {rid} INTEGER PRIMARY KEY AUTOINCREMENT, \
                     {owner} INTEGER NOT NULL, \
                     {uid} INTEGER NOT NULL, \
                     {tname} VARCHAR(512) NOT NULL, \
                     {payload} TEXT)",
                    data = DATA_TABLE_NAME,
                    rid = data_columns::ROW_ID,
                    owner = data_columns::OWNER_ID,
                    uid = data_columns::USER_ID,
                    tname = data_columns::TABLE_NAME,
                    payload = data_columns::PAYLOAD,
                ),
                format!(
                    "CREATE INDEX IF NOT EXISTS idx{data}_owner ON {data} ({owner}, {tname}, {uid}, {rid})",
                    data = DATA_TABLE_NAME,
                    owner = data_columns::OWNER_ID,
                    uid = data_columns::USER_ID,
                    tname = data_columns::TABLE_NAME,
                    rid = data_columns::ROW_ID,
                ),
            ],
            PhysicalDialect::MySql => vec![
                format!(
                    "CREATE TABLE IF NOT EXISTS {meta} (\
                     {uid} BIGINT NOT NULL, \
                     {tname} VARCHAR(255) NOT NULL, \
                     {cid} BIGINT NOT NULL, \
                     {cname} VARCHAR(255) NOT NULL, \
                     {ctype} VARCHAR(128) NOT NULL, \
                     {nullable} TINYINT NOT NULL, \
                     {has_default} TINYINT NOT NULL, \
                     {default} JSON, \
                     PRIMARY KEY ({uid}, {tname}, {cid}, {cname}))",
                    meta = META_TABLE_NAME,
                    uid = meta_columns::USER_ID,
                    tname = meta_columns::TABLE_NAME,
                    cid = meta_columns::COLUMN_ID,
                    cname = meta_columns::COLUMN_NAME,
                    ctype = meta_columns::COLUMN_TYPE,
                    nullable = meta_columns::NULLABLE,
                    has_default = meta_columns::HAS_DEFAULT,
                    default = meta_columns::DEFAULT,
                ),
                format!(
                    "CREATE TABLE IF NOT EXISTS {data} (\
                     {owner} BIGINT NOT NULL, \
                     {uid} BIGINT NOT NULL, \
                     {tname} VARCHAR(255) NOT NULL, \
                     {rid} BIGINT NOT NULL AUTO_INCREMENT, \
                     {payload} JSON, \
                     PRIMARY KEY ({owner}, {tname}, {uid}, {rid}), \
                     KEY ({rid}))",
                    data = DATA_TABLE_NAME,
                    owner = data_columns::OWNER_ID,
                    rid = data_columns::ROW_ID,
                    uid = data_columns::USER_ID,
                    tname = data_columns::TABLE_NAME,
                    payload = data_columns::PAYLOAD,
                ),
            ],
        }
    }

    /// Typed read of one payload key, as SQL text.
    ///
    /// SQLite's `json_extract` already yields native scalars. MySQL goes
    /// through `JSON_VALUE` and casts to the column's returning type so JSON
    /// `null` reads back as SQL NULL.
    pub fn json_accessor(&self, column: &str, ty: &TypeDescriptor) -> String {
        let path = json_path_literal(column);
        match self {
            PhysicalDialect::Sqlite => format!("json_extract({}, {})", data_columns::PAYLOAD, path),
            PhysicalDialect::MySql => format!(
                "CAST(JSON_VALUE({}, {}) AS {})",
                data_columns::PAYLOAD,
                path,
                ty.returning_type()
            ),
        }
    }

    /// `JSON_SET(jdata, '$.a', ?, '$.b', ?)` style assignment of several keys.
    pub fn json_set(&self, assignments: &[(String, String)]) -> String {
        let pairs: Vec<String> = assignments
            .iter()
            .map(|(column, value)| format!("{}, {}", json_path_literal(column), value))
            .collect();
        format!("JSON_SET({}, {})", data_columns::PAYLOAD, pairs.join(", "))
    }

    /// Placeholder for a value bound as JSON text, so booleans, numbers and
    /// null keep their JSON type inside `JSON_SET`.
    pub fn json_param(&self) -> &'static str {
        match self {
            PhysicalDialect::Sqlite => "json(?)",
            PhysicalDialect::MySql => "CAST(? AS JSON)",
        }
    }

    /// `JSON_REMOVE(jdata, '$.a')`
    pub fn json_remove(&self, column: &str) -> String {
        format!("JSON_REMOVE({}, {})", data_columns::PAYLOAD, json_path_literal(column))
    }
}

impl From<EngineKind> for PhysicalDialect {
    fn from(kind: EngineKind) -> Self {
        match kind {
            EngineKind::Sqlite => PhysicalDialect::Sqlite,
            EngineKind::Mysql => PhysicalDialect::MySql,
        }
    }
}

/// Quoted SQL string literal of the JSON path addressing `column`.
pub(crate) fn json_path_literal(column: &str) -> String {
    let simple = column
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && column.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    let path = if simple {
        format!("$.{}", column)
    } else {
        format!("$.\"{}\"", column.replace('"', "\\\""))
    };
    format!("'{}'", path.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_path_literal() {
        assert_eq!(json_path_literal("c1"), "'$.c1'");
        assert_eq!(json_path_literal("my col"), "'$.\"my col\"'");
        assert_eq!(json_path_literal("it's"), "'$.\"it''s\"'");
    }

    #[test]
    fn test_sqlite_accessor() {
        let accessor = PhysicalDialect::Sqlite.json_accessor("c1", &TypeDescriptor::Int);
        assert_eq!(accessor, "json_extract(jdata, '$.c1')");
    }

    #[test]
    fn test_mysql_accessor() {
        let accessor = PhysicalDialect::MySql
            .json_accessor("c2", &TypeDescriptor::Varchar { length: 30 });
        assert_eq!(accessor, "CAST(JSON_VALUE(jdata, '$.c2') AS CHAR(30))");
    }

    #[test]
    fn test_json_set_and_remove() {
        let dialect = PhysicalDialect::Sqlite;
        assert_eq!(
            dialect.json_set(&[("c1".to_string(), "?".to_string()), ("c2".to_string(), "1".to_string())]),
            "JSON_SET(jdata, '$.c1', ?, '$.c2', 1)"
        );
        assert_eq!(dialect.json_remove("c3"), "JSON_REMOVE(jdata, '$.c3')");
    }

    #[test]
    fn test_bootstrap_mentions_both_tables() {
        for dialect in [PhysicalDialect::Sqlite, PhysicalDialect::MySql] {
            let ddl = dialect.bootstrap_statements().join(";");
            assert!(ddl.contains("_meta_json_t"));
            assert!(ddl.contains("_data_json_t"));
            assert!(ddl.contains("owner_id"));
        }
    }

    #[test]
    fn test_json_param() {
        assert_eq!(PhysicalDialect::Sqlite.json_param(), "json(?)");
        assert_eq!(PhysicalDialect::MySql.json_param(), "CAST(? AS JSON)");
    }
}
