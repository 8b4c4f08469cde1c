//! Physical layout constants shared by the catalog store and the rewriter.

/// Physical table holding one row per (principal, virtual table, column).
pub const META_TABLE_NAME: &str = "_meta_json_t";

/// Physical table holding one JSON document per virtual row, keyed by
/// principal, tenant and table name.
pub const DATA_TABLE_NAME: &str = "_data_json_t";

/// Names that can never be used for a virtual table.
pub const RESERVED_TABLE_NAMES: [&str; 2] = [META_TABLE_NAME, DATA_TABLE_NAME];

/// Column ids below this value are reserved for system use.
pub const FIRST_USER_COLUMN_ID: i64 = 16;

/// Physical column names of the catalog table.
pub mod meta_columns {
    pub const USER_ID: &str = "user_id";
    pub const TABLE_NAME: &str = "jtable_name";
    pub const COLUMN_ID: &str = "jcol_id";
    pub const COLUMN_NAME: &str = "jcol_name";
    pub const COLUMN_TYPE: &str = "jcol_type";
    pub const NULLABLE: &str = "jcol_nullable";
    pub const HAS_DEFAULT: &str = "jcol_has_default";
    pub const DEFAULT: &str = "jcol_default";
}

/// Physical column names of the data table.
pub mod data_columns {
    /// Principal whose catalog describes the row
    pub const OWNER_ID: &str = "owner_id";
    /// Tenant owning the row
    pub const USER_ID: &str = "user_id";
    pub const TABLE_NAME: &str = "jtable_name";
    pub const ROW_ID: &str = "jdata_id";
    pub const PAYLOAD: &str = "jdata";
}

/// Returns true if `name` collides with one of the physical tables.
pub fn is_reserved_table_name(name: &str) -> bool {
    RESERVED_TABLE_NAMES.iter().any(|reserved| reserved.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_names() {
        assert!(is_reserved_table_name("_meta_json_t"));
        assert!(is_reserved_table_name("_DATA_JSON_T"));
        assert!(!is_reserved_table_name("t1"));
    }
}
