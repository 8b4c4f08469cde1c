//! Catalog row describing one column of a virtual table.

use serde::{Deserialize, Serialize};

/// Key of the JSON object persisted in `jcol_default`.
const DEFAULT_PAYLOAD_KEY: &str = "default";

/// One column of a virtual table as recorded in the catalog table.
///
/// `default_expr` holds raw SQL expression text. A column with
/// `has_default == false` never carries an expression, while
/// `has_default == true` with `default_expr == None` means `DEFAULT NULL`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub column_id: i64,
    pub name: String,
    pub type_spec: String,
    pub nullable: bool,
    pub has_default: bool,
    pub default_expr: Option<String>,
}

impl ColumnMeta {
    /// Nullable column without a default.
    pub fn new(column_id: i64, name: impl Into<String>, type_spec: impl Into<String>) -> Self {
        Self {
            column_id,
            name: name.into(),
            type_spec: type_spec.into(),
            nullable: true,
            has_default: false,
            default_expr: None,
        }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Declares a default. `None` stands for `DEFAULT NULL`.
    pub fn with_default(mut self, default_expr: Option<String>) -> Self {
        self.has_default = true;
        self.default_expr = default_expr;
        self
    }

    /// True when an INSERT may leave this column out.
    pub fn may_be_omitted(&self) -> bool {
        self.nullable || self.has_default
    }

    /// NOT NULL combined with DEFAULT NULL can never be satisfied.
    pub fn defaults_to_null_but_required(&self) -> bool {
        !self.nullable && self.has_default && self.default_expr.is_none()
    }

    /// Serialized form stored in `jcol_default`, e.g. `{"default":"10"}`.
    pub fn default_payload(&self) -> String {
        serde_json::json!({ DEFAULT_PAYLOAD_KEY: self.default_expr }).to_string()
    }

    /// Reads the expression text back out of a `jcol_default` payload.
    ///
    /// Payloads that are not a JSON object with a string `default` entry
    /// decode to `None`.
    pub fn default_from_payload(payload: &str) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(payload).ok()?;
        value
            .get(DEFAULT_PAYLOAD_KEY)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}
