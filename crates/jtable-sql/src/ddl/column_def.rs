//! Column definitions shared by CREATE TABLE and ALTER TABLE.

use jtable_commons::ColumnMeta;
use sqlparser::ast::{ColumnDef, ColumnOption};

use crate::ddl::DdlResult;
use crate::parser::utils::{default_expr_text, normalize_data_type};

/// A column as written in DDL, before it is assigned a catalog id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    /// Normalized type text, e.g. `VARCHAR(30)`
    pub data_type: String,
    pub nullable: bool,
    pub has_default: bool,
    /// Raw SQL of the DEFAULT clause, `None` for no default or `DEFAULT NULL`
    pub default_expr: Option<String>,
}

impl ColumnDefinition {
    /// Nullable column without default.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            has_default: false,
            default_expr: None,
        }
    }

    pub fn set_default(&mut self, default_expr: Option<String>) {
        self.has_default = true;
        self.default_expr = default_expr;
    }

    /// Convert a sqlparser column definition.
    ///
    /// Only `NULL`, `NOT NULL` and `DEFAULT` are accepted as column options.
    pub fn from_column_def(col: &ColumnDef) -> DdlResult<Self> {
        let mut def = Self::new(col.name.value.clone(), normalize_data_type(&col.data_type));

        for option_def in &col.options {
            match &option_def.option {
                ColumnOption::NotNull => def.nullable = false,
                ColumnOption::Null => def.nullable = true,
                ColumnOption::Default(expr) => def.set_default(default_expr_text(expr)),
                other => {
                    return Err(format!(
                        "Column constraint not supported on '{}': {}",
                        def.name, other
                    ))
                },
            }
        }

        Ok(def)
    }

    /// Catalog entry for this definition under `column_id`.
    pub fn to_column_meta(&self, column_id: i64) -> ColumnMeta {
        ColumnMeta {
            column_id,
            name: self.name.clone(),
            type_spec: self.data_type.clone(),
            nullable: self.nullable,
            has_default: self.has_default,
            default_expr: self.default_expr.clone(),
        }
    }
}
