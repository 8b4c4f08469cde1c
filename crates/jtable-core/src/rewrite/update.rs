use jtable_commons::constants::data_columns;
use jtable_commons::{ColumnMeta, SqlValue, VirtualTable, DATA_TABLE_NAME};
use jtable_sql::parser::utils::object_name_to_table;
use sqlparser::ast::{AssignmentTarget, TableFactor, Update};

use super::select::conjoin_filter;
use super::{check_not_null, column_type, literal_value, ColumnResolver, PhysicalStatement, Rewriter};
use crate::catalog::{malformed, parse_payload, write_payload};
use crate::engine::{PhysicalDialect, ScopedTransaction};
use crate::error::{JsonTableError, Result};
use crate::types::CanonicalValue;

/// Right-hand side of one SET assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignedValue {
    /// Literal already validated against the column type
    Bound(CanonicalValue),
    /// Rewritten expression the engine evaluates per matching row
    Computed(String),
}

/// A checked UPDATE of one virtual table.
///
/// Literal-only assignments run as a single `JSON_SET` over the payload.
/// When any assignment is computed, the matching rows are read together with
/// the computed values, each value is validated like a literal, and the
/// payloads are written back by row id in the caller's transaction.
#[derive(Debug, Clone)]
pub struct UpdatePlan<'a> {
    table: &'a VirtualTable,
    dialect: PhysicalDialect,
    assignments: Vec<(&'a ColumnMeta, AssignedValue)>,
    predicate: String,
    filter_params: Vec<SqlValue>,
}

impl<'a> Rewriter<'a> {
    /// Validate an UPDATE against the catalog and plan its execution.
    pub fn update(&self, update: &Update) -> Result<UpdatePlan<'a>> {
        if !update.table.joins.is_empty() || update.from.is_some() {
            return Err(JsonTableError::UnsupportedStatement(
                "UPDATE across several tables".to_string(),
            ));
        }
        let (name, alias) = match &update.table.relation {
            TableFactor::Table { name, alias, .. } => (name, alias.as_ref().map(|a| a.name.value.clone())),
            _ => {
                return Err(JsonTableError::UnsupportedStatement(
                    "UPDATE target must be a virtual table".to_string(),
                ))
            },
        };
        let table = self.table(name)?;
        let mut resolver = ColumnResolver::new(table, self.dialect);
        if let Some(alias) = alias {
            resolver = resolver.with_qualifier(alias);
        }

        let mut assignments: Vec<(&'a ColumnMeta, AssignedValue)> = Vec::with_capacity(update.assignments.len());
        for assignment in &update.assignments {
            let column_name = match &assignment.target {
                AssignmentTarget::ColumnName(target) => object_name_to_table(target),
                AssignmentTarget::Tuple(_) => None,
            }
            .ok_or_else(|| {
                JsonTableError::UnsupportedStatement(format!(
                    "assignment target {}",
                    assignment.target
                ))
            })?;
            let column = table
                .column(&column_name)
                .ok_or_else(|| JsonTableError::unknown_column(table.name().as_str(), &column_name))?;
            if assignments.iter().any(|(assigned, _)| assigned.name == column.name) {
                return Err(JsonTableError::duplicate_column(table.name().as_str(), &column.name));
            }

            let value = match literal_value(&assignment.value) {
                Some(raw) => {
                    let value = column_type(column)?
                        .validate(&raw)
                        .map_err(|e| JsonTableError::from_value_error(&column.name, e))?;
                    check_not_null(column, &value)?;
                    AssignedValue::Bound(value)
                },
                None => {
                    let mut expr = assignment.value.clone();
                    resolver.rewrite(&mut expr, false)?;
                    AssignedValue::Computed(expr.to_string())
                },
            };
            assignments.push((column, value));
        }

        let mut selection = update.selection.clone();
        resolver.rewrite(&mut selection, false)?;

        let filter = self.scope.write_filter(table.name(), self.tenant, "UPDATE")?;
        let predicate = conjoin_filter(&filter, selection)?;

        Ok(UpdatePlan {
            table,
            dialect: self.dialect,
            assignments,
            predicate: predicate.to_string(),
            filter_params: filter.params(),
        })
    }
}

impl<'a> UpdatePlan<'a> {
    pub fn table(&self) -> &'a VirtualTable {
        self.table
    }

    pub fn assignments(&self) -> &[(&'a ColumnMeta, AssignedValue)] {
        &self.assignments
    }

    /// Whether any assignment needs the engine to compute its value.
    pub fn is_computed(&self) -> bool {
        self.assignments
            .iter()
            .any(|(_, value)| matches!(value, AssignedValue::Computed(_)))
    }

    /// First statement sent to the engine: the `JSON_SET` write, or the read
    /// of row ids, payloads and computed values.
    pub fn statement(&self) -> PhysicalStatement {
        if self.is_computed() {
            self.read_statement()
        } else {
            self.write_statement()
        }
    }

    /// Run the update inside `txn`, returning the number of rows written.
    pub fn execute(&self, txn: &mut ScopedTransaction<'_>) -> Result<u64> {
        let statement = self.statement();
        log::debug!("Rewrote UPDATE on '{}': {}", self.table.name(), statement.sql);
        if !self.is_computed() {
            return Ok(txn.execute(&statement.sql, &statement.params)?);
        }

        let rows = txn.query(&statement.sql, &statement.params)?;
        let mut changed = 0;
        for row in rows {
            let [row_id, payload, computed @ ..] = row.as_slice() else {
                return Err(malformed("expected row id and payload"));
            };
            let row_id = row_id
                .as_i64()
                .ok_or_else(|| malformed("row id is not an integer"))?;

            let mut document = parse_payload(payload)?;
            let mut computed = computed.iter();
            for (column, assigned) in &self.assignments {
                let value = match assigned {
                    AssignedValue::Bound(value) => value.clone(),
                    AssignedValue::Computed(_) => {
                        let raw = computed
                            .next()
                            .ok_or_else(|| malformed("missing computed value"))?;
                        let value = column_type(column)?
                            .validate(raw)
                            .map_err(|e| JsonTableError::from_value_error(&column.name, e))?;
                        check_not_null(column, &value)?;
                        value
                    },
                };
                document.insert(column.name.clone(), value.to_json());
            }
            changed += write_payload(txn, row_id, document)?;
        }
        Ok(changed)
    }

    fn write_statement(&self) -> PhysicalStatement {
        let mut pairs = Vec::with_capacity(self.assignments.len());
        let mut params = Vec::with_capacity(self.assignments.len() + self.filter_params.len());
        for (column, assigned) in &self.assignments {
            if let AssignedValue::Bound(value) = assigned {
                pairs.push((column.name.clone(), self.dialect.json_param().to_string()));
                params.push(value.to_json_param());
            }
        }
        params.extend(self.filter_params.iter().cloned());

        let sql = format!(
            "UPDATE {} SET {} = {} WHERE {}",
            DATA_TABLE_NAME,
            data_columns::PAYLOAD,
            self.dialect.json_set(&pairs),
            self.predicate
        );
        PhysicalStatement::new(sql, params)
    }

    fn read_statement(&self) -> PhysicalStatement {
        let mut projection = vec![data_columns::ROW_ID.to_string(), data_columns::PAYLOAD.to_string()];
        projection.extend(self.assignments.iter().filter_map(|(_, assigned)| match assigned {
            AssignedValue::Computed(expr) => Some(expr.clone()),
            AssignedValue::Bound(_) => None,
        }));

        let sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {}",
            projection.join(", "),
            DATA_TABLE_NAME,
            self.predicate,
            data_columns::ROW_ID
        );
        PhysicalStatement::new(sql, self.filter_params.clone())
    }
}
