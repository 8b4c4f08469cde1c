//! ALTER TABLE statement model
//!
//! Parses SQL statements like:
//! - ALTER TABLE t1 ADD COLUMN email VARCHAR(100) NOT NULL DEFAULT 'x'
//! - ALTER TABLE t1 DROP COLUMN c3
//! - ALTER TABLE t1 MODIFY COLUMN c2 VARCHAR(60) DEFAULT 'ca'
//! - ALTER TABLE t1 CHANGE COLUMN c2 c2_new INT
//! - ALTER TABLE t1 RENAME TO t2
//! - ALTER TABLE t1 RENAME COLUMN c1 TO c9

use jtable_commons::TableName;

use crate::ddl::{ColumnDefinition, DdlResult};
use crate::parser::extensions::AlterTableParser;

/// One action of an ALTER TABLE statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterOperation {
    /// Add a new column
    AddColumn(ColumnDefinition),
    /// Drop an existing column
    DropColumn { column_name: String },
    /// Change type and constraints, name fixed
    ModifyColumn(ColumnDefinition),
    /// Change name, type and constraints
    ChangeColumn {
        old_name: String,
        column: ColumnDefinition,
    },
    /// Rename a column keeping its type
    RenameColumn { old_name: String, new_name: String },
    /// Rename the table
    RenameTable { new_name: TableName },
}

impl AlterOperation {
    /// Short label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            AlterOperation::AddColumn(_) => "ADD COLUMN",
            AlterOperation::DropColumn { .. } => "DROP COLUMN",
            AlterOperation::ModifyColumn(_) => "MODIFY COLUMN",
            AlterOperation::ChangeColumn { .. } => "CHANGE COLUMN",
            AlterOperation::RenameColumn { .. } => "RENAME COLUMN",
            AlterOperation::RenameTable { .. } => "RENAME TABLE",
        }
    }
}

/// ALTER TABLE statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlterTableStatement {
    /// Table name to alter
    pub table_name: TableName,

    /// Actions in the order they were written
    pub operations: Vec<AlterOperation>,
}

impl AlterTableStatement {
    /// Parse an ALTER TABLE statement from SQL
    ///
    /// Supports syntax:
    /// - ALTER TABLE name ADD [COLUMN] col data_type [NULL | NOT NULL] [DEFAULT expr]
    /// - ALTER TABLE name DROP [COLUMN] col
    /// - ALTER TABLE name MODIFY [COLUMN] col data_type [NULL | NOT NULL] [DEFAULT expr]
    /// - ALTER TABLE name CHANGE [COLUMN] old new data_type [NULL | NOT NULL] [DEFAULT expr]
    /// - ALTER TABLE name RENAME [TO | AS] new_name
    /// - ALTER TABLE name RENAME COLUMN old TO new
    ///
    /// Several actions may be separated by commas.
    pub fn parse(sql: &str) -> DdlResult<Self> {
        AlterTableParser::new(sql)?.parse()
    }
}
