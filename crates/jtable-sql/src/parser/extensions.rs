//! ALTER TABLE grammar extension.
//!
//! The stock dialects either reject the MySQL-flavoured column actions or hand
//! them back in a shape that differs per dialect. This parser walks the token
//! stream with sqlparser's own primitives and produces an
//! [`AlterTableStatement`] the catalog can apply directly:
//!
//! - **ADD [COLUMN]** `col type [NULL | NOT NULL] [DEFAULT expr]`
//! - **DROP [COLUMN]** `col`
//! - **MODIFY [COLUMN]** `col type [constraints]`
//! - **CHANGE [COLUMN]** `old new type [constraints]`
//! - **RENAME [TO | AS]** `new_table` / **RENAME COLUMN** `old TO new`

use jtable_commons::TableName;
use sqlparser::keywords::Keyword;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::Token;

use crate::ddl::{AlterOperation, AlterTableStatement, ColumnDefinition, DdlResult};
use crate::parser::utils::{default_expr_text, new_parser, normalize_data_type, SQL_DIALECT};

/// Token-driven parser for a single ALTER TABLE statement.
pub struct AlterTableParser<'a> {
    parser: Parser<'a>,
}

impl AlterTableParser<'static> {
    pub fn new(sql: &str) -> DdlResult<Self> {
        let parser = new_parser(sql, &SQL_DIALECT).map_err(|e| e.to_string())?;
        Ok(Self { parser })
    }
}

impl<'a> AlterTableParser<'a> {
    pub fn parse(mut self) -> DdlResult<AlterTableStatement> {
        self.expect_keyword(Keyword::ALTER, "ALTER")?;
        self.expect_keyword(Keyword::TABLE, "TABLE")?;

        let table_name = self.parse_object_name()?;

        let mut operations = vec![self.parse_operation()?];
        while self.parser.consume_token(&Token::Comma) {
            operations.push(self.parse_operation()?);
        }

        self.parser.consume_token(&Token::SemiColon);
        match self.parser.peek_token().token {
            Token::EOF => {},
            other => {
                return Err(format!("Unexpected token after ALTER TABLE action: {}", other));
            },
        }

        Ok(AlterTableStatement {
            table_name: TableName::new(table_name),
            operations,
        })
    }

    fn parse_operation(&mut self) -> DdlResult<AlterOperation> {
        if self.parser.parse_keyword(Keyword::ADD) {
            self.parser.parse_keyword(Keyword::COLUMN);
            return Ok(AlterOperation::AddColumn(self.parse_column_definition()?));
        }

        if self.parser.parse_keyword(Keyword::DROP) {
            self.parser.parse_keyword(Keyword::COLUMN);
            let column_name = self.parse_identifier()?;
            return Ok(AlterOperation::DropColumn { column_name });
        }

        if self.parser.parse_keyword(Keyword::MODIFY) {
            self.parser.parse_keyword(Keyword::COLUMN);
            return Ok(AlterOperation::ModifyColumn(self.parse_column_definition()?));
        }

        if self.parser.parse_keyword(Keyword::CHANGE) {
            self.parser.parse_keyword(Keyword::COLUMN);
            let old_name = self.parse_identifier()?;
            let column = self.parse_column_definition()?;
            return Ok(AlterOperation::ChangeColumn { old_name, column });
        }

        if self.parser.parse_keyword(Keyword::RENAME) {
            if self.parser.parse_keyword(Keyword::COLUMN) {
                let old_name = self.parse_identifier()?;
                self.expect_keyword(Keyword::TO, "TO")?;
                let new_name = self.parse_identifier()?;
                return Ok(AlterOperation::RenameColumn { old_name, new_name });
            }

            if !self.parser.parse_keyword(Keyword::TO) {
                self.parser.parse_keyword(Keyword::AS);
            }
            let new_name = self.parse_object_name()?;
            return Ok(AlterOperation::RenameTable {
                new_name: TableName::new(new_name),
            });
        }

        Err(format!(
            "Expected ADD, DROP, MODIFY, CHANGE or RENAME, found: {}",
            self.parser.peek_token().token
        ))
    }

    /// `name type [NULL | NOT NULL] [DEFAULT expr]` in any constraint order.
    fn parse_column_definition(&mut self) -> DdlResult<ColumnDefinition> {
        let name = self.parse_identifier()?;
        let data_type = self.parser.parse_data_type().map_err(|e| e.to_string())?;
        let mut column = ColumnDefinition::new(name, normalize_data_type(&data_type));

        loop {
            if self.parser.parse_keywords(&[Keyword::NOT, Keyword::NULL]) {
                column.nullable = false;
            } else if self.parser.parse_keyword(Keyword::NULL) {
                column.nullable = true;
            } else if self.parser.parse_keyword(Keyword::DEFAULT) {
                let expr = self.parser.parse_expr().map_err(|e| e.to_string())?;
                column.set_default(default_expr_text(&expr));
            } else {
                break;
            }
        }

        if let Token::Word(word) = self.parser.peek_token().token {
            return Err(format!(
                "Column constraint not supported on '{}': {}",
                column.name, word
            ));
        }

        Ok(column)
    }

    /// Possibly qualified name; only the last part is kept.
    fn parse_object_name(&mut self) -> DdlResult<String> {
        let mut name = self.parse_identifier()?;
        while self.parser.consume_token(&Token::Period) {
            name = self.parse_identifier()?;
        }
        Ok(name)
    }

    fn parse_identifier(&mut self) -> DdlResult<String> {
        match self.parser.next_token().token {
            Token::Word(word) => Ok(word.value),
            other => Err(format!("Expected identifier, found: {}", other)),
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword, text: &str) -> DdlResult<()> {
        if self.parser.parse_keyword(keyword) {
            Ok(())
        } else {
            Err(format!(
                "Expected {}, found: {}",
                text,
                self.parser.peek_token().token
            ))
        }
    }
}
