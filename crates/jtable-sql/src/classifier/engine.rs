use sqlparser::ast::Statement;

use super::types::{SqlStatement, SqlStatementKind, StatementClassificationError};
use crate::ddl::{AlterTableStatement, CreateTableStatement};
use crate::parser::utils::{collect_non_whitespace_tokens, parse_sql_statements, tokens_to_words};

impl SqlStatement {
    /// Classify and parse SQL text in one pass.
    ///
    /// The first one or two keywords decide the kind; the supported kinds are
    /// then parsed into their AST form.
    pub fn classify(sql: &str) -> Result<Self, StatementClassificationError> {
        let invalid = |message: String| StatementClassificationError::InvalidSql {
            sql: sql.to_string(),
            message,
        };

        let tokens = collect_non_whitespace_tokens(sql).map_err(|e| invalid(e.to_string()))?;
        let words = tokens_to_words(&tokens);
        let first = match (tokens.first(), words.first()) {
            (None, _) => return Err(invalid("Empty SQL statement".to_string())),
            (Some(sqlparser::tokenizer::Token::LParen), _) => "SELECT",
            (_, Some(word)) => word.as_str(),
            (Some(token), None) => {
                return Err(StatementClassificationError::Unsupported(token.to_string()));
            },
        };
        let second = words.get(1).map(String::as_str).unwrap_or_default();

        let kind = match first {
            "ALTER" if second == "TABLE" => {
                SqlStatementKind::AlterTable(AlterTableStatement::parse(sql).map_err(invalid)?)
            },
            "CREATE" if second == "TABLE" => {
                SqlStatementKind::CreateTable(CreateTableStatement::parse(sql).map_err(invalid)?)
            },
            "INSERT" | "UPDATE" | "DELETE" | "SELECT" | "WITH" => {
                let statement = Self::parse_single(sql).map_err(invalid)?;
                Self::dml_kind(statement)?
            },
            "ALTER" | "CREATE" => {
                return Err(StatementClassificationError::Unsupported(format!(
                    "{} {}",
                    first, second
                )));
            },
            other => return Err(StatementClassificationError::Unsupported(other.to_string())),
        };

        let statement = SqlStatement::new(sql, kind);
        log::debug!("Classified statement as {}", statement.name());
        Ok(statement)
    }

    fn parse_single(sql: &str) -> Result<Statement, String> {
        let mut statements = parse_sql_statements(sql).map_err(|e| e.to_string())?;
        match statements.len() {
            1 => Ok(statements.remove(0)),
            0 => Err("Empty SQL statement".to_string()),
            n => Err(format!("Expected a single statement, found {}", n)),
        }
    }

    fn dml_kind(statement: Statement) -> Result<SqlStatementKind, StatementClassificationError> {
        match statement {
            Statement::Insert(insert) => Ok(SqlStatementKind::Insert(Box::new(insert))),
            Statement::Update(update) => Ok(SqlStatementKind::Update(Box::new(update))),
            Statement::Delete(delete) => Ok(SqlStatementKind::Delete(Box::new(delete))),
            Statement::Query(query) => Ok(SqlStatementKind::Select(query)),
            other => Err(StatementClassificationError::Unsupported(
                other.to_string().split_whitespace().next().unwrap_or_default().to_string(),
            )),
        }
    }
}
