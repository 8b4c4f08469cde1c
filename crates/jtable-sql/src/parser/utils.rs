//! Common parsing utilities

use sqlparser::ast::{DataType, Expr, ObjectName, ObjectNamePart, Statement};
use sqlparser::dialect::{Dialect, MySqlDialect};
use sqlparser::parser::{Parser, ParserError, ParserOptions};
use sqlparser::tokenizer::Token;

const DEFAULT_SQL_RECURSION_LIMIT: usize = 512;

/// Dialect used for every statement accepted by the engine.
pub static SQL_DIALECT: MySqlDialect = MySqlDialect {};

/// Default sqlparser options
pub fn parser_options() -> ParserOptions {
    ParserOptions::new().with_trailing_commas(true)
}

/// Build a parser over `sql` with the default options and recursion limit.
pub fn new_parser<'a>(sql: &str, dialect: &'a dyn Dialect) -> Result<Parser<'a>, ParserError> {
    Parser::new(dialect)
        .with_options(parser_options())
        .with_recursion_limit(DEFAULT_SQL_RECURSION_LIMIT)
        .try_with_sql(sql)
}

/// Parse SQL into statements using the defaults (options + recursion limit)
pub fn parse_sql_statements(sql: &str) -> Result<Vec<Statement>, ParserError> {
    new_parser(sql, &SQL_DIALECT)?.parse_statements()
}

/// Parse a standalone scalar expression, e.g. a rendered JSON accessor.
pub fn parse_sql_expr(sql: &str) -> Result<Expr, ParserError> {
    new_parser(sql, &SQL_DIALECT)?.parse_expr()
}

/// Collect non-whitespace tokens using sqlparser's parser lookahead.
pub fn collect_non_whitespace_tokens(sql: &str) -> Result<Vec<Token>, ParserError> {
    let parser = new_parser(sql, &SQL_DIALECT)?;

    let mut tokens = Vec::new();
    let mut idx = 0;
    loop {
        let token = parser.peek_nth_token_ref(idx).token.clone();
        if matches!(token, Token::EOF) {
            break;
        }
        tokens.push(token);
        idx += 1;
    }

    Ok(tokens)
}

/// Extract uppercased keyword-ish tokens for statement classification.
pub fn tokens_to_words(tokens: &[Token]) -> Vec<String> {
    tokens
        .iter()
        .filter_map(|tok| match tok {
            Token::Word(word) => Some(word.value.to_ascii_uppercase()),
            _ => None,
        })
        .collect()
}

/// Last identifier of a possibly qualified object name (`db.t1` -> `t1`).
pub fn object_name_to_table(name: &ObjectName) -> Option<String> {
    name.0.iter().rev().find_map(|part| match part {
        ObjectNamePart::Identifier(ident) => Some(ident.value.clone()),
        _ => None,
    })
}

/// Canonical text of a column type: upper-cased with whitespace removed.
///
/// `decimal(10, 2)` becomes `DECIMAL(10,2)`.
pub fn normalize_data_type(data_type: &DataType) -> String {
    data_type
        .to_string()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase()
}

/// Text recorded for a DEFAULT clause; `None` for `DEFAULT NULL`.
pub fn default_expr_text(expr: &Expr) -> Option<String> {
    let text = expr.to_string();
    if text.eq_ignore_ascii_case("NULL") {
        None
    } else {
        Some(text)
    }
}
