//! Scalar values exchanged with the underlying SQL engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single cell or bound parameter.
///
/// This is deliberately engine-neutral: adapters translate it to and from
/// their driver's value type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(i) => Some(*i),
            SqlValue::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Converts a JSON scalar read from a payload document.
    ///
    /// Arrays and objects are carried as their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => SqlValue::Null,
            serde_json::Value::Bool(b) => SqlValue::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::Int(i),
                None => n.as_f64().map_or(SqlValue::Text(n.to_string()), SqlValue::Float),
            },
            serde_json::Value::String(s) => SqlValue::Text(s.clone()),
            other => SqlValue::Text(other.to_string()),
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Bool(b) => write!(f, "{}", b),
            SqlValue::Int(i) => write!(f, "{}", i),
            SqlValue::Float(v) => write!(f, "{}", v),
            SqlValue::Text(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(SqlValue::from_json(&serde_json::json!(null)), SqlValue::Null);
        assert_eq!(SqlValue::from_json(&serde_json::json!(10)), SqlValue::Int(10));
        assert_eq!(SqlValue::from_json(&serde_json::json!(57.89)), SqlValue::Float(57.89));
        assert_eq!(SqlValue::from_json(&serde_json::json!("ca")), SqlValue::Text("ca".into()));
        assert_eq!(SqlValue::from_json(&serde_json::json!(true)), SqlValue::Bool(true));
    }

    #[test]
    fn test_display() {
        assert_eq!(SqlValue::Null.to_string(), "NULL");
        assert_eq!(SqlValue::from("x").to_string(), "'x'");
    }
}
