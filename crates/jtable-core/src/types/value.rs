use chrono::NaiveDateTime;
use jtable_commons::SqlValue;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// ISO-8601 without offset; fractional seconds only when present.
const ISO_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A value that passed [`TypeDescriptor::validate`](super::TypeDescriptor::validate).
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalValue {
    Null,
    Bool(bool),
    Timestamp(NaiveDateTime),
    Int(i64),
    Varchar(String),
    Decimal(Decimal),
}

impl CanonicalValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CanonicalValue::Null)
    }

    /// Storage form inside a JSON payload.
    ///
    /// Timestamps become ISO-8601 text and decimals JSON numbers.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CanonicalValue::Null => serde_json::Value::Null,
            CanonicalValue::Bool(b) => serde_json::Value::Bool(*b),
            CanonicalValue::Timestamp(ts) => {
                serde_json::Value::String(ts.format(ISO_TIMESTAMP_FORMAT).to_string())
            },
            CanonicalValue::Int(i) => serde_json::Value::from(*i),
            CanonicalValue::Varchar(s) => serde_json::Value::String(s.clone()),
            CanonicalValue::Decimal(d) => d
                .to_f64()
                .and_then(serde_json::Number::from_f64)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(d.to_string())),
        }
    }

    /// JSON text bound to a [`json_param`] placeholder, so `JSON_SET`
    /// stores the same form as a full payload write.
    ///
    /// [`json_param`]: crate::engine::PhysicalDialect::json_param
    pub fn to_json_param(&self) -> SqlValue {
        SqlValue::Text(self.to_json().to_string())
    }
}
