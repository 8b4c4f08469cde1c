use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use jtable_commons::SqlValue;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

use super::{CanonicalValue, TypeError};

static VARCHAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^VARCHAR(?:\((\d+)\))?$").unwrap());
static DECIMAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^DECIMAL(?:\((\d+)(?:,(\d+))?\))?$").unwrap());

const DEFAULT_VARCHAR_LENGTH: u32 = 255;
const DEFAULT_DECIMAL_PRECISION: u32 = 10;
const DEFAULT_DECIMAL_SCALE: u32 = 0;
/// Largest precision representable by `rust_decimal`
const MAX_DECIMAL_PRECISION: u32 = 28;

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Closed set of column types a virtual table can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDescriptor {
    /// `TINYINT`
    Bool,
    Timestamp,
    /// `INT` and every `INT*` spelling
    Int,
    Varchar { length: u32 },
    Decimal { precision: u32, scale: u32 },
}

impl TypeDescriptor {
    /// Parse a type spec as recorded in the catalog.
    ///
    /// Matching is case-insensitive and ignores whitespace, so `decimal(10, 2)`
    /// and `DECIMAL(10,2)` describe the same type.
    pub fn parse(type_spec: &str) -> Result<Self, TypeError> {
        let spec: String = type_spec
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();
        let unsupported = || TypeError::Unsupported(type_spec.to_string());

        if spec.starts_with("TINYINT") {
            return Ok(TypeDescriptor::Bool);
        }
        if spec.starts_with("TIMESTAMP") {
            return Ok(TypeDescriptor::Timestamp);
        }
        if spec.starts_with("INT") {
            return Ok(TypeDescriptor::Int);
        }

        if let Some(caps) = VARCHAR_RE.captures(&spec) {
            let length = match caps.get(1) {
                Some(m) => m.as_str().parse::<u32>().map_err(|_| unsupported())?,
                None => DEFAULT_VARCHAR_LENGTH,
            };
            return Ok(TypeDescriptor::Varchar { length });
        }

        if let Some(caps) = DECIMAL_RE.captures(&spec) {
            let precision = match caps.get(1) {
                Some(m) => m.as_str().parse::<u32>().map_err(|_| unsupported())?,
                None => DEFAULT_DECIMAL_PRECISION,
            };
            let scale = match caps.get(2) {
                Some(m) => m.as_str().parse::<u32>().map_err(|_| unsupported())?,
                None => DEFAULT_DECIMAL_SCALE,
            };
            if precision == 0 || precision > MAX_DECIMAL_PRECISION || scale > precision {
                return Err(unsupported());
            }
            return Ok(TypeDescriptor::Decimal { precision, scale });
        }

        Err(unsupported())
    }

    /// Target type used when extracting the value with a typed JSON accessor.
    pub fn returning_type(&self) -> String {
        match self {
            TypeDescriptor::Bool | TypeDescriptor::Int => "SIGNED".to_string(),
            TypeDescriptor::Timestamp => "DATETIME".to_string(),
            TypeDescriptor::Varchar { length } => format!("CHAR({})", length),
            TypeDescriptor::Decimal { precision, scale } => {
                format!("DECIMAL({}, {})", precision, scale)
            },
        }
    }

    /// Validate a raw scalar and coerce it into this type.
    ///
    /// NULL is accepted by every type; nullability is a column property.
    pub fn validate(&self, raw: &SqlValue) -> Result<CanonicalValue, TypeError> {
        if raw.is_null() {
            return Ok(CanonicalValue::Null);
        }

        match self {
            TypeDescriptor::Bool => self.validate_bool(raw),
            TypeDescriptor::Timestamp => self.validate_timestamp(raw),
            TypeDescriptor::Int => self.validate_int(raw),
            TypeDescriptor::Varchar { length } => Self::validate_varchar(raw, *length),
            TypeDescriptor::Decimal { precision, scale } => {
                self.validate_decimal(raw, *precision, *scale)
            },
        }
    }

    fn mismatch(&self, raw: &SqlValue) -> TypeError {
        TypeError::Mismatch {
            expected: self.to_string(),
            value: raw.to_string(),
        }
    }

    fn validate_bool(&self, raw: &SqlValue) -> Result<CanonicalValue, TypeError> {
        let value = match raw {
            SqlValue::Bool(b) => Some(*b),
            SqlValue::Int(0) => Some(false),
            SqlValue::Int(1) => Some(true),
            SqlValue::Float(f) if *f == 0.0 => Some(false),
            SqlValue::Float(f) if *f == 1.0 => Some(true),
            SqlValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "t" | "yes" | "y" | "on" => Some(true),
                "0" | "false" | "f" | "no" | "n" | "off" => Some(false),
                _ => None,
            },
            _ => None,
        };
        value.map(CanonicalValue::Bool).ok_or_else(|| self.mismatch(raw))
    }

    fn validate_timestamp(&self, raw: &SqlValue) -> Result<CanonicalValue, TypeError> {
        let value = match raw {
            SqlValue::Text(s) => parse_timestamp(s.trim()),
            SqlValue::Int(secs) => DateTime::from_timestamp(*secs, 0).map(|dt| dt.naive_utc()),
            _ => None,
        };
        value.map(CanonicalValue::Timestamp).ok_or_else(|| self.mismatch(raw))
    }

    fn validate_int(&self, raw: &SqlValue) -> Result<CanonicalValue, TypeError> {
        let value = match raw {
            SqlValue::Int(i) => Some(*i),
            SqlValue::Bool(b) => Some(i64::from(*b)),
            SqlValue::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(*f as i64),
            SqlValue::Text(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        value.map(CanonicalValue::Int).ok_or_else(|| self.mismatch(raw))
    }

    fn validate_varchar(raw: &SqlValue, max: u32) -> Result<CanonicalValue, TypeError> {
        let text = match raw {
            SqlValue::Text(s) => s.clone(),
            SqlValue::Int(i) => i.to_string(),
            SqlValue::Float(f) => f.to_string(),
            SqlValue::Bool(b) => i64::from(*b).to_string(),
            SqlValue::Null => return Ok(CanonicalValue::Null),
        };

        let length = text.chars().count();
        if length > max as usize {
            return Err(TypeError::TooLong { length, max });
        }
        Ok(CanonicalValue::Varchar(text))
    }

    fn validate_decimal(
        &self,
        raw: &SqlValue,
        precision: u32,
        scale: u32,
    ) -> Result<CanonicalValue, TypeError> {
        let value = match raw {
            SqlValue::Int(i) => Some(Decimal::from(*i)),
            SqlValue::Float(f) => parse_decimal(&f.to_string()),
            SqlValue::Text(s) => parse_decimal(s.trim()),
            _ => None,
        }
        .ok_or_else(|| self.mismatch(raw))?;

        let digits = value.abs().to_string();
        let (integer_part, fractional_part) = digits.split_once('.').unwrap_or((&digits, ""));
        let integer_digits = integer_part.len() as u32;
        let fractional_digits = fractional_part.len() as u32;

        if integer_digits + fractional_digits.min(scale) > precision {
            return Err(TypeError::DecimalOutOfRange {
                value: value.to_string(),
                precision,
                scale,
            });
        }

        let value = if fractional_digits > scale {
            value.round_dp_with_strategy(scale, RoundingStrategy::ToZero)
        } else {
            value
        };
        Ok(CanonicalValue::Decimal(value))
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s).ok().or_else(|| Decimal::from_scientific(s).ok())
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Bool => write!(f, "TINYINT"),
            TypeDescriptor::Timestamp => write!(f, "TIMESTAMP"),
            TypeDescriptor::Int => write!(f, "INT"),
            TypeDescriptor::Varchar { length } => write!(f, "VARCHAR({})", length),
            TypeDescriptor::Decimal { precision, scale } => {
                write!(f, "DECIMAL({},{})", precision, scale)
            },
        }
    }
}
