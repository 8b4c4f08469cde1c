//! Type Descriptor Registry
//!
//! Maps a textual column type (`VARCHAR(30)`, `DECIMAL(10,2)`, `INT`,
//! `TIMESTAMP`, `TINYINT`) to a [`TypeDescriptor`] and validates raw scalars
//! into [`CanonicalValue`]s ready to be written into a JSON payload.

mod descriptor;
mod value;

pub use descriptor::TypeDescriptor;
pub use value::CanonicalValue;

use thiserror::Error;

/// Failure to parse a type spec or to coerce a value into it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("Unsupported type: {0}")]
    Unsupported(String),

    #[error("string of length {length} exceeds VARCHAR({max})")]
    TooLong { length: usize, max: u32 },

    #[error("{value} does not fit DECIMAL({precision},{scale})")]
    DecimalOutOfRange {
        value: String,
        precision: u32,
        scale: u32,
    },

    #[error("cannot convert {value} to {expected}")]
    Mismatch { expected: String, value: String },
}
