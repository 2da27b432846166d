use std::num::{ParseFloatError, ParseIntError};

use derive_builder::UninitializedFieldError;
use thiserror::Error;

/// Errors of a single record (one node block, one job line).
///
/// [`ParseError::NumericParse`] means the scheduler output changed shape in a way we can't
/// interpret, so callers abort the run. [`ParseError::MissingField`] only fails the record it
/// happened in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("field `{field}`: {value:?} is not a number")]
    NumericParse {
        field: &'static str,
        value: String,
        #[source]
        source: NumberError,
    },
    #[error("missing field `{field}`")]
    MissingField { field: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberError {
    #[error("no value after `=`")]
    NoValue,
    #[error("scalar part is not an integer")]
    InvalidInt(#[from] ParseIntError),
    #[error("scalar part is not a number")]
    InvalidFloat(#[from] ParseFloatError),
}

impl ParseError {
    pub fn numeric(field: &'static str, value: impl Into<String>, source: impl Into<NumberError>) -> Self {
        ParseError::NumericParse {
            field,
            value: value.into(),
            source: source.into(),
        }
    }

    /// `false` only for errors that affect just the record at hand.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ParseError::MissingField { .. })
    }
}

impl From<UninitializedFieldError> for ParseError {
    fn from(value: UninitializedFieldError) -> Self {
        ParseError::MissingField {
            field: value.field_name(),
        }
    }
}
