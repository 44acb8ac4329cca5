//! Error types shared across the crate
//!
//! Each layer has its own error enum (`ValidationError` for builders,
//! `ParseError` for reports, `GrammarError` for fragments, `ExecuteError`
//! for the executor). `CdoError` unifies them for callers that cross layers.

use thiserror::Error;

use crate::executor::ExecuteError;
use crate::parser::GrammarError;
use crate::report::ParseError;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, CdoError>;

#[derive(Error, Debug)]
pub enum CdoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Missing source: '{fragment}' is not bound to an input")]
    MissingSource { fragment: String },
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Execution(#[from] ExecuteError),
    #[error("No parser registered for report kind '{kind}'")]
    NotFound { kind: String },
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    #[error("Config error: {0}")]
    Config(String),
}

#[cfg(feature = "config")]
impl From<toml::de::Error> for CdoError {
    fn from(e: toml::de::Error) -> Self {
        CdoError::Config(e.to_string())
    }
}

/// A builder call received an argument it cannot serialize
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid argument '{parameter}' for '{operation}': {kind}")]
pub struct ValidationError {
    /// Operator the argument was meant for
    pub operation: String,
    /// Parameter name as the wrapper declares it
    pub parameter: String,
    pub kind: ValidationErrorKind,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationErrorKind {
    #[error("at least one value is required")]
    EmptyArgument,
    #[error("value {value} is out of range, expected {expected}")]
    OutOfRange { value: String, expected: String },
    #[error("value {value:?} contains reserved character {character:?}")]
    InvalidCharacter { value: String, character: char },
    #[error("operator name is empty")]
    EmptyName,
    #[error("{value} is not a finite number")]
    NonFinite { value: f64 },
}

impl ValidationError {
    pub fn new(operation: &str, parameter: &str, kind: ValidationErrorKind) -> Self {
        ValidationError {
            operation: operation.to_string(),
            parameter: parameter.to_string(),
            kind,
        }
    }

    pub fn empty(operation: &str, parameter: &str) -> Self {
        Self::new(operation, parameter, ValidationErrorKind::EmptyArgument)
    }

    pub fn out_of_range(
        operation: &str,
        parameter: &str,
        value: impl ToString,
        expected: impl Into<String>,
    ) -> Self {
        Self::new(
            operation,
            parameter,
            ValidationErrorKind::OutOfRange {
                value: value.to_string(),
                expected: expected.into(),
            },
        )
    }

    pub fn is_empty_argument(&self) -> bool {
        self.kind == ValidationErrorKind::EmptyArgument
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_names_parameter() {
        let err = ValidationError::empty("selname", "names");
        assert_eq!(
            err.to_string(),
            "Invalid argument 'names' for 'selname': at least one value is required"
        );
        assert!(err.is_empty_argument());
    }

    #[test]
    fn out_of_range_carries_value_and_expectation() {
        let err = ValidationError::out_of_range("selmon", "months", 13, "1..=12");
        match &err.kind {
            ValidationErrorKind::OutOfRange { value, expected } => {
                assert_eq!(value, "13");
                assert_eq!(expected, "1..=12");
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn validation_converts_into_cdo_error() {
        let err: CdoError = ValidationError::empty("selname", "names").into();
        assert!(matches!(err, CdoError::Validation(_)));
    }
}
