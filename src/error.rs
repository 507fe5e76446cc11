// ABOUTME: RuntimeError, the single failure channel shared by parsing and evaluation

use crate::value::Value;
use thiserror::Error;

/// The one failure kind this crate's public API ever returns (§7 of the
/// spec). Parse-time and eval-time failures share this channel; the REPL
/// catches it once per top-level form and resumes reading.
#[derive(Error, Debug, Clone)]
pub enum RuntimeError {
    /// A reserved form was written with the wrong shape: bad arity, a
    /// non-symbol where a name is required, a malformed bindings list, or a
    /// malformed `cond` clause.
    #[error("{form}: {message}")]
    MalformedForm { form: String, message: String },

    #[error("unbound variable: {0}")]
    UnboundVariable(String),

    #[error("{function}: expected {expected}, got {actual} at argument {position}")]
    TypeError {
        function: String,
        expected: String,
        actual: String,
        position: usize,
    },

    #[error("{function}: expected {expected} argument(s), got {actual}")]
    ArityError {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("{function}: division by zero")]
    DivisionByZero { function: String },

    #[error("expt: overflow")]
    ExptOverflow,

    #[error("expt: negative exponent is not supported")]
    ExptNegativeExponent,

    #[error("expt: 0^0 is undefined")]
    ExptZeroToTheZero,

    #[error("attempt to apply a non-procedure value of type {actual}")]
    NotProcedure { actual: String },

    #[error("unknown primitive: {0}")]
    UnknownPrimitive(String),

    #[error("cannot redefine primitive: {0}")]
    RedefinePrimitive(String),

    #[error("malformed quoted list: {0}")]
    MalformedQuote(String),
}

impl RuntimeError {
    pub fn malformed(form: impl Into<String>, message: impl Into<String>) -> Self {
        RuntimeError::MalformedForm {
            form: form.into(),
            message: message.into(),
        }
    }

    pub fn type_error(function: &str, expected: &str, actual: &Value, position: usize) -> Self {
        RuntimeError::TypeError {
            function: function.to_string(),
            expected: expected.to_string(),
            actual: actual.type_name().to_string(),
            position,
        }
    }

    pub fn arity(function: &str, expected: impl Into<String>, actual: usize) -> Self {
        RuntimeError::ArityError {
            function: function.to_string(),
            expected: expected.into(),
            actual,
        }
    }
}
