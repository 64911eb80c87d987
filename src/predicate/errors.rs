//! Error types for predicate composition.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PredicateError {
    #[error("Cannot combine predicates over {left} and {right} parameters")]
    ParameterArityMismatch { left: usize, right: usize },

    #[error("Parameter {position} ranges over `{left}` in one predicate and `{right}` in the other")]
    ParameterTypeMismatch {
        position: usize,
        left: String,
        right: String,
    },
}
