use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CompileError {
    #[error("Unsupported expression in predicate: {0}")]
    UnsupportedExpression(String),
    #[error("Unknown operator: {0} (registered comparators: Eq, Ne, Gt, Ge, Lt, Le)")]
    UnknownOperator(String),
    #[error("Too many parameters named {name} (at most 50 suffixed variants per compilation)")]
    TooManyParameters { name: String },
    #[error("No column found for member path '{0}' (only `member` and `member.sub` resolve)")]
    ColumnNotFound(String),
    #[error("Value `{value}` is not a member of enum `{enum_name}`")]
    InvalidEnumValue { enum_name: String, value: String },
    #[error("Expected a composite value to compare against '{0}'")]
    CompositeValueExpected(String),
}

/// Helper for creating errors with context
impl CompileError {
    /// Create an UnsupportedExpression error naming the offending node and where it was found
    pub fn unsupported_with_context(expr: impl std::fmt::Display, context: &str) -> Self {
        CompileError::UnsupportedExpression(format!("{} ({})", expr, context))
    }
}
