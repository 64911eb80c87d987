//! # Schema Error Types
//!
//! Error handling for type catalogs, annotation binding, table mapping
//! construction and catalog definition loading.
//!
//! ## Error Categories
//!
//! - **Catalog Errors**: Unknown types, members or enum values
//! - **Annotation Errors**: Annotation kinds constructed with unusable arguments
//! - **Mapping Errors**: Primary-key misuse on a built mapping
//! - **Configuration Errors**: File I/O and parsing issues while loading definitions
//!
//! ## Usage Patterns
//!
//! When returning schema errors, use context helpers to say where the lookup happened:
//!
//! ```ignore
//! SchemaError::unknown_type_with_context(
//!     "CloudID",
//!     "While resolving member Entity.RefID"
//! )
//! ```

use thiserror::Error;

use super::annotations::AnnotationKind;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaError {
    #[error("Table `{table}` has a composite primary key; use the composite primary key accessor instead")]
    AmbiguousPrimaryKey { table: String },
    #[error("No type definition found for `{type_name}`")]
    UnknownType { type_name: String },
    #[error("Type `{type_name}` has no member named `{member}`")]
    UnknownMember { type_name: String, member: String },
    #[error("Member `{member}` is declared as `{value_type}`, which is not a composite type")]
    NotComposite { member: String, value_type: String },
    #[error("Invalid arguments for `{kind}` annotation: {reason}")]
    InvalidAnnotationArgs { kind: AnnotationKind, reason: String },
    #[error("Members `{first}` and `{second}` of table `{table}` both map to column `{column}`")]
    DuplicateColumn {
        table: String,
        column: String,
        first: String,
        second: String,
    },
    #[error("Value `{value}` is not a member of enum `{enum_name}`")]
    InvalidEnumValue { enum_name: String, value: String },
    #[error("Failed to read catalog definition: {error}")]
    ConfigReadError { error: String },
    #[error("Failed to parse catalog definition: {error}")]
    ConfigParseError { error: String },
    #[error("Invalid catalog definition: {message}")]
    InvalidConfig { message: String },
}

/// Helper methods for creating errors with context information
impl SchemaError {
    /// Create an UnknownType error with context information
    ///
    /// # Example
    /// ```ignore
    /// SchemaError::unknown_type_with_context("CloudID", "While resolving member Entity.RefID")
    /// ```
    pub fn unknown_type_with_context(
        type_name: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        SchemaError::UnknownType {
            type_name: format!("{}\n  Context: {}", type_name.into(), context.into()),
        }
    }

    /// Create an InvalidAnnotationArgs error
    pub fn invalid_args(kind: AnnotationKind, reason: impl Into<String>) -> Self {
        SchemaError::InvalidAnnotationArgs {
            kind,
            reason: reason.into(),
        }
    }

    /// Create a configuration error with context information
    ///
    /// # Example
    /// ```ignore
    /// SchemaError::config_error_with_context("catalog.yaml", "While parsing bindings")
    /// ```
    pub fn config_error_with_context(
        config_path: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        SchemaError::InvalidConfig {
            message: format!(
                "Configuration error in '{}': {}\n  Context: {}",
                config_path.into(),
                "failed to load",
                context.into()
            ),
        }
    }
}
