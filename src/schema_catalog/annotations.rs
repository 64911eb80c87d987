//! Declarative schema facts attached to types and members.
//!
//! Annotations are typed records. Each has an [`AnnotationKind`] tag, and can be
//! constructed eagerly from a kind plus a constructor-argument list, which is how
//! the registry and catalog definition files create them for types the mapper
//! does not own.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::SchemaError;
use super::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Table,
    Column,
    PrimaryKey,
    AutoIncrement,
    Ignore,
    Indexed,
    /// Constructs an [`Annotation::Indexed`] with `unique` set
    Unique,
    MaxLength,
    Collation,
    NotNull,
    Default,
    MultiColumn,
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnnotationKind::Table => "table",
            AnnotationKind::Column => "column",
            AnnotationKind::PrimaryKey => "primary_key",
            AnnotationKind::AutoIncrement => "auto_increment",
            AnnotationKind::Ignore => "ignore",
            AnnotationKind::Indexed => "indexed",
            AnnotationKind::Unique => "unique",
            AnnotationKind::MaxLength => "max_length",
            AnnotationKind::Collation => "collation",
            AnnotationKind::NotNull => "not_null",
            AnnotationKind::Default => "default",
            AnnotationKind::MultiColumn => "multi_column",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: Option<String>,
    pub order: i32,
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Annotation {
    Table { name: String },
    Column { name: String },
    PrimaryKey,
    AutoIncrement,
    Ignore,
    Indexed(IndexSpec),
    MaxLength(usize),
    Collation(String),
    NotNull,
    Default(Value),
    /// Expand a composite-valued member into one column per named sub-member
    MultiColumn { members: Vec<String> },
}

impl Annotation {
    pub fn kind(&self) -> AnnotationKind {
        match self {
            Annotation::Table { .. } => AnnotationKind::Table,
            Annotation::Column { .. } => AnnotationKind::Column,
            Annotation::PrimaryKey => AnnotationKind::PrimaryKey,
            Annotation::AutoIncrement => AnnotationKind::AutoIncrement,
            Annotation::Ignore => AnnotationKind::Ignore,
            Annotation::Indexed(_) => AnnotationKind::Indexed,
            Annotation::MaxLength(_) => AnnotationKind::MaxLength,
            Annotation::Collation(_) => AnnotationKind::Collation,
            Annotation::NotNull => AnnotationKind::NotNull,
            Annotation::Default(_) => AnnotationKind::Default,
            Annotation::MultiColumn { .. } => AnnotationKind::MultiColumn,
        }
    }

    /// Whether this annotation answers a lookup for `kind`.
    pub fn is_kind(&self, kind: AnnotationKind) -> bool {
        match kind {
            AnnotationKind::Unique => matches!(self, Annotation::Indexed(spec) if spec.unique),
            other => self.kind() == other,
        }
    }

    pub fn multi_column<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Annotation::MultiColumn {
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Construct an annotation from a kind tag and constructor arguments.
    ///
    /// | kind | arguments |
    /// |---|---|
    /// | `table`, `column`, `collation` | one string |
    /// | `primary_key`, `auto_increment`, `ignore`, `not_null` | none |
    /// | `indexed`, `unique` | optional index name, optional integer order |
    /// | `max_length` | one positive integer |
    /// | `default` | one value of any type |
    /// | `multi_column` | one or more sub-member names |
    pub fn construct(kind: AnnotationKind, args: &[Value]) -> Result<Self, SchemaError> {
        match kind {
            AnnotationKind::Table => Ok(Annotation::Table {
                name: single_text(kind, args)?,
            }),
            AnnotationKind::Column => Ok(Annotation::Column {
                name: single_text(kind, args)?,
            }),
            AnnotationKind::Collation => Ok(Annotation::Collation(single_text(kind, args)?)),
            AnnotationKind::PrimaryKey => no_args(kind, args).map(|_| Annotation::PrimaryKey),
            AnnotationKind::AutoIncrement => {
                no_args(kind, args).map(|_| Annotation::AutoIncrement)
            }
            AnnotationKind::Ignore => no_args(kind, args).map(|_| Annotation::Ignore),
            AnnotationKind::NotNull => no_args(kind, args).map(|_| Annotation::NotNull),
            AnnotationKind::Indexed | AnnotationKind::Unique => {
                if args.len() > 2 {
                    return Err(SchemaError::invalid_args(
                        kind,
                        format!("expected at most 2 arguments, got {}", args.len()),
                    ));
                }
                let name = match args.first() {
                    None | Some(Value::Null) => None,
                    Some(Value::Text(s)) => Some(s.clone()),
                    Some(other) => {
                        return Err(SchemaError::invalid_args(
                            kind,
                            format!("index name must be a string, got {}", other),
                        ))
                    }
                };
                let order = match args.get(1) {
                    None => 0,
                    Some(Value::Integer(i)) => i32::try_from(*i).map_err(|_| {
                        SchemaError::invalid_args(kind, format!("index order {} out of range", i))
                    })?,
                    Some(other) => {
                        return Err(SchemaError::invalid_args(
                            kind,
                            format!("index order must be an integer, got {}", other),
                        ))
                    }
                };
                Ok(Annotation::Indexed(IndexSpec {
                    name,
                    order,
                    unique: kind == AnnotationKind::Unique,
                }))
            }
            AnnotationKind::MaxLength => match args {
                [Value::Integer(n)] if *n > 0 => Ok(Annotation::MaxLength(*n as usize)),
                _ => Err(SchemaError::invalid_args(
                    kind,
                    "expected one positive integer",
                )),
            },
            AnnotationKind::Default => match args {
                [value] => Ok(Annotation::Default(value.clone())),
                _ => Err(SchemaError::invalid_args(kind, "expected exactly one value")),
            },
            AnnotationKind::MultiColumn => {
                if args.is_empty() {
                    return Err(SchemaError::invalid_args(
                        kind,
                        "expected at least one sub-member name",
                    ));
                }
                let members = args
                    .iter()
                    .map(|a| match a {
                        Value::Text(s) => Ok(s.clone()),
                        other => Err(SchemaError::invalid_args(
                            kind,
                            format!("sub-member names must be strings, got {}", other),
                        )),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Annotation::MultiColumn { members })
            }
        }
    }
}

fn single_text(kind: AnnotationKind, args: &[Value]) -> Result<String, SchemaError> {
    match args {
        [Value::Text(s)] if !s.is_empty() => Ok(s.clone()),
        _ => Err(SchemaError::invalid_args(kind, "expected one non-empty string")),
    }
}

fn no_args(kind: AnnotationKind, args: &[Value]) -> Result<(), SchemaError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::invalid_args(
            kind,
            format!("takes no arguments, got {}", args.len()),
        ))
    }
}

/// First annotation of `kind` in `annotations`
pub fn find_annotation(annotations: &[Annotation], kind: AnnotationKind) -> Option<&Annotation> {
    annotations.iter().find(|a| a.is_kind(kind))
}

pub fn has_annotation(annotations: &[Annotation], kind: AnnotationKind) -> bool {
    find_annotation(annotations, kind).is_some()
}
