//! Type shape declarations
//!
//! Rust has no runtime reflection, so mapped types describe themselves through
//! [`TypeDescriptor`]s: an ordered list of [`MemberDescriptor`]s, each carrying a
//! declared [`ValueType`], a writability flag and any annotations declared
//! directly on the member.
//!
//! # Supported value types
//!
//! - `bool`, `integer`, `float`, `string`, `datetime`, `uuid`, `blob`
//! - an enum declared in the catalog (stored by variant name)
//! - a composite type declared in the catalog (expandable into several columns)
//! - any of the above wrapped as nullable (`string?`, `TypeTest?`)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::annotations::Annotation;
use super::errors::SchemaError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Bool,
    Integer,
    Float,
    Text,
    DateTime,
    Uuid,
    Blob,
    /// Enum declared in the catalog, by name
    Enum(String),
    /// Composite type declared in the catalog, by name
    Composite(String),
    Nullable(Box<ValueType>),
}

impl ValueType {
    pub fn nullable(inner: ValueType) -> Self {
        match inner {
            ValueType::Nullable(_) => inner,
            other => ValueType::Nullable(Box::new(other)),
        }
    }

    /// The type with any nullable wrapper removed
    pub fn strip_nullable(&self) -> &ValueType {
        match self {
            ValueType::Nullable(inner) => inner.strip_nullable(),
            other => other,
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, ValueType::Nullable(_))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.strip_nullable(), ValueType::Enum(_))
    }

    pub fn enum_name(&self) -> Option<&str> {
        match self.strip_nullable() {
            ValueType::Enum(name) => Some(name),
            _ => None,
        }
    }

    pub fn composite_name(&self) -> Option<&str> {
        match self.strip_nullable() {
            ValueType::Composite(name) => Some(name),
            _ => None,
        }
    }

    /// Key under which type-level registry bindings for this type are stored.
    pub fn type_key(&self) -> &str {
        match self.strip_nullable() {
            ValueType::Bool => "bool",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Text => "string",
            ValueType::DateTime => "datetime",
            ValueType::Uuid => "uuid",
            ValueType::Blob => "blob",
            ValueType::Enum(name) | ValueType::Composite(name) => name,
            ValueType::Nullable(inner) => inner.type_key(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Nullable(inner) => write!(f, "{}?", inner),
            other => f.write_str(other.type_key()),
        }
    }
}

/// Enum type: variants in ordinal order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDescriptor {
    pub name: String,
    pub variants: Vec<String>,
}

impl EnumDescriptor {
    pub fn new<I, S>(name: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    pub fn variant_name(&self, ordinal: i64) -> Option<&str> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|i| self.variants.get(i))
            .map(String::as_str)
    }

    pub fn ordinal_of(&self, variant: &str) -> Option<i64> {
        self.variants
            .iter()
            .position(|v| v == variant)
            .map(|i| i as i64)
    }

    pub fn has_variant(&self, variant: &str) -> bool {
        self.variants.iter().any(|v| v == variant)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberDescriptor {
    pub name: String,
    pub value_type: ValueType,
    /// Read-only members cannot be persisted unless they are expanded into columns
    pub writable: bool,
    /// Annotations declared directly on the member
    pub annotations: Vec<Annotation>,
}

impl MemberDescriptor {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            writable: true,
            annotations: Vec::new(),
        }
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeDescriptor {
    pub name: String,
    /// Members in declaration order
    pub members: Vec<MemberDescriptor>,
    /// Annotations declared directly on the type
    pub annotations: Vec<Annotation>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn with_member(mut self, member: MemberDescriptor) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// All type and enum declarations known to a mapper
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: HashMap<String, TypeDescriptor>,
    enums: HashMap<String, EnumDescriptor>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.add_type(descriptor);
        self
    }

    pub fn with_enum(mut self, descriptor: EnumDescriptor) -> Self {
        self.add_enum(descriptor);
        self
    }

    pub fn add_type(&mut self, descriptor: TypeDescriptor) {
        self.types.insert(descriptor.name.clone(), descriptor);
    }

    pub fn add_enum(&mut self, descriptor: EnumDescriptor) {
        self.enums.insert(descriptor.name.clone(), descriptor);
    }

    pub fn get_type(&self, name: &str) -> Result<&TypeDescriptor, SchemaError> {
        self.types.get(name).ok_or_else(|| SchemaError::UnknownType {
            type_name: name.to_string(),
        })
    }

    pub fn get_enum(&self, name: &str) -> Option<&EnumDescriptor> {
        self.enums.get(name)
    }

    pub fn contains_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Resolve a type reference as written in catalog definitions.
    ///
    /// Primitive names are case-insensitive and accept common aliases; any other
    /// name must be a declared enum or composite type. A trailing `?` marks the
    /// type nullable.
    pub fn parse_type_ref(&self, s: &str) -> Result<ValueType, SchemaError> {
        let trimmed = s.trim();
        if let Some(inner) = trimmed.strip_suffix('?') {
            return Ok(ValueType::nullable(self.parse_type_ref(inner)?));
        }

        let primitive = match trimmed.to_lowercase().as_str() {
            "bool" | "boolean" => Some(ValueType::Bool),
            "integer" | "int" | "long" => Some(ValueType::Integer),
            "float" | "double" | "decimal" => Some(ValueType::Float),
            "string" | "text" => Some(ValueType::Text),
            "datetime" | "timestamp" => Some(ValueType::DateTime),
            "uuid" | "guid" => Some(ValueType::Uuid),
            "blob" | "bytes" => Some(ValueType::Blob),
            _ => None,
        };
        if let Some(t) = primitive {
            return Ok(t);
        }

        if self.enums.contains_key(trimmed) {
            Ok(ValueType::Enum(trimmed.to_string()))
        } else if self.types.contains_key(trimmed) {
            Ok(ValueType::Composite(trimmed.to_string()))
        } else {
            Err(SchemaError::UnknownType {
                type_name: trimmed.to_string(),
            })
        }
    }
}
