//! Physical columns of a table mapping.
//!
//! A [`Column`] reads its value either through one member (`outer`) or through an
//! outer member followed by exactly one sub-member (`outer.sub`), the latter for
//! columns produced by multi-column expansion of a composite member.

use serde::Serialize;

use super::annotations::IndexSpec;
use super::errors::SchemaError;
use super::types::{EnumDescriptor, ValueType};
use super::value::{CompositeValue, EnumValue, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    /// Physical column name
    pub name: String,
    /// Name of the originating (outer) member, also for expanded columns
    pub property_name: String,
    /// Sub-member name for expanded columns, otherwise the outer member name
    pub sub_property_name: String,
    /// Declared type of the outer member
    pub property_type: ValueType,
    /// Nullable-stripped type of the value stored in this column
    pub column_type: ValueType,
    pub is_pk: bool,
    pub is_auto_inc: bool,
    pub is_auto_guid: bool,
    pub is_nullable: bool,
    pub max_string_length: Option<usize>,
    pub collation: Option<String>,
    pub default_value: Option<Value>,
    pub indices: Vec<IndexSpec>,
    pub is_multi_column: bool,
    pub multi_column_count: usize,
    /// Variants of `column_type` when it is an enum
    pub enum_type: Option<EnumDescriptor>,
    #[serde(skip)]
    pub(crate) sub_member: Option<String>,
}

impl Column {
    pub fn sub_member(&self) -> Option<&str> {
        self.sub_member.as_deref()
    }

    /// Read this column's value from a record of the mapped type.
    ///
    /// For expanded columns the outer member is read first; when it is absent the
    /// column value is null and the sub-member is never consulted.
    pub fn get_value(&self, record: &CompositeValue) -> Value {
        let outer = record.get(&self.property_name);
        match (&self.sub_member, outer) {
            (None, Some(value)) => value.clone(),
            (None, None) => Value::Null,
            (Some(sub), Some(Value::Composite(inner))) => {
                inner.get(sub).cloned().unwrap_or(Value::Null)
            }
            (Some(_), _) => Value::Null,
        }
    }

    /// Write a raw stored value into a record of the mapped type.
    ///
    /// Enum-typed targets accept the stored ordinal or variant name and are
    /// coerced to an enum value; a null raw value leaves an enum member untouched.
    /// For expanded columns an absent outer value is created first.
    pub fn set_value(&self, record: &mut CompositeValue, raw: Value) -> Result<(), SchemaError> {
        let value = match &self.enum_type {
            Some(enum_type) => match coerce_enum(enum_type, raw)? {
                Some(v) => v,
                None => return Ok(()),
            },
            None => raw,
        };

        let Some(sub) = &self.sub_member else {
            record.set(self.property_name.clone(), value);
            return Ok(());
        };

        let outer_type = self
            .property_type
            .composite_name()
            .ok_or_else(|| SchemaError::NotComposite {
                member: self.property_name.clone(),
                value_type: self.property_type.to_string(),
            })?
            .to_string();

        let needs_outer = !matches!(record.get(&self.property_name), Some(Value::Composite(_)));
        if needs_outer {
            record.set(
                self.property_name.clone(),
                Value::Composite(CompositeValue::new(outer_type)),
            );
        }
        if let Some(Value::Composite(inner)) = record.get_mut(&self.property_name) {
            inner.set(sub.clone(), value);
        }
        Ok(())
    }
}

fn coerce_enum(enum_type: &EnumDescriptor, raw: Value) -> Result<Option<Value>, SchemaError> {
    let invalid = |value: String| SchemaError::InvalidEnumValue {
        enum_name: enum_type.name.clone(),
        value,
    };
    match raw {
        Value::Null => Ok(None),
        Value::Integer(ordinal) => enum_type
            .variant_name(ordinal)
            .map(|variant| Some(Value::Enum(EnumValue::new(&enum_type.name, variant))))
            .ok_or_else(|| invalid(ordinal.to_string())),
        Value::Text(name) if enum_type.has_variant(&name) => {
            Ok(Some(Value::Enum(EnumValue::new(&enum_type.name, name))))
        }
        Value::Enum(e) if e.type_name == enum_type.name && enum_type.has_variant(&e.variant) => {
            Ok(Some(Value::Enum(e)))
        }
        other => Err(invalid(other.to_string())),
    }
}

/// Read-only view over a mapping's columns used for member-path resolution.
///
/// Resolution is bounded to two levels: `outer` or `outer.sub`.
#[derive(Debug, Clone, Copy)]
pub struct ColumnModel<'a> {
    columns: &'a [Column],
}

impl<'a> ColumnModel<'a> {
    pub fn new(columns: &'a [Column]) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &'a [Column] {
        self.columns
    }

    /// Column backed directly by member `property` (not an expansion).
    pub fn find_by_property(&self, property: &str) -> Option<&'a Column> {
        self.columns
            .iter()
            .find(|c| c.property_name == property && c.sub_member.is_none())
    }

    /// Column produced by expanding `outer` for sub-member `sub`.
    pub fn find_part(&self, outer: &str, sub: &str) -> Option<&'a Column> {
        self.columns
            .iter()
            .find(|c| c.property_name == outer && c.sub_member.as_deref() == Some(sub))
    }

    /// All columns expanded from composite member `outer`, in mapping order.
    pub fn multi_columns(&self, outer: &str) -> Vec<&'a Column> {
        self.columns
            .iter()
            .filter(|c| c.property_name == outer && c.is_multi_column)
            .collect()
    }

    /// Resolve a member path rooted at the mapped type to its column.
    pub fn resolve(&self, path: &[&str]) -> Option<&'a Column> {
        match path {
            [outer] => self.find_by_property(outer),
            [outer, sub] => self.find_part(outer, sub),
            _ => None,
        }
    }
}
