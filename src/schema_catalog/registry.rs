//! Metadata registry for late-bound annotations.
//!
//! Some types cannot carry annotations themselves, typically value types
//! defined elsewhere that are used as composite members. The registry records
//! annotations for them from the outside:
//!
//! - **type binds**: annotations for a type, also visible on every member declared
//!   with that type
//! - **member binds**: annotations for one member of one type
//! - **name binds**: annotations for members of a given type that are literally
//!   named `name`
//!
//! Lookup for a member concatenates all three sources, in that order.
//!
//! # Example
//! ```ignore
//! let registry = AttributeRegistry::new()
//!     .bind("Entity", AnnotationKind::Table, [Value::from("MyEntity")])?
//!     .bind("CloudID", AnnotationKind::MultiColumn, [Value::from("PartitionID"), Value::from("EntityID")])?
//!     .bind_by_name("CloudID", "ID", AnnotationKind::PrimaryKey, [])?
//!     .bind_member("Entity", "Nome")
//!     .to([Annotation::MaxLength(64)]);
//! ```

use log::{debug, warn};
use std::collections::HashMap;

use super::annotations::{Annotation, AnnotationKind};
use super::errors::SchemaError;
use super::types::MemberDescriptor;
use super::value::Value;

/// Member selector: a member name on a declaring type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberKey {
    pub type_name: String,
    pub member: String,
}

impl MemberKey {
    pub fn new(type_name: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            member: member.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct NameBind {
    name: String,
    annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Default)]
pub struct AttributeRegistry {
    type_binds: HashMap<String, Vec<Annotation>>,
    member_binds: HashMap<MemberKey, Vec<Annotation>>,
    name_binds: HashMap<String, Vec<NameBind>>,
}

/// Second step of a member binding; see [`AttributeRegistry::bind_member`].
#[must_use = "a member binding does nothing until `to` supplies the annotations"]
pub struct MemberBinding {
    registry: AttributeRegistry,
    key: MemberKey,
}

impl MemberBinding {
    /// Attach `annotations` to the selected member and return the registry.
    ///
    /// Binding the same member twice accumulates both sets.
    pub fn to<I>(mut self, annotations: I) -> AttributeRegistry
    where
        I: IntoIterator<Item = Annotation>,
    {
        let entry = self.registry.member_binds.entry(self.key.clone()).or_default();
        if !entry.is_empty() {
            warn!(
                "Member {}.{} bound more than once; annotations accumulate",
                self.key.type_name, self.key.member
            );
        }
        entry.extend(annotations);
        debug!(
            "Registry: bound {} annotation(s) to member {}.{}",
            entry.len(),
            self.key.type_name,
            self.key.member
        );
        self.registry
    }
}

impl AttributeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a type-level annotation constructed from `kind` and `args`.
    pub fn bind<I>(
        mut self,
        type_name: impl Into<String>,
        kind: AnnotationKind,
        args: I,
    ) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = Value>,
    {
        let args: Vec<Value> = args.into_iter().collect();
        let annotation = Annotation::construct(kind, &args)?;
        let type_name = type_name.into();
        debug!("Registry: bound {} to type {}", kind, type_name);
        self.type_binds.entry(type_name).or_default().push(annotation);
        Ok(self)
    }

    /// Select a member; annotations are supplied by [`MemberBinding::to`].
    pub fn bind_member(
        self,
        type_name: impl Into<String>,
        member: impl Into<String>,
    ) -> MemberBinding {
        MemberBinding {
            registry: self,
            key: MemberKey::new(type_name, member),
        }
    }

    /// Record an annotation for members of type `type_name` literally named `name`.
    pub fn bind_by_name<I>(
        mut self,
        type_name: impl Into<String>,
        name: impl Into<String>,
        kind: AnnotationKind,
        args: I,
    ) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = Value>,
    {
        let args: Vec<Value> = args.into_iter().collect();
        let annotation = Annotation::construct(kind, &args)?;
        let type_name = type_name.into();
        let name = name.into();
        debug!("Registry: bound {} to members named {} of type {}", kind, name, type_name);

        let binds = self.name_binds.entry(type_name).or_default();
        match binds.iter_mut().find(|b| b.name == name) {
            Some(existing) => existing.annotations.push(annotation),
            None => binds.push(NameBind {
                name,
                annotations: vec![annotation],
            }),
        }
        Ok(self)
    }

    /// All type-level annotations of `kind` bound to `type_name`.
    pub fn annotations_for_type(&self, type_name: &str, kind: AnnotationKind) -> Vec<&Annotation> {
        self.type_binds
            .get(type_name)
            .map(|anns| anns.iter().filter(|a| a.is_kind(kind)).collect())
            .unwrap_or_default()
    }

    /// All annotations of `kind` visible on `member` of `declaring_type`.
    pub fn annotations_for_member(
        &self,
        declaring_type: &str,
        member: &MemberDescriptor,
        kind: AnnotationKind,
    ) -> Vec<&Annotation> {
        self.member_annotations(declaring_type, member)
            .into_iter()
            .filter(|a| a.is_kind(kind))
            .collect()
    }

    /// Every annotation visible on `member`: member binds, then binds on the
    /// member's declared type, then name binds on that type matching the member.
    pub fn member_annotations(
        &self,
        declaring_type: &str,
        member: &MemberDescriptor,
    ) -> Vec<&Annotation> {
        let mut found: Vec<&Annotation> = Vec::new();

        let key = MemberKey::new(declaring_type, member.name.as_str());
        if let Some(anns) = self.member_binds.get(&key) {
            found.extend(anns.iter());
        }

        let member_type = member.value_type.type_key();
        if let Some(anns) = self.type_binds.get(member_type) {
            found.extend(anns.iter());
        }

        if let Some(binds) = self.name_binds.get(member_type) {
            for bind in binds.iter().filter(|b| b.name == member.name) {
                found.extend(bind.annotations.iter());
            }
        }

        found
    }

    pub fn is_empty(&self) -> bool {
        self.type_binds.is_empty() && self.member_binds.is_empty() && self.name_binds.is_empty()
    }
}
