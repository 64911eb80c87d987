//! Catalog definition files.
//!
//! Types, enums and registry bindings can be declared in YAML (or JSON) instead
//! of being assembled in code:
//!
//! ```yaml
//! enums:
//!   - name: TypeTest
//!     variants: [Const1, Const2]
//! types:
//!   - name: CloudID
//!     members:
//!       - { name: PartitionID, type: string }
//!       - { name: EntityID, type: string }
//!   - name: Entity
//!     members:
//!       - { name: Nome, type: string, writable: false }
//!       - { name: RefID, type: CloudID, writable: false }
//!       - name: Type
//!         type: TypeTest
//!         annotations:
//!           - { kind: indexed, args: [ix_type] }
//! bindings:
//!   - { scope: type, type: Entity, kind: table, args: [MyEntity] }
//!   - { scope: type, type: CloudID, kind: multi_column, args: [PartitionID, EntityID] }
//!   - { scope: name, type: CloudID, name: ID, kind: primary_key }
//!   - { scope: member, type: Entity, member: Nome, kind: max_length, args: [64] }
//! ```
//!
//! Member annotations declared inline behave like annotations written on the
//! member itself; `bindings` populate an [`AttributeRegistry`].

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use super::annotations::{Annotation, AnnotationKind};
use super::errors::SchemaError;
use super::registry::AttributeRegistry;
use super::table_mapping::SchemaMapper;
use super::types::{EnumDescriptor, MemberDescriptor, TypeCatalog, TypeDescriptor};
use super::value::Value;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Catalog definition as written in a file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub enums: Vec<EnumDefinition>,
    #[serde(default)]
    pub types: Vec<TypeDefinition>,
    #[serde(default)]
    pub bindings: Vec<BindingDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumDefinition {
    pub name: String,
    /// Variants in ordinal order
    pub variants: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub name: String,
    #[serde(default)]
    pub members: Vec<MemberDefinition>,
    #[serde(default)]
    pub annotations: Vec<AnnotationDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDefinition {
    pub name: String,
    /// Type reference, e.g. `string`, `datetime?`, `CloudID`
    #[serde(rename = "type")]
    pub type_ref: String,
    #[serde(default = "default_writable")]
    pub writable: bool,
    #[serde(default)]
    pub annotations: Vec<AnnotationDefinition>,
}

fn default_writable() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationDefinition {
    pub kind: AnnotationKind,
    #[serde(default)]
    pub args: Vec<ArgValue>,
}

/// Scalar annotation constructor argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<&ArgValue> for Value {
    fn from(arg: &ArgValue) -> Self {
        match arg {
            ArgValue::Bool(b) => Value::Bool(*b),
            ArgValue::Integer(i) => Value::Integer(*i),
            ArgValue::Float(x) => Value::Float(*x),
            ArgValue::Text(s) => Value::Text(s.clone()),
        }
    }
}

/// Registry binding, tagged by `scope`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum BindingDefinition {
    Type {
        #[serde(rename = "type")]
        type_name: String,
        kind: AnnotationKind,
        #[serde(default)]
        args: Vec<ArgValue>,
    },
    Member {
        #[serde(rename = "type")]
        type_name: String,
        member: String,
        kind: AnnotationKind,
        #[serde(default)]
        args: Vec<ArgValue>,
    },
    Name {
        #[serde(rename = "type")]
        type_name: String,
        name: String,
        kind: AnnotationKind,
        #[serde(default)]
        args: Vec<ArgValue>,
    },
}

/// A catalog definition resolved into its runtime form
#[derive(Debug, Clone, Default)]
pub struct LoadedCatalog {
    pub catalog: TypeCatalog,
    pub registry: AttributeRegistry,
}

impl LoadedCatalog {
    /// Schema mapper over this catalog and its registry
    pub fn mapper(&self) -> SchemaMapper<'_> {
        SchemaMapper::new(&self.catalog).with_registry(&self.registry)
    }
}

fn args_to_values(args: &[ArgValue]) -> Vec<Value> {
    args.iter().map(Value::from).collect()
}

fn construct(def: &AnnotationDefinition) -> Result<Annotation, SchemaError> {
    Annotation::construct(def.kind, &args_to_values(&def.args))
}

fn check_identifier(kind: &str, ident: &str) -> Result<(), SchemaError> {
    if IDENTIFIER.is_match(ident) {
        Ok(())
    } else {
        Err(SchemaError::InvalidConfig {
            message: format!("Invalid {} name '{}'", kind, ident),
        })
    }
}

impl CatalogConfig {
    /// Load a catalog definition from a file; `.json` files are parsed as JSON,
    /// anything else as YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| SchemaError::ConfigReadError {
            error: format!("{}: {}", path.display(), e),
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_yaml_str(&contents)
        }
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let contents = fs::read_to_string(path).map_err(|e| SchemaError::ConfigReadError {
            error: e.to_string(),
        })?;

        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, SchemaError> {
        serde_yaml::from_str(yaml).map_err(|e| SchemaError::ConfigParseError {
            error: e.to_string(),
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(json).map_err(|e| SchemaError::ConfigParseError {
            error: e.to_string(),
        })
    }

    /// Structural validation: identifier syntax and duplicate names
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut seen_names = HashSet::new();

        for def in &self.enums {
            check_identifier("enum", &def.name)?;
            if !seen_names.insert(def.name.as_str()) {
                return Err(SchemaError::InvalidConfig {
                    message: format!("Duplicate type name: {}", def.name),
                });
            }
            if def.variants.is_empty() {
                return Err(SchemaError::InvalidConfig {
                    message: format!("Enum {} declares no variants", def.name),
                });
            }
            let mut seen_variants = HashSet::new();
            for variant in &def.variants {
                check_identifier("enum variant", variant)?;
                if !seen_variants.insert(variant.as_str()) {
                    return Err(SchemaError::InvalidConfig {
                        message: format!("Duplicate variant {}.{}", def.name, variant),
                    });
                }
            }
        }

        for def in &self.types {
            check_identifier("type", &def.name)?;
            if !seen_names.insert(def.name.as_str()) {
                return Err(SchemaError::InvalidConfig {
                    message: format!("Duplicate type name: {}", def.name),
                });
            }
            let mut seen_members = HashSet::new();
            for member in &def.members {
                check_identifier("member", &member.name)?;
                if !seen_members.insert(member.name.as_str()) {
                    return Err(SchemaError::InvalidConfig {
                        message: format!("Duplicate member {}.{}", def.name, member.name),
                    });
                }
            }
        }

        for binding in &self.bindings {
            match binding {
                BindingDefinition::Type { type_name, .. } => check_identifier("type", type_name)?,
                BindingDefinition::Member {
                    type_name, member, ..
                } => {
                    check_identifier("type", type_name)?;
                    check_identifier("member", member)?;
                }
                BindingDefinition::Name {
                    type_name, name, ..
                } => {
                    check_identifier("type", type_name)?;
                    check_identifier("member", name)?;
                }
            }
        }

        Ok(())
    }

    /// Validate and resolve into a [`TypeCatalog`] plus [`AttributeRegistry`].
    ///
    /// Type references may point forward to types declared later in the file.
    pub fn to_catalog(&self) -> Result<LoadedCatalog, SchemaError> {
        self.validate()?;

        let mut catalog = TypeCatalog::new();
        for def in &self.enums {
            catalog.add_enum(EnumDescriptor::new(&def.name, def.variants.iter().cloned()));
        }
        // Register every name before resolving member types
        for def in &self.types {
            catalog.add_type(TypeDescriptor::new(&def.name));
        }

        let mut descriptors = Vec::with_capacity(self.types.len());
        for def in &self.types {
            let mut descriptor = TypeDescriptor::new(&def.name);
            for ann in &def.annotations {
                descriptor = descriptor.with_annotation(construct(ann)?);
            }
            for member in &def.members {
                let value_type = catalog.parse_type_ref(&member.type_ref).map_err(|_| {
                    SchemaError::unknown_type_with_context(
                        member.type_ref.trim(),
                        format!("While resolving member {}.{}", def.name, member.name),
                    )
                })?;
                let mut md = MemberDescriptor::new(&member.name, value_type);
                md.writable = member.writable;
                for ann in &member.annotations {
                    md = md.with_annotation(construct(ann)?);
                }
                descriptor = descriptor.with_member(md);
            }
            descriptors.push(descriptor);
        }
        for descriptor in descriptors {
            catalog.add_type(descriptor);
        }

        let mut registry = AttributeRegistry::new();
        for binding in &self.bindings {
            registry = match binding {
                BindingDefinition::Type {
                    type_name,
                    kind,
                    args,
                } => {
                    let key = catalog.parse_type_ref(type_name)?;
                    registry.bind(key.type_key(), *kind, args_to_values(args))?
                }
                BindingDefinition::Member {
                    type_name,
                    member,
                    kind,
                    args,
                } => {
                    let descriptor = catalog.get_type(type_name)?;
                    if descriptor.member(member).is_none() {
                        return Err(SchemaError::UnknownMember {
                            type_name: type_name.clone(),
                            member: member.clone(),
                        });
                    }
                    let annotation = Annotation::construct(*kind, &args_to_values(args))?;
                    registry.bind_member(type_name.as_str(), member.as_str()).to([annotation])
                }
                BindingDefinition::Name {
                    type_name,
                    name,
                    kind,
                    args,
                } => {
                    let key = catalog.parse_type_ref(type_name)?;
                    registry.bind_by_name(key.type_key(), name.as_str(), *kind, args_to_values(args))?
                }
            };
        }

        debug!(
            "Loaded catalog{}: {} types, {} enums, {} bindings",
            self.name
                .as_deref()
                .map(|n| format!(" '{}'", n))
                .unwrap_or_default(),
            self.types.len(),
            self.enums.len(),
            self.bindings.len()
        );

        Ok(LoadedCatalog { catalog, registry })
    }
}
