//! Schema mapper: derives a table's column model from a type's member list.
//!
//! Members are processed in declaration order:
//!
//! 1. members annotated `ignore` are skipped
//! 2. a member carrying a `multi_column` annotation (natively or through the
//!    registry) expands into one column per named sub-member, named
//!    `member_sub` unless the sub-member or the member carries a `column`
//!    annotation, in that order
//! 3. any other writable member produces exactly one column
//! 4. read-only members that are not expanded produce nothing
//!
//! Physical column names must be unique within a table, compared
//! case-insensitively; a clash fails the build with
//! [`SchemaError::DuplicateColumn`]. The resulting [`TableMapping`] is immutable
//! and can be shared freely.

use log::debug;
use serde::Serialize;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use super::annotations::{Annotation, AnnotationKind, IndexSpec};
use super::column::{Column, ColumnModel};
use super::errors::SchemaError;
use super::registry::AttributeRegistry;
use super::types::{MemberDescriptor, TypeCatalog, TypeDescriptor, ValueType};
use super::value::{CompositeValue, Value};
use crate::config::MapperConfig;

pub const DEFAULT_IMPLICIT_PK_NAME: &str = "Id";
pub const DEFAULT_IMPLICIT_INDEX_SUFFIX: &str = "Id";

/// Creation flags controlling naming-convention defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct CreateFlags(u8);

impl CreateFlags {
    pub const NONE: CreateFlags = CreateFlags(0);
    /// A member named like the implicit primary-key name becomes the primary key
    pub const IMPLICIT_PK: CreateFlags = CreateFlags(1);
    /// Non-key columns ending with the index suffix get a default index
    pub const IMPLICIT_INDEX: CreateFlags = CreateFlags(2);
    pub const ALL_IMPLICIT: CreateFlags = CreateFlags(3);
    /// Primary keys are auto-increment (auto-guid for uuid keys)
    pub const AUTO_INC_PK: CreateFlags = CreateFlags(4);

    pub fn contains(self, other: CreateFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Parse one flag name. Accepts `implicit_pk`, `ImplicitPK`,
    /// `ImplicitPrimaryKey` and the like.
    pub fn from_name(name: &str) -> Result<CreateFlags, SchemaError> {
        let normalized: String = name
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "none" => Ok(CreateFlags::NONE),
            "implicitpk" | "implicitprimarykey" => Ok(CreateFlags::IMPLICIT_PK),
            "implicitindex" => Ok(CreateFlags::IMPLICIT_INDEX),
            "allimplicit" => Ok(CreateFlags::ALL_IMPLICIT),
            "autoincpk" | "autoincrementprimarykey" => Ok(CreateFlags::AUTO_INC_PK),
            _ => Err(SchemaError::InvalidConfig {
                message: format!("Unknown create flag '{}'", name),
            }),
        }
    }

    /// Union of all named flags.
    pub fn from_names<I, S>(names: I) -> Result<CreateFlags, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter(|n| !n.as_ref().trim().is_empty())
            .try_fold(CreateFlags::NONE, |acc, n| {
                Ok(acc | CreateFlags::from_name(n.as_ref())?)
            })
    }
}

impl BitOr for CreateFlags {
    type Output = CreateFlags;

    fn bitor(self, rhs: CreateFlags) -> CreateFlags {
        CreateFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for CreateFlags {
    fn bitor_assign(&mut self, rhs: CreateFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for CreateFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(CreateFlags::IMPLICIT_PK) {
            names.push("implicit_pk");
        }
        if self.contains(CreateFlags::IMPLICIT_INDEX) {
            names.push("implicit_index");
        }
        if self.contains(CreateFlags::AUTO_INC_PK) {
            names.push("auto_inc_pk");
        }
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableMapping {
    pub mapped_type: String,
    pub table_name: String,
    pub create_flags: CreateFlags,
    /// Member declaration order; expansions are contiguous
    pub columns: Vec<Column>,
    /// Positional-placeholder select template, fixed at construction
    pub get_by_primary_key_sql: String,
    #[serde(skip)]
    pk_indices: Vec<usize>,
    #[serde(skip)]
    auto_pk: Option<usize>,
}

impl TableMapping {
    fn new(
        mapped_type: String,
        table_name: String,
        create_flags: CreateFlags,
        columns: Vec<Column>,
    ) -> Self {
        let pk_indices: Vec<usize> = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_pk)
            .map(|(i, _)| i)
            .collect();

        let auto_pk = match pk_indices.as_slice() {
            [only] if columns[*only].is_auto_inc => Some(*only),
            _ => None,
        };

        let get_by_primary_key_sql = match pk_indices.as_slice() {
            [] => format!("select * from \"{}\" limit 1", table_name),
            keys => {
                let clauses: Vec<String> = keys
                    .iter()
                    .map(|i| format!("\"{}\" = ?", columns[*i].name))
                    .collect();
                format!(
                    "select * from \"{}\" where {}",
                    table_name,
                    clauses.join(" and ")
                )
            }
        };

        Self {
            mapped_type,
            table_name,
            create_flags,
            columns,
            get_by_primary_key_sql,
            pk_indices,
            auto_pk,
        }
    }

    /// The single primary-key column, if any.
    ///
    /// Fails on composite keys; use [`TableMapping::composite_pk`] there.
    pub fn pk(&self) -> Result<Option<&Column>, SchemaError> {
        match self.pk_indices.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(&self.columns[*only])),
            _ => Err(SchemaError::AmbiguousPrimaryKey {
                table: self.table_name.clone(),
            }),
        }
    }

    /// All primary-key columns in declaration order.
    pub fn composite_pk(&self) -> Vec<&Column> {
        self.pk_indices.iter().map(|i| &self.columns[*i]).collect()
    }

    pub fn has_composite_pk(&self) -> bool {
        self.pk_indices.len() > 1
    }

    pub fn has_auto_inc_pk(&self) -> bool {
        self.auto_pk.is_some()
    }

    pub fn insert_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| !c.is_auto_inc).collect()
    }

    /// Column backed directly by member `name` (expansions are not matched).
    pub fn find_column_with_property_name(&self, name: &str) -> Option<&Column> {
        self.column_model().find_by_property(name)
    }

    /// Column by physical name, case-insensitive
    pub fn find_column(&self, column_name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(column_name))
    }

    /// Store a storage-generated id into the auto-increment key of `record`.
    ///
    /// Does nothing when the mapping has no auto-increment primary key.
    pub fn set_auto_inc_pk(&self, record: &mut CompositeValue, id: i64) -> Result<(), SchemaError> {
        match self.auto_pk {
            Some(i) => self.columns[i].set_value(record, Value::Integer(id)),
            None => Ok(()),
        }
    }

    pub fn column_model(&self) -> ColumnModel<'_> {
        ColumnModel::new(&self.columns)
    }
}

/// Builds [`TableMapping`]s from a [`TypeCatalog`] and an optional registry.
#[derive(Debug, Clone)]
pub struct SchemaMapper<'a> {
    catalog: &'a TypeCatalog,
    registry: Option<&'a AttributeRegistry>,
    implicit_pk_name: String,
    implicit_index_suffix: String,
}

impl<'a> SchemaMapper<'a> {
    pub fn new(catalog: &'a TypeCatalog) -> Self {
        Self {
            catalog,
            registry: None,
            implicit_pk_name: DEFAULT_IMPLICIT_PK_NAME.to_string(),
            implicit_index_suffix: DEFAULT_IMPLICIT_INDEX_SUFFIX.to_string(),
        }
    }

    pub fn with_registry(mut self, registry: &'a AttributeRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_config(mut self, config: &MapperConfig) -> Self {
        self.implicit_pk_name = config.implicit_pk_name.clone();
        self.implicit_index_suffix = config.implicit_index_suffix.clone();
        self
    }

    pub fn catalog(&self) -> &'a TypeCatalog {
        self.catalog
    }

    pub fn build_mapping(
        &self,
        type_name: &str,
        flags: CreateFlags,
    ) -> Result<TableMapping, SchemaError> {
        let descriptor = self.catalog.get_type(type_name)?;
        self.build_mapping_for(descriptor, flags)
    }

    /// Build a mapping for a type descriptor that need not be registered in the
    /// catalog. Member types must still resolve against the catalog.
    pub fn build_mapping_for(
        &self,
        descriptor: &TypeDescriptor,
        flags: CreateFlags,
    ) -> Result<TableMapping, SchemaError> {
        let table_name = self
            .type_annotations(&descriptor.name, &descriptor.annotations, AnnotationKind::Table)
            .into_iter()
            .find_map(|a| match a {
                Annotation::Table { name } => Some(name.clone()),
                _ => None,
            })
            .unwrap_or_else(|| descriptor.name.clone());

        let mut columns = Vec::new();
        for member in &descriptor.members {
            let annotations = self.member_annotations(&descriptor.name, member);
            if has_kind(&annotations, AnnotationKind::Ignore) {
                continue;
            }

            let multi = annotations.iter().find_map(|a| match a {
                Annotation::MultiColumn { members } => Some(members),
                _ => None,
            });

            if let Some(sub_members) = multi {
                self.expand_member(member, &annotations, sub_members, flags, &mut columns)?;
            } else if member.writable {
                let column = self.build_column(member, &annotations, None, flags)?;
                columns.push(column);
            }
        }

        check_unique_names(&table_name, &columns)?;
        let mapping = TableMapping::new(descriptor.name.clone(), table_name, flags, columns);
        debug!(
            "Built mapping for {} -> \"{}\" ({} columns, pk: {:?}, flags: {})",
            mapping.mapped_type,
            mapping.table_name,
            mapping.columns.len(),
            mapping
                .composite_pk()
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>(),
            flags
        );
        Ok(mapping)
    }

    fn expand_member(
        &self,
        member: &MemberDescriptor,
        annotations: &[&Annotation],
        sub_members: &[String],
        flags: CreateFlags,
        columns: &mut Vec<Column>,
    ) -> Result<(), SchemaError> {
        let composite_name = member.value_type.composite_name().ok_or_else(|| {
            SchemaError::NotComposite {
                member: member.name.clone(),
                value_type: member.value_type.to_string(),
            }
        })?;
        let composite = self.catalog.get_type(composite_name).map_err(|_| {
            SchemaError::unknown_type_with_context(
                composite_name,
                format!("While expanding member {}", member.name),
            )
        })?;

        for sub_name in sub_members {
            let sub = composite
                .member(sub_name)
                .ok_or_else(|| SchemaError::UnknownMember {
                    type_name: composite.name.clone(),
                    member: sub_name.clone(),
                })?;
            let sub_annotations = self.member_annotations(&composite.name, sub);
            let mut column =
                self.build_column(member, annotations, Some((sub, &sub_annotations)), flags)?;
            column.multi_column_count = sub_members.len();
            columns.push(column);
        }
        Ok(())
    }

    fn build_column(
        &self,
        member: &MemberDescriptor,
        annotations: &[&Annotation],
        sub: Option<(&MemberDescriptor, &Vec<&Annotation>)>,
        flags: CreateFlags,
    ) -> Result<Column, SchemaError> {
        // Storage facts come from the sub-member when expanded, falling back to
        // the outer member; key facts always come from the outer member.
        let facts: Vec<&Annotation> = match sub {
            Some((_, sub_annotations)) => sub_annotations
                .iter()
                .chain(annotations.iter())
                .copied()
                .collect(),
            None => annotations.to_vec(),
        };

        let name = match sub {
            Some((sub_member, sub_annotations)) => column_name_override(sub_annotations)
                .or_else(|| column_name_override(annotations))
                .unwrap_or_else(|| format!("{}_{}", member.name, sub_member.name)),
            None => column_name_override(annotations).unwrap_or_else(|| member.name.clone()),
        };

        let stored_type = match sub {
            Some((sub_member, _)) => &sub_member.value_type,
            None => &member.value_type,
        };
        let column_type = stored_type.strip_nullable().clone();
        let enum_type = match column_type.enum_name() {
            Some(enum_name) => Some(
                self.catalog
                    .get_enum(enum_name)
                    .cloned()
                    .ok_or_else(|| {
                        SchemaError::unknown_type_with_context(
                            enum_name,
                            format!("While mapping member {}", member.name),
                        )
                    })?,
            ),
            None => None,
        };

        let is_pk = has_kind(annotations, AnnotationKind::PrimaryKey)
            || (flags.contains(CreateFlags::IMPLICIT_PK)
                && member.name.eq_ignore_ascii_case(&self.implicit_pk_name));

        let is_auto = has_kind(annotations, AnnotationKind::AutoIncrement)
            || (is_pk && flags.contains(CreateFlags::AUTO_INC_PK));
        let is_auto_guid = is_auto && column_type == ValueType::Uuid;
        let is_auto_inc = is_auto && !is_auto_guid;

        let mut indices: Vec<IndexSpec> = facts
            .iter()
            .filter_map(|a| match a {
                Annotation::Indexed(spec) => Some(spec.clone()),
                _ => None,
            })
            .collect();
        if indices.is_empty()
            && !is_pk
            && flags.contains(CreateFlags::IMPLICIT_INDEX)
            && ends_with_ignore_case(&name, &self.implicit_index_suffix)
        {
            indices.push(IndexSpec::default());
        }

        let is_nullable = !(is_pk || has_kind(&facts, AnnotationKind::NotNull));

        Ok(Column {
            property_name: member.name.clone(),
            sub_property_name: sub
                .map(|(s, _)| s.name.clone())
                .unwrap_or_else(|| member.name.clone()),
            property_type: member.value_type.clone(),
            column_type,
            is_pk,
            is_auto_inc,
            is_auto_guid,
            is_nullable,
            max_string_length: facts.iter().find_map(|a| match a {
                Annotation::MaxLength(n) => Some(*n),
                _ => None,
            }),
            collation: facts.iter().find_map(|a| match a {
                Annotation::Collation(c) => Some(c.clone()),
                _ => None,
            }),
            default_value: facts.iter().find_map(|a| match a {
                Annotation::Default(v) => Some(v.clone()),
                _ => None,
            }),
            indices,
            is_multi_column: sub.is_some(),
            multi_column_count: 0,
            enum_type,
            sub_member: sub.map(|(s, _)| s.name.clone()),
            name,
        })
    }

    /// Native member annotations followed by everything the registry has for it.
    fn member_annotations<'m>(
        &'m self,
        declaring_type: &str,
        member: &'m MemberDescriptor,
    ) -> Vec<&'m Annotation> {
        let mut found: Vec<&Annotation> = member.annotations.iter().collect();
        if let Some(registry) = self.registry {
            found.extend(registry.member_annotations(declaring_type, member));
        }
        found
    }

    fn type_annotations<'m>(
        &'m self,
        type_name: &str,
        native: &'m [Annotation],
        kind: AnnotationKind,
    ) -> Vec<&'m Annotation> {
        let mut found: Vec<&Annotation> = native.iter().filter(|a| a.is_kind(kind)).collect();
        if let Some(registry) = self.registry {
            found.extend(registry.annotations_for_type(type_name, kind));
        }
        found
    }
}

fn has_kind(annotations: &[&Annotation], kind: AnnotationKind) -> bool {
    annotations.iter().any(|a| a.is_kind(kind))
}

fn column_name_override(annotations: &[&Annotation]) -> Option<String> {
    annotations.iter().find_map(|a| match a {
        Annotation::Column { name } => Some(name.clone()),
        _ => None,
    })
}

fn check_unique_names(table: &str, columns: &[Column]) -> Result<(), SchemaError> {
    for (i, column) in columns.iter().enumerate() {
        if let Some(earlier) = columns[..i]
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(&column.name))
        {
            return Err(SchemaError::DuplicateColumn {
                table: table.to_string(),
                column: column.name.clone(),
                first: member_label(earlier),
                second: member_label(column),
            });
        }
    }
    Ok(())
}

fn member_label(column: &Column) -> String {
    match column.sub_member() {
        Some(sub) => format!("{}.{}", column.property_name, sub),
        None => column.property_name.clone(),
    }
}

fn ends_with_ignore_case(name: &str, suffix: &str) -> bool {
    name.len() >= suffix.len()
        && name
            .get(name.len() - suffix.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
}
