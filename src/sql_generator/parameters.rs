//! Named statement parameters produced while compiling a predicate.
//!
//! Names carry their `:` prefix (`:Nome`, `:Nome0`) and keep allocation order,
//! which is also the order they appear in the generated fragment.

use log::trace;
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::errors::CompileError;
use crate::schema_catalog::Value;

/// Suffixes `0..MAX_NAME_SUFFIX` are tried after the bare name is taken
pub const MAX_NAME_SUFFIX: usize = 50;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterTable {
    entries: Vec<(String, Value)>,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == name)
    }

    /// Bind `name`, replacing any previous value
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Move every binding of `other` into this table
    pub fn extend(&mut self, other: ParameterTable) {
        for (name, value) in other.entries {
            self.insert(name, value);
        }
    }
}

impl Serialize for ParameterTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Pick the parameter name for `column`: `:column` when free, else the first
/// free `:column0` .. `:column49`.
pub fn allocate_parameter_name(
    column: &str,
    is_taken: impl Fn(&str) -> bool,
) -> Result<String, CompileError> {
    let base = format!(":{}", column);
    if !is_taken(&base) {
        trace!("Allocated parameter {}", base);
        return Ok(base);
    }

    for suffix in 0..MAX_NAME_SUFFIX {
        let candidate = format!("{}{}", base, suffix);
        if !is_taken(&candidate) {
            trace!("Allocated parameter {} ({} taken)", candidate, base);
            return Ok(candidate);
        }
    }

    Err(CompileError::TooManyParameters { name: base })
}
