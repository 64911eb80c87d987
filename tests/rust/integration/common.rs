//! Shared catalog and predicate helpers

use rowmap::predicate::builders::{member, param};
use rowmap::predicate::{ParameterRef, PredicateExpr};
use rowmap::schema_catalog::{CatalogConfig, CreateFlags, LoadedCatalog, TableMapping, ValueType};

pub const ENTITY_CATALOG: &str = include_str!("../../fixtures/entity_catalog.yaml");

pub fn load_catalog() -> LoadedCatalog {
    CatalogConfig::from_yaml_str(ENTITY_CATALOG)
        .and_then(|config| config.to_catalog())
        .expect("fixture catalog should load")
}

pub fn entity_mapping(flags: CreateFlags) -> TableMapping {
    load_catalog()
        .mapper()
        .build_mapping("Entity", flags)
        .expect("Entity should map")
}

pub fn subject(name: &str) -> ParameterRef {
    param(name, "Entity")
}

pub fn nome(p: &ParameterRef) -> PredicateExpr {
    member(p.expr(), "Nome", ValueType::Text)
}

pub fn deleted(p: &ParameterRef) -> PredicateExpr {
    member(p.expr(), "Deleted", ValueType::Bool)
}

pub fn ref_id(p: &ParameterRef) -> PredicateExpr {
    member(p.expr(), "RefID", ValueType::Composite("CloudID".into()))
}

pub fn kind(p: &ParameterRef) -> PredicateExpr {
    member(
        p.expr(),
        "Type",
        ValueType::nullable(ValueType::Enum("TypeTest".into())),
    )
}
