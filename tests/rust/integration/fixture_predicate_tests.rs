//! Predicates loaded from JSON files, as the CLI reads them

use std::path::PathBuf;

use rowmap::predicate::visitors::{MemberPathCollector, ParameterCollector};
use rowmap::predicate::Lambda;
use rowmap::schema_catalog::{CreateFlags, MappingCache, Value};
use rowmap::sql_generator::{compile_filter, render_inline};

use super::common::load_catalog;

fn load_predicate(name: &str) -> anyhow::Result<Lambda> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

#[test]
fn test_fixture_predicate_shape() -> anyhow::Result<()> {
    let predicate = load_predicate("not_deleted_named.json")?;
    assert_eq!(predicate.parameter_types(), vec!["Entity"]);
    assert_eq!(ParameterCollector::collect(&predicate.body).len(), 1);

    let paths: Vec<Vec<String>> = MemberPathCollector::collect(&predicate.body)
        .into_iter()
        .map(|(_, path)| path)
        .collect();
    assert_eq!(paths, vec![vec!["Deleted".to_string()], vec!["Nome".to_string()]]);
    Ok(())
}

#[test]
fn test_fixture_predicate_compiles_and_inlines() -> anyhow::Result<()> {
    let loaded = load_catalog();
    let cache = MappingCache::with_defaults(loaded.mapper());
    let mapping = cache.get_or_build("Entity", CreateFlags::NONE)?;

    let compiled = compile_filter(&mapping, &load_predicate("not_deleted_named.json")?)?;
    assert_eq!(compiled.sql, "((Deleted = :Deleted) and (Nome >= :Nome))");
    assert_eq!(compiled.parameters.get(":Nome"), Some(&Value::from("O'Brien")));

    let inline = render_inline(&compiled.sql, &compiled.parameters)?;
    assert_eq!(inline, "((Deleted = 0) and (Nome >= 'O''Brien'))");

    let json = serde_json::to_value(&compiled)?;
    assert_eq!(json["sql"], compiled.sql.as_str());
    assert_eq!(json["parameters"][":Deleted"], serde_json::json!({ "bool": false }));
    Ok(())
}

#[test]
fn test_composite_fixture_reuses_cached_mapping() -> anyhow::Result<()> {
    let loaded = load_catalog();
    let cache = MappingCache::with_defaults(loaded.mapper());

    let first = cache.get_or_build("Entity", CreateFlags::NONE)?;
    let second = cache.get_or_build("Entity", CreateFlags::NONE)?;
    assert!(std::sync::Arc::ptr_eq(&first, &second));

    let compiled = compile_filter(&second, &load_predicate("ref_equals.json")?)?;
    assert_eq!(
        compiled.sql,
        "((RefID_PartitionID = :RefID_PartitionID) and (RefID_EntityID = :RefID_EntityID))"
    );
    assert_eq!(cache.metrics().hits, 1);
    Ok(())
}
