//! Multi-column expansion of composite members, end to end

use rowmap::predicate::builders::*;
use rowmap::schema_catalog::{CompositeValue, CreateFlags, EnumValue, SchemaError, Value, ValueType};
use rowmap::sql_generator::{compile_filter, CompileError};

use super::common::{entity_mapping, load_catalog, ref_id, subject};

fn cloud_id(partition: &str, entity: &str) -> CompositeValue {
    CompositeValue::new("CloudID")
        .with_field("PartitionID", partition)
        .with_field("EntityID", entity)
}

#[test]
fn test_entity_columns_in_declaration_order() {
    let mapping = entity_mapping(CreateFlags::NONE);
    let names: Vec<&str> = mapping.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Nome",
            "RefID_PartitionID",
            "RefID_EntityID",
            "Type",
            "ID_PartitionID",
            "ID_EntityID",
            "Deleted",
            "DeletedAt",
        ]
    );

    let deleted_at = mapping.find_column("DeletedAt").unwrap();
    assert_eq!(deleted_at.column_type, ValueType::DateTime);
    assert!(deleted_at.is_nullable);
}

#[test]
fn test_composite_primary_key() {
    let mapping = entity_mapping(CreateFlags::NONE);

    assert!(mapping.has_composite_pk());
    assert!(matches!(
        mapping.pk(),
        Err(SchemaError::AmbiguousPrimaryKey { .. })
    ));
    let pk: Vec<&str> = mapping.composite_pk().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(pk, vec!["ID_PartitionID", "ID_EntityID"]);
    assert_eq!(
        mapping.get_by_primary_key_sql,
        "select * from \"MyEntity\" where \"ID_PartitionID\" = ? and \"ID_EntityID\" = ?"
    );
}

#[test]
fn test_mapping_is_idempotent() {
    let loaded = load_catalog();
    let mapper = loaded.mapper();
    let first = mapper.build_mapping("Entity", CreateFlags::ALL_IMPLICIT).unwrap();
    let second = mapper.build_mapping("Entity", CreateFlags::ALL_IMPLICIT).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_composite_equality_expands_per_column() {
    let mapping = entity_mapping(CreateFlags::NONE);
    let e = subject("e");
    let compiled = compile_filter(
        &mapping,
        &lambda([e.clone()], eq(ref_id(&e), lit(cloud_id("pID", "eID")))),
    )
    .unwrap();

    assert_eq!(
        compiled.sql,
        "((RefID_PartitionID = :RefID_PartitionID) and (RefID_EntityID = :RefID_EntityID))"
    );
    let bound: Vec<(&str, &Value)> = compiled.parameters.iter().collect();
    assert_eq!(
        bound,
        vec![
            (":RefID_PartitionID", &Value::from("pID")),
            (":RefID_EntityID", &Value::from("eID")),
        ]
    );
}

#[test]
fn test_composite_equality_with_captured_record_member() {
    let mapping = entity_mapping(CreateFlags::NONE);
    let e = subject("e");
    // A captured record whose `Ref` field holds the id to match
    let captured = CompositeValue::new("Holder").with_field("Ref", cloud_id("p", "x"));

    let compiled = compile_filter(
        &mapping,
        &lambda(
            [e.clone()],
            eq(
                ref_id(&e),
                member(lit(captured), "Ref", ValueType::Composite("CloudID".into())),
            ),
        ),
    )
    .unwrap();
    assert_eq!(compiled.parameters.get(":RefID_EntityID"), Some(&Value::from("x")));
}

#[test]
fn test_sub_member_access() {
    let mapping = entity_mapping(CreateFlags::NONE);
    let e = subject("e");
    let compiled = compile_filter(
        &mapping,
        &lambda(
            [e.clone()],
            eq(member(ref_id(&e), "EntityID", ValueType::Text), lit("eID")),
        ),
    )
    .unwrap();

    assert_eq!(compiled.sql, "(RefID_EntityID = :RefID_EntityID)");
    assert_eq!(compiled.parameters.len(), 1);
}

#[test]
fn test_composite_equality_rejects_scalars() {
    let mapping = entity_mapping(CreateFlags::NONE);
    let e = subject("e");
    let err = compile_filter(&mapping, &lambda([e.clone()], eq(ref_id(&e), lit("eID")))).unwrap_err();
    assert!(matches!(err, CompileError::CompositeValueExpected(_)));
}

#[test]
fn test_record_round_trip_through_columns() {
    let mapping = entity_mapping(CreateFlags::NONE);

    let mut record = CompositeValue::new("Entity");
    for (column, raw) in [
        ("Nome", Value::from("abc")),
        ("RefID_PartitionID", Value::from("pID")),
        ("RefID_EntityID", Value::from("eID")),
        ("Type", Value::Integer(1)),
        ("Deleted", Value::Bool(false)),
    ] {
        mapping
            .find_column(column)
            .unwrap()
            .set_value(&mut record, raw)
            .unwrap();
    }

    assert_eq!(record.get("RefID"), Some(&Value::Composite(cloud_id("pID", "eID"))));
    assert_eq!(
        record.get("Type"),
        Some(&Value::Enum(EnumValue::new("TypeTest", "Const2")))
    );

    let ref_entity = mapping.find_column("RefID_EntityID").unwrap();
    assert_eq!(ref_entity.get_value(&record), Value::from("eID"));
    // Absent outer value reads as null without consulting the sub-member
    assert_eq!(
        mapping.find_column("ID_EntityID").unwrap().get_value(&record),
        Value::Null
    );
}
