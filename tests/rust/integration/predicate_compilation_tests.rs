//! Predicates compiled against the fixture Entity mapping

use rowmap::predicate::builders::*;
use rowmap::predicate::combinators;
use rowmap::predicate::BinaryOperator;
use rowmap::schema_catalog::{CreateFlags, EnumValue, Value, ValueType};
use rowmap::sql_generator::{
    compile, compile_filter, compile_lambda, render_inline, CompileError, ParameterTable,
};
use test_case::test_case;

use super::common::{deleted, entity_mapping, kind, nome, subject};

#[test]
fn test_boolean_member_predicate() {
    let mapping = entity_mapping(CreateFlags::NONE);
    let e = subject("e");
    let compiled = compile_filter(&mapping, &lambda([e.clone()], eq(deleted(&e), lit(true)))).unwrap();

    assert_eq!(compiled.sql, "(Deleted = :Deleted)");
    assert_eq!(compiled.parameters.len(), 1);
    assert_eq!(compiled.parameters.get(":Deleted"), Some(&Value::Bool(true)));
}

#[test_case(BinaryOperator::Equal, "Eq", "=" ; "equal")]
#[test_case(BinaryOperator::NotEqual, "Ne", "<>" ; "not equal")]
#[test_case(BinaryOperator::GreaterThan, "Gt", ">" ; "greater than")]
#[test_case(BinaryOperator::GreaterThanOrEqual, "Ge", ">=" ; "greater or equal")]
#[test_case(BinaryOperator::LessThan, "Lt", "<" ; "less than")]
#[test_case(BinaryOperator::LessThanOrEqual, "Le", "<=" ; "less or equal")]
fn test_operator_and_method_forms_agree(operator: BinaryOperator, method: &str, token: &str) {
    let mapping = entity_mapping(CreateFlags::NONE);
    let e = subject("e");

    let by_operator = compile_filter(
        &mapping,
        &lambda([e.clone()], binary(operator, nome(&e), lit("abc"))),
    )
    .unwrap();
    let by_method =
        compile_filter(&mapping, &lambda([e.clone()], call(method, [nome(&e), lit("abc")]))).unwrap();

    assert_eq!(by_operator, by_method);
    assert_eq!(by_operator.sql, format!("(Nome {} :Nome)", token));
    assert_eq!(by_operator.parameters.get(":Nome"), Some(&Value::from("abc")));
}

#[test_case(lit(EnumValue::new("TypeTest", "Const1")), "Const1" ; "enum value")]
#[test_case(lit(1), "Const2" ; "ordinal")]
#[test_case(lit("Const2"), "Const2" ; "variant name")]
#[test_case(convert(lit(EnumValue::new("TypeTest", "Const1")), ValueType::nullable(ValueType::Enum("TypeTest".into()))), "Const1" ; "nullable conversion")]
fn test_enum_comparisons_bind_variant_names(value: rowmap::predicate::PredicateExpr, expected: &str) {
    let mapping = entity_mapping(CreateFlags::NONE);
    let e = subject("e");
    let compiled = compile_filter(&mapping, &lambda([e.clone()], eq(kind(&e), value))).unwrap();

    assert_eq!(compiled.sql, "(Type = :Type)");
    assert_eq!(compiled.parameters.get(":Type"), Some(&Value::from(expected)));
}

#[test]
fn test_enum_comparison_rejects_foreign_values() {
    let mapping = entity_mapping(CreateFlags::NONE);
    let e = subject("e");
    let err = compile_filter(&mapping, &lambda([e.clone()], eq(kind(&e), lit("Const9")))).unwrap_err();
    assert_eq!(
        err,
        CompileError::InvalidEnumValue {
            enum_name: "TypeTest".to_string(),
            value: "Const9".to_string()
        }
    );
}

#[test]
fn test_combined_predicates_compile_like_handwritten() {
    let mapping = entity_mapping(CreateFlags::NONE);
    let x = subject("x");
    let e = subject("e");

    let combined = combinators::and(
        lambda([x.clone()], eq(deleted(&x), lit(false))),
        lambda([e.clone()], eq(nome(&e), lit("abc"))),
    )
    .unwrap();
    let manual = lambda(
        [x.clone()],
        and_also(eq(deleted(&x), lit(false)), eq(nome(&x), lit("abc"))),
    );

    let from_combined = compile_filter(&mapping, &combined).unwrap();
    let from_manual = compile_filter(&mapping, &manual).unwrap();
    assert_eq!(from_combined, from_manual);
    assert_eq!(from_combined.sql, "((Deleted = :Deleted) and (Nome = :Nome))");
}

#[test]
fn test_or_combinator_and_negation() {
    let mapping = entity_mapping(CreateFlags::NONE);
    let a = subject("a");
    let b = subject("b");

    let combined = combinators::or(
        lambda([a.clone()], not(eq(deleted(&a), lit(true)))),
        lambda([b.clone()], ne(nome(&b), lit(Value::Null))),
    )
    .unwrap();
    let compiled = compile_filter(&mapping, &combined).unwrap();
    assert_eq!(compiled.sql, "(not (Deleted = :Deleted) or (Nome <> :Nome))");
    assert_eq!(compiled.parameters.get(":Nome"), Some(&Value::Null));
}

#[test]
fn test_parameter_collisions_in_tree_order() {
    let mapping = entity_mapping(CreateFlags::NONE);
    let e = subject("e");
    let pred = lambda(
        [e.clone()],
        or_else(
            eq(nome(&e), lit("first")),
            or_else(eq(nome(&e), lit("second")), eq(nome(&e), lit("third"))),
        ),
    );

    let compiled = compile_filter(&mapping, &pred).unwrap();
    assert_eq!(
        compiled.sql,
        "((Nome = :Nome) or ((Nome = :Nome0) or (Nome = :Nome1)))"
    );
    assert_eq!(compiled.parameters.get(":Nome"), Some(&Value::from("first")));
    assert_eq!(compiled.parameters.get(":Nome0"), Some(&Value::from("second")));
    assert_eq!(compiled.parameters.get(":Nome1"), Some(&Value::from("third")));
}

#[test]
fn test_shared_accumulator_across_calls() {
    let mapping = entity_mapping(CreateFlags::NONE);
    let e = subject("e");
    let mut parameters = ParameterTable::new();

    let first = compile_lambda(
        &lambda([e.clone()], eq(nome(&e), lit("a"))),
        mapping.column_model(),
        &mut parameters,
    )
    .unwrap();
    let second = compile(
        &eq(nome(&e), lit("b")),
        &["Entity"],
        mapping.column_model(),
        &mut parameters,
    )
    .unwrap();

    assert_eq!(first, "(Nome = :Nome)");
    assert_eq!(second, "(Nome = :Nome0)");
    assert_eq!(parameters.len(), 2);
}

#[test]
fn test_subject_is_chosen_by_parameter_type() {
    let mapping = entity_mapping(CreateFlags::NONE);
    let e = subject("e");
    let mut parameters = ParameterTable::new();

    // Not a subject type: the member chain is not a column reference
    let err = compile(
        &eq(nome(&e), lit("a")),
        &["Order"],
        mapping.column_model(),
        &mut parameters,
    )
    .unwrap_err();
    assert!(matches!(err, CompileError::UnsupportedExpression(_)));
    assert!(parameters.is_empty());
}

#[test]
fn test_too_many_parameters() {
    let mapping = entity_mapping(CreateFlags::NONE);
    let e = subject("e");

    let fifty_one = (0..51)
        .map(|i| eq(nome(&e), lit(i64::from(i))))
        .reduce(or_else)
        .unwrap();
    let compiled = compile_filter(&mapping, &lambda([e.clone()], fifty_one.clone())).unwrap();
    assert!(compiled.parameters.contains(":Nome49"));

    let fifty_two = or_else(fifty_one, eq(nome(&e), lit(99)));
    let err = compile_filter(&mapping, &lambda([e.clone()], fifty_two)).unwrap_err();
    assert_eq!(
        err,
        CompileError::TooManyParameters {
            name: ":Nome".to_string()
        }
    );
}

#[test]
fn test_render_inline_of_compiled_filter() {
    let mapping = entity_mapping(CreateFlags::NONE);
    let e = subject("e");
    let compiled = compile_filter(
        &mapping,
        &lambda(
            [e.clone()],
            and_also(eq(nome(&e), lit("it's")), eq(deleted(&e), lit(false))),
        ),
    )
    .unwrap();

    let inline = render_inline(&compiled.sql, &compiled.parameters).unwrap();
    assert_eq!(inline, "((Nome = 'it''s') and (Deleted = 0))");
}
