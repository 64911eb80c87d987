//! Predicate compiler
//!
//! Turns a boolean [`PredicateExpr`] into a parameterized SQL filter fragment.
//! Member accesses rooted at a subject parameter resolve to physical columns
//! through a [`ColumnModel`]; every other operand must fold to a literal, which
//! is bound to a fresh `:column` parameter.
//!
//! Output is parenthesized at every comparison and logical boundary:
//!
//! ```text
//! e => e.Nome == "abc" && !(e.Deleted == true)
//! ((Nome = :Nome) and not (Deleted = :Deleted))
//! ```
//!
//! Equality against a member expanded into several columns emits one clause per
//! expanded column, in mapping order:
//!
//! ```text
//! e => e.RefID == id
//! ((RefID_PartitionID = :RefID_PartitionID) and (RefID_EntityID = :RefID_EntityID))
//! ```

use log::debug;
use serde::Serialize;

use super::comparator_registry::get_comparator;
use super::errors::CompileError;
use super::parameters::{allocate_parameter_name, ParameterTable};
use crate::predicate::{BinaryExpr, BinaryOperator, Conversion, Lambda, PredicateExpr};
use crate::schema_catalog::{Column, ColumnModel, TableMapping, Value, ValueType};

/// A compiled filter: the SQL fragment and the parameters it references
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledFilter {
    pub sql: String,
    pub parameters: ParameterTable,
}

/// Compile `expr` against `columns`.
///
/// Member chains rooted at a parameter whose type is listed in
/// `parameter_types` are subject members. Generated parameters are added to
/// `parameters` only when the whole expression compiles; names already present
/// there are never reused.
pub fn compile(
    expr: &PredicateExpr,
    parameter_types: &[&str],
    columns: ColumnModel<'_>,
    parameters: &mut ParameterTable,
) -> Result<String, CompileError> {
    let mut compiler = PredicateCompiler {
        subject_types: parameter_types,
        columns,
        existing: parameters,
        local: ParameterTable::new(),
    };
    let sql = compiler.compile_predicate(expr)?;
    let local = compiler.local;

    debug!("Compiled predicate {} -> {} ({} parameters)", expr, sql, local.len());
    parameters.extend(local);
    Ok(sql)
}

/// Compile a lambda, taking its own parameters as the subject parameters.
pub fn compile_lambda(
    lambda: &Lambda,
    columns: ColumnModel<'_>,
    parameters: &mut ParameterTable,
) -> Result<String, CompileError> {
    let parameter_types = lambda.parameter_types();
    compile(&lambda.body, &parameter_types, columns, parameters)
}

/// Compile a lambda over `mapping` into a fresh parameter table.
pub fn compile_filter(mapping: &TableMapping, lambda: &Lambda) -> Result<CompiledFilter, CompileError> {
    let mut parameters = ParameterTable::new();
    let sql = compile_lambda(lambda, mapping.column_model(), &mut parameters)?;
    Ok(CompiledFilter { sql, parameters })
}

struct PredicateCompiler<'a> {
    subject_types: &'a [&'a str],
    columns: ColumnModel<'a>,
    existing: &'a ParameterTable,
    local: ParameterTable,
}

impl PredicateCompiler<'_> {
    fn compile_predicate(&mut self, expr: &PredicateExpr) -> Result<String, CompileError> {
        match expr {
            PredicateExpr::Binary(bin) if bin.operator.is_logical() => {
                let left = self.compile_predicate(&bin.left)?;
                let right = self.compile_predicate(&bin.right)?;
                Ok(format!("({} {} {})", left, bin.operator.sql_token(), right))
            }
            PredicateExpr::Binary(bin) if bin.operator.is_comparison() => {
                self.compile_comparison(bin.operator, &bin.left, &bin.right)
            }
            PredicateExpr::MethodCall(call) => {
                let comparator = get_comparator(&call.method)
                    .ok_or_else(|| CompileError::UnknownOperator(call.method.clone()))?;
                match call.args.as_slice() {
                    [left, right] => self.compile_comparison(comparator.operator, left, right),
                    _ => Err(CompileError::unsupported_with_context(
                        expr,
                        "comparators take exactly two arguments",
                    )),
                }
            }
            PredicateExpr::Not(operand) => Ok(format!("not {}", self.compile_predicate(operand)?)),
            PredicateExpr::Convert(conv) => {
                check_conversion(conv)?;
                self.compile_predicate(&conv.operand)
            }
            PredicateExpr::Lambda(lambda) => self.compile_predicate(&lambda.body),
            other => Err(CompileError::unsupported_with_context(
                other,
                "expected a comparison or logical operator",
            )),
        }
    }

    fn compile_comparison(
        &mut self,
        operator: BinaryOperator,
        left: &PredicateExpr,
        right: &PredicateExpr,
    ) -> Result<String, CompileError> {
        let (member, value, operator) = if self.is_subject_member(left) {
            (left, right, operator)
        } else if self.is_subject_member(right) {
            (right, left, mirror(operator))
        } else {
            let expr = PredicateExpr::Binary(BinaryExpr {
                operator,
                left: Box::new(left.clone()),
                right: Box::new(right.clone()),
            });
            return Err(CompileError::unsupported_with_context(
                expr,
                "a comparison needs a member of the filtered type on one side",
            ));
        };

        check_chain_conversions(member)?;
        let path = member
            .member_path()
            .map(|(_, path)| path)
            .unwrap_or_default();

        if let [outer] = path.as_slice() {
            if self.columns.find_by_property(outer).is_none() {
                let parts = self.columns.multi_columns(outer);
                if !parts.is_empty() {
                    return self.compile_composite_equality(member, operator, value, &parts);
                }
            }
        }

        let column = self
            .columns
            .resolve(&path)
            .ok_or_else(|| CompileError::ColumnNotFound(path.join(".")))?;
        let value = self.fold_constant(value)?;
        let bound = coerce_for_column(column, value)?;
        let name = self.bind(&column.name, bound)?;
        Ok(format!("({} {} {})", column.name, operator.sql_token(), name))
    }

    fn compile_composite_equality(
        &mut self,
        member: &PredicateExpr,
        operator: BinaryOperator,
        value: &PredicateExpr,
        parts: &[&Column],
    ) -> Result<String, CompileError> {
        if operator != BinaryOperator::Equal {
            return Err(CompileError::unsupported_with_context(
                member,
                "multi-column members only support equality",
            ));
        }

        let value = self.fold_constant(value)?;
        let record = match &value {
            Value::Null => None,
            Value::Composite(record) => Some(record),
            _ => return Err(CompileError::CompositeValueExpected(member.to_string())),
        };

        let mut clauses = Vec::with_capacity(parts.len());
        for column in parts {
            let sub_value = match (record, column.sub_member()) {
                (Some(record), Some(sub)) => record.get(sub).cloned().unwrap_or(Value::Null),
                _ => Value::Null,
            };
            let bound = coerce_for_column(column, sub_value)?;
            let name = self.bind(&column.name, bound)?;
            clauses.push(format!("({} = {})", column.name, name));
        }

        if clauses.len() == 1 {
            Ok(clauses.remove(0))
        } else {
            Ok(format!("({})", clauses.join(" and ")))
        }
    }

    /// Reduce a non-subject operand to the literal it stands for.
    fn fold_constant(&self, expr: &PredicateExpr) -> Result<Value, CompileError> {
        match expr {
            PredicateExpr::Literal(value) => Ok(value.clone()),
            PredicateExpr::Convert(conv) => {
                check_conversion(conv)?;
                self.fold_constant(&conv.operand)
            }
            PredicateExpr::MemberAccess(access) => {
                if self.is_subject_member(expr) {
                    return Err(CompileError::unsupported_with_context(
                        expr,
                        "comparing two members of the filtered type",
                    ));
                }
                match self.fold_constant(&access.target)? {
                    Value::Composite(record) => {
                        Ok(record.get(&access.member).cloned().unwrap_or(Value::Null))
                    }
                    _ => Err(CompileError::CompositeValueExpected(access.target.to_string())),
                }
            }
            other => Err(CompileError::unsupported_with_context(
                other,
                "value side must reduce to a constant",
            )),
        }
    }

    fn is_subject_member(&self, expr: &PredicateExpr) -> bool {
        match expr.member_path() {
            Some((PredicateExpr::Parameter(root), _)) => {
                self.subject_types.contains(&root.type_name.as_str())
            }
            _ => false,
        }
    }

    fn bind(&mut self, column_name: &str, value: Value) -> Result<String, CompileError> {
        let existing = self.existing;
        let local = &self.local;
        let name = allocate_parameter_name(column_name, |candidate| {
            existing.contains(candidate) || local.contains(candidate)
        })?;
        self.local.insert(name.clone(), value);
        Ok(name)
    }
}

/// Conversions are only looked through when they add or remove a nullable or
/// enum wrapper.
fn check_conversion(conv: &Conversion) -> Result<(), CompileError> {
    let wraps = |ty: &ValueType| ty.is_nullable() || ty.is_enum();
    let source_wraps = conv.operand.value_type().as_ref().is_some_and(wraps);
    if wraps(&conv.target) || source_wraps {
        Ok(())
    } else {
        Err(CompileError::unsupported_with_context(
            PredicateExpr::Convert(conv.clone()),
            "only enum and nullable conversions are supported",
        ))
    }
}

fn check_chain_conversions(expr: &PredicateExpr) -> Result<(), CompileError> {
    match expr {
        PredicateExpr::MemberAccess(access) => check_chain_conversions(&access.target),
        PredicateExpr::Convert(conv) => {
            check_conversion(conv)?;
            check_chain_conversions(&conv.operand)
        }
        _ => Ok(()),
    }
}

/// Operator to use once the operands of a comparison are swapped
fn mirror(operator: BinaryOperator) -> BinaryOperator {
    match operator {
        BinaryOperator::GreaterThan => BinaryOperator::LessThan,
        BinaryOperator::GreaterThanOrEqual => BinaryOperator::LessThanOrEqual,
        BinaryOperator::LessThan => BinaryOperator::GreaterThan,
        BinaryOperator::LessThanOrEqual => BinaryOperator::GreaterThanOrEqual,
        other => other,
    }
}

/// Bind enum-typed columns by their stored variant name.
fn coerce_for_column(column: &Column, value: Value) -> Result<Value, CompileError> {
    let Some(enum_type) = &column.enum_type else {
        return Ok(match value {
            Value::Enum(e) => Value::Text(e.variant),
            other => other,
        });
    };

    let invalid = |value: String| CompileError::InvalidEnumValue {
        enum_name: enum_type.name.clone(),
        value,
    };
    match value {
        Value::Null => Ok(Value::Null),
        Value::Enum(e) if e.type_name == enum_type.name && enum_type.has_variant(&e.variant) => {
            Ok(Value::Text(e.variant))
        }
        Value::Integer(ordinal) => enum_type
            .variant_name(ordinal)
            .map(|variant| Value::Text(variant.to_string()))
            .ok_or_else(|| invalid(ordinal.to_string())),
        Value::Text(variant) if enum_type.has_variant(&variant) => Ok(Value::Text(variant)),
        other => Err(invalid(other.to_string())),
    }
}
