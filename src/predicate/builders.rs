//! Builder helpers for predicate trees.
//!
//! # Example
//! ```ignore
//! let e = param("e", "Entity");
//! let pred = lambda([e.clone()], ge(member(e.expr(), "Nome", ValueType::Text), lit("m")));
//! // e => (e.Nome >= "m")
//! ```

use super::{
    BinaryExpr, BinaryOperator, Conversion, Lambda, MemberAccess, MethodCall, ParameterRef,
    PredicateExpr,
};
use crate::schema_catalog::{Value, ValueType};

/// Declare a lambda parameter ranging over `type_name`
pub fn param(name: impl Into<String>, type_name: impl Into<String>) -> ParameterRef {
    ParameterRef::new(name, type_name)
}

/// Read `name` (declared as `value_type`) off `target`
pub fn member(
    target: PredicateExpr,
    name: impl Into<String>,
    value_type: ValueType,
) -> PredicateExpr {
    PredicateExpr::MemberAccess(MemberAccess {
        target: Box::new(target),
        member: name.into(),
        value_type,
    })
}

pub fn lit(value: impl Into<Value>) -> PredicateExpr {
    PredicateExpr::Literal(value.into())
}

/// Apply a binary operator
pub fn binary(
    operator: BinaryOperator,
    left: PredicateExpr,
    right: PredicateExpr,
) -> PredicateExpr {
    PredicateExpr::Binary(BinaryExpr {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn eq(left: PredicateExpr, right: PredicateExpr) -> PredicateExpr {
    binary(BinaryOperator::Equal, left, right)
}

pub fn ne(left: PredicateExpr, right: PredicateExpr) -> PredicateExpr {
    binary(BinaryOperator::NotEqual, left, right)
}

pub fn gt(left: PredicateExpr, right: PredicateExpr) -> PredicateExpr {
    binary(BinaryOperator::GreaterThan, left, right)
}

pub fn ge(left: PredicateExpr, right: PredicateExpr) -> PredicateExpr {
    binary(BinaryOperator::GreaterThanOrEqual, left, right)
}

pub fn lt(left: PredicateExpr, right: PredicateExpr) -> PredicateExpr {
    binary(BinaryOperator::LessThan, left, right)
}

pub fn le(left: PredicateExpr, right: PredicateExpr) -> PredicateExpr {
    binary(BinaryOperator::LessThanOrEqual, left, right)
}

/// Short-circuit conjunction: `left && right`
pub fn and_also(left: PredicateExpr, right: PredicateExpr) -> PredicateExpr {
    binary(BinaryOperator::AndAlso, left, right)
}

/// Short-circuit disjunction: `left || right`
pub fn or_else(left: PredicateExpr, right: PredicateExpr) -> PredicateExpr {
    binary(BinaryOperator::OrElse, left, right)
}

pub fn not(operand: PredicateExpr) -> PredicateExpr {
    PredicateExpr::Not(Box::new(operand))
}

pub fn convert(operand: PredicateExpr, target: ValueType) -> PredicateExpr {
    PredicateExpr::Convert(Conversion {
        operand: Box::new(operand),
        target,
    })
}

/// Boolean method-style call, e.g. `call("Gt", [e.Nome, "m"])`
pub fn call<I>(method: impl Into<String>, args: I) -> PredicateExpr
where
    I: IntoIterator<Item = PredicateExpr>,
{
    PredicateExpr::MethodCall(MethodCall {
        method: method.into(),
        args: args.into_iter().collect(),
        return_type: ValueType::Bool,
    })
}

pub fn lambda<I>(parameters: I, body: PredicateExpr) -> Lambda
where
    I: IntoIterator<Item = ParameterRef>,
{
    Lambda::new(parameters.into_iter().collect(), body)
}
