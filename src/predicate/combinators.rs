//! Predicate Combinators for lambdas
//!
//! Two predicates built independently each bind their own parameter, e.g.
//! `x => x.Deleted == false` and `e => e.Nome == "abc"`. Combining them rewrites
//! the second body so it refers to the first lambda's parameters, then joins the
//! bodies under one lambda. The result is indistinguishable from a predicate
//! written by hand with a single parameter.
//!
//! # Example
//! ```ignore
//! let combined = and(not_deleted, named_abc)?;
//! // x => ((x.Deleted == false) && (x.Nome == "abc"))
//! ```

use log::debug;
use std::collections::HashMap;

use super::errors::PredicateError;
use super::visitors::rebind_parameters;
use super::{BinaryExpr, BinaryOperator, Lambda, PredicateExpr};

/// `first && second`, with `second` rebound onto `first`'s parameters
pub fn and(first: Lambda, second: Lambda) -> Result<Lambda, PredicateError> {
    compose(first, second, BinaryOperator::AndAlso)
}

/// `first || second`, with `second` rebound onto `first`'s parameters
pub fn or(first: Lambda, second: Lambda) -> Result<Lambda, PredicateError> {
    compose(first, second, BinaryOperator::OrElse)
}

/// Fold predicates with `and`.
///
/// - Empty vec → None
/// - Single predicate → Some(predicate)
/// - Multiple → Some(p1 && p2 && ...), left-nested
pub fn all(predicates: Vec<Lambda>) -> Result<Option<Lambda>, PredicateError> {
    fold(predicates, BinaryOperator::AndAlso)
}

/// Fold predicates with `or`; same shape rules as [`all`].
pub fn any(predicates: Vec<Lambda>) -> Result<Option<Lambda>, PredicateError> {
    fold(predicates, BinaryOperator::OrElse)
}

fn fold(predicates: Vec<Lambda>, op: BinaryOperator) -> Result<Option<Lambda>, PredicateError> {
    let mut iter = predicates.into_iter();
    let Some(mut acc) = iter.next() else {
        return Ok(None);
    };
    for next in iter {
        acc = compose(acc, next, op)?;
    }
    Ok(Some(acc))
}

fn compose(first: Lambda, second: Lambda, op: BinaryOperator) -> Result<Lambda, PredicateError> {
    if first.parameters.len() != second.parameters.len() {
        return Err(PredicateError::ParameterArityMismatch {
            left: first.parameters.len(),
            right: second.parameters.len(),
        });
    }

    let mut mapping = HashMap::new();
    for (position, (ours, theirs)) in first.parameters.iter().zip(&second.parameters).enumerate() {
        if ours.type_name != theirs.type_name {
            return Err(PredicateError::ParameterTypeMismatch {
                position,
                left: ours.type_name.clone(),
                right: theirs.type_name.clone(),
            });
        }
        if ours.name != theirs.name {
            mapping.insert(theirs.name.clone(), ours.clone());
        }
    }

    let second_body = if mapping.is_empty() {
        *second.body
    } else {
        rebind_parameters(&second.body, &mapping)
    };

    debug!(
        "Combining predicates with {} over ({})",
        op,
        first.parameter_types().join(", ")
    );

    Ok(Lambda {
        parameters: first.parameters,
        body: Box::new(PredicateExpr::Binary(BinaryExpr {
            operator: op,
            left: first.body,
            right: Box::new(second_body),
        })),
    })
}

/// Flatten nested `&&` / `||` chains into their operands.
///
/// `(a && (b && c))` → `[a, b, c]`
pub fn flatten_boolean_op(expr: &PredicateExpr, op: BinaryOperator) -> Vec<PredicateExpr> {
    match expr {
        PredicateExpr::Binary(bin) if bin.operator == op => {
            let mut operands = flatten_boolean_op(&bin.left, op);
            operands.extend(flatten_boolean_op(&bin.right, op));
            operands
        }
        other => vec![other.clone()],
    }
}
