//! Expression Visitor Pattern
//!
//! Read-only traversal of [`PredicateExpr`] trees through [`ExpressionVisitor`],
//! plus [`rebind_parameters`], the one rewriting pass predicates need: replacing
//! parameter references so two independently built lambdas share a subject.
//!
//! # Example
//!
//! ```ignore
//! struct MemberCounter(usize);
//!
//! impl ExpressionVisitor for MemberCounter {
//!     type Output = ();
//!
//!     fn visit_member_access(&mut self, _access: &MemberAccess) {
//!         self.0 += 1;
//!     }
//! }
//!
//! let mut counter = MemberCounter(0);
//! walk_expression(&expr, &mut counter);
//! ```

use std::collections::HashMap;

use super::{
    BinaryExpr, Conversion, Lambda, MemberAccess, MethodCall, ParameterRef, PredicateExpr,
};
use crate::schema_catalog::Value;

/// Trait for visiting PredicateExpr nodes.
///
/// Implementors override the `visit_*` methods they care about; the defaults do
/// nothing.
pub trait ExpressionVisitor {
    type Output: Default;

    fn visit_literal(&mut self, _value: &Value) -> Self::Output {
        Self::Output::default()
    }

    fn visit_parameter(&mut self, _param: &ParameterRef) -> Self::Output {
        Self::Output::default()
    }

    /// Called for each member access, outermost first
    fn visit_member_access(&mut self, _access: &MemberAccess) -> Self::Output {
        Self::Output::default()
    }

    fn visit_binary(&mut self, _bin: &BinaryExpr) -> Self::Output {
        Self::Output::default()
    }

    fn visit_not(&mut self, _operand: &PredicateExpr) -> Self::Output {
        Self::Output::default()
    }

    fn visit_convert(&mut self, _conv: &Conversion) -> Self::Output {
        Self::Output::default()
    }

    fn visit_method_call(&mut self, _call: &MethodCall) -> Self::Output {
        Self::Output::default()
    }

    fn visit_lambda(&mut self, _lambda: &Lambda) -> Self::Output {
        Self::Output::default()
    }
}

/// Walk an expression tree, calling visitor methods for each node before
/// descending into its children.
pub fn walk_expression<V: ExpressionVisitor>(expr: &PredicateExpr, visitor: &mut V) -> V::Output {
    match expr {
        PredicateExpr::Literal(value) => visitor.visit_literal(value),
        PredicateExpr::Parameter(param) => visitor.visit_parameter(param),
        PredicateExpr::MemberAccess(access) => {
            let result = visitor.visit_member_access(access);
            walk_expression(&access.target, visitor);
            result
        }
        PredicateExpr::Binary(bin) => {
            let result = visitor.visit_binary(bin);
            walk_expression(&bin.left, visitor);
            walk_expression(&bin.right, visitor);
            result
        }
        PredicateExpr::Not(operand) => {
            let result = visitor.visit_not(operand);
            walk_expression(operand, visitor);
            result
        }
        PredicateExpr::Convert(conv) => {
            let result = visitor.visit_convert(conv);
            walk_expression(&conv.operand, visitor);
            result
        }
        PredicateExpr::MethodCall(call) => {
            let result = visitor.visit_method_call(call);
            for arg in &call.args {
                walk_expression(arg, visitor);
            }
            result
        }
        PredicateExpr::Lambda(lambda) => {
            let result = visitor.visit_lambda(lambda);
            walk_expression(&lambda.body, visitor);
            result
        }
    }
}

// =============================================================================
// Common Visitor Implementations
// =============================================================================

/// Collects distinct parameter references, in first-seen order.
pub struct ParameterCollector {
    pub parameters: Vec<ParameterRef>,
}

impl ParameterCollector {
    pub fn new() -> Self {
        Self { parameters: vec![] }
    }

    pub fn collect(expr: &PredicateExpr) -> Vec<ParameterRef> {
        let mut collector = Self::new();
        walk_expression(expr, &mut collector);
        collector.parameters
    }
}

impl Default for ParameterCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionVisitor for ParameterCollector {
    type Output = ();

    fn visit_parameter(&mut self, param: &ParameterRef) {
        if !self.parameters.contains(param) {
            self.parameters.push(param.clone());
        }
    }
}

/// Collects member paths rooted at a parameter, e.g. `["RefID", "EntityID"]`.
///
/// Only maximal chains are reported: `e.RefID.EntityID` yields one path, not two.
pub struct MemberPathCollector {
    pub paths: Vec<(String, Vec<String>)>,
    skip_inner: usize,
}

impl MemberPathCollector {
    pub fn collect(expr: &PredicateExpr) -> Vec<(String, Vec<String>)> {
        let mut collector = Self {
            paths: vec![],
            skip_inner: 0,
        };
        walk_expression(expr, &mut collector);
        collector.paths
    }
}

impl ExpressionVisitor for MemberPathCollector {
    type Output = ();

    fn visit_member_access(&mut self, access: &MemberAccess) {
        if self.skip_inner > 0 {
            self.skip_inner -= 1;
            return;
        }
        let whole = PredicateExpr::MemberAccess(access.clone());
        if let Some((PredicateExpr::Parameter(root), path)) = whole.member_path() {
            // Inner links of this chain will be visited next; don't report them
            self.skip_inner = path.len() - 1;
            self.paths.push((
                root.name.clone(),
                path.into_iter().map(str::to_string).collect(),
            ));
        }
    }
}

/// Replace parameter references by name.
///
/// Nested lambdas that declare a parameter of the same name shadow the mapping
/// inside their body.
pub fn rebind_parameters(
    expr: &PredicateExpr,
    mapping: &HashMap<String, ParameterRef>,
) -> PredicateExpr {
    match expr {
        PredicateExpr::Parameter(param) => match mapping.get(&param.name) {
            Some(replacement) => PredicateExpr::Parameter(replacement.clone()),
            None => expr.clone(),
        },
        PredicateExpr::Literal(_) => expr.clone(),
        PredicateExpr::MemberAccess(access) => PredicateExpr::MemberAccess(MemberAccess {
            target: Box::new(rebind_parameters(&access.target, mapping)),
            member: access.member.clone(),
            value_type: access.value_type.clone(),
        }),
        PredicateExpr::Binary(bin) => PredicateExpr::Binary(BinaryExpr {
            operator: bin.operator,
            left: Box::new(rebind_parameters(&bin.left, mapping)),
            right: Box::new(rebind_parameters(&bin.right, mapping)),
        }),
        PredicateExpr::Not(operand) => {
            PredicateExpr::Not(Box::new(rebind_parameters(operand, mapping)))
        }
        PredicateExpr::Convert(conv) => PredicateExpr::Convert(Conversion {
            operand: Box::new(rebind_parameters(&conv.operand, mapping)),
            target: conv.target.clone(),
        }),
        PredicateExpr::MethodCall(call) => PredicateExpr::MethodCall(MethodCall {
            method: call.method.clone(),
            args: call
                .args
                .iter()
                .map(|arg| rebind_parameters(arg, mapping))
                .collect(),
            return_type: call.return_type.clone(),
        }),
        PredicateExpr::Lambda(lambda) => {
            let shadowed = lambda
                .parameters
                .iter()
                .any(|p| mapping.contains_key(&p.name));
            let body = if shadowed {
                let mut inner = mapping.clone();
                for p in &lambda.parameters {
                    inner.remove(&p.name);
                }
                rebind_parameters(&lambda.body, &inner)
            } else {
                rebind_parameters(&lambda.body, mapping)
            };
            PredicateExpr::Lambda(Lambda::new(lambda.parameters.clone(), body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::builders::*;
    use crate::schema_catalog::ValueType;

    fn ref_entity_id(target: PredicateExpr) -> PredicateExpr {
        member(
            member(target, "RefID", ValueType::Composite("CloudID".into())),
            "EntityID",
            ValueType::Text,
        )
    }

    #[test]
    fn test_parameter_collector() {
        let e = param("e", "Entity");
        let x = param("x", "Entity");
        let expr = and_also(
            eq(member(e.expr(), "Nome", ValueType::Text), lit("a")),
            eq(member(x.expr(), "Nome", ValueType::Text), member(e.expr(), "Nome", ValueType::Text)),
        );
        assert_eq!(ParameterCollector::collect(&expr), vec![e, x]);
    }

    #[test]
    fn test_member_path_collector_reports_maximal_chains() {
        let e = param("e", "Entity");
        let expr = and_also(
            eq(ref_entity_id(e.expr()), lit("eID")),
            eq(member(e.expr(), "Deleted", ValueType::Bool), lit(false)),
        );
        let paths = MemberPathCollector::collect(&expr);
        assert_eq!(
            paths,
            vec![
                ("e".to_string(), vec!["RefID".to_string(), "EntityID".to_string()]),
                ("e".to_string(), vec!["Deleted".to_string()]),
            ]
        );
    }

    #[test]
    fn test_member_path_collector_ignores_literal_roots() {
        let captured = lit(crate::schema_catalog::CompositeValue::new("CloudID"));
        let expr = eq(
            member(param("e", "Entity").expr(), "Nome", ValueType::Text),
            member(captured, "EntityID", ValueType::Text),
        );
        assert_eq!(MemberPathCollector::collect(&expr).len(), 1);
    }

    #[test]
    fn test_rebind_parameters() {
        let x = param("x", "Entity");
        let e = param("e", "Entity");
        let expr = not(eq(member(x.expr(), "Deleted", ValueType::Bool), lit(true)));

        let mapping = HashMap::from([("x".to_string(), e.clone())]);
        let rebound = rebind_parameters(&expr, &mapping);
        assert_eq!(
            rebound,
            not(eq(member(e.expr(), "Deleted", ValueType::Bool), lit(true)))
        );
    }

    #[test]
    fn test_rebind_respects_shadowing() {
        let x = param("x", "Entity");
        let e = param("e", "Entity");
        let inner = PredicateExpr::Lambda(lambda([x.clone()], x.expr()));
        let mapping = HashMap::from([("x".to_string(), e)]);
        assert_eq!(rebind_parameters(&inner, &mapping), inner);
    }
}
