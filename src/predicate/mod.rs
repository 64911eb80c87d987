//! Typed predicate expression trees.
//!
//! A predicate is a [`Lambda`] over one or more subject parameters whose body is
//! a boolean [`PredicateExpr`]. Closed-over values never appear as code: they are
//! embedded as [`PredicateExpr::Literal`] nodes (possibly composite records that
//! member accesses then read from) before the tree reaches the compiler.
//!
//! ```ignore
//! use rowmap::predicate::builders::*;
//!
//! let e = param("e", "Entity");
//! // e => e.Nome == "abc" && e.Deleted == false
//! let pred = lambda(
//!     [e.clone()],
//!     and_also(
//!         eq(member(e.expr(), "Nome", ValueType::Text), lit("abc")),
//!         eq(member(e.expr(), "Deleted", ValueType::Bool), lit(false)),
//!     ),
//! );
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema_catalog::{Value, ValueType};

pub mod builders;
pub mod combinators;
pub mod errors;
pub mod visitors;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateExpr {
    /// A constant, or a closed-over value evaluated ahead of compilation
    Literal(Value),

    /// Reference to a lambda parameter
    Parameter(ParameterRef),

    /// Member read, e.g. `e.RefID` or `e.RefID.EntityID`
    MemberAccess(MemberAccess),

    /// Logical, comparison or arithmetic operator
    Binary(BinaryExpr),

    Not(Box<PredicateExpr>),

    /// Type conversion, e.g. an enum widened to its nullable form
    Convert(Conversion),

    /// Method-style call, e.g. `Eq(e.Nome, "abc")`
    MethodCall(MethodCall),

    Lambda(Lambda),
}

#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct ParameterRef {
    pub name: String,
    /// Mapped type the parameter ranges over
    pub type_name: String,
}

impl ParameterRef {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }

    pub fn expr(&self) -> PredicateExpr {
        PredicateExpr::Parameter(self.clone())
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct MemberAccess {
    pub target: Box<PredicateExpr>,
    pub member: String,
    /// Declared type of the member
    pub value_type: ValueType,
}

#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOperator {
    AndAlso,
    OrElse,
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOperator {
    /// Token emitted into SQL
    pub fn sql_token(&self) -> &'static str {
        match self {
            BinaryOperator::AndAlso => "and",
            BinaryOperator::OrElse => "or",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
        }
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOperator::AndAlso | BinaryOperator::OrElse)
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterThanOrEqual
                | BinaryOperator::LessThan
                | BinaryOperator::LessThanOrEqual
        )
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::AndAlso => "&&",
            BinaryOperator::OrElse => "||",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            other => other.sql_token(),
        };
        f.write_str(symbol)
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BinaryExpr {
    pub operator: BinaryOperator,
    pub left: Box<PredicateExpr>,
    pub right: Box<PredicateExpr>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Conversion {
    pub operand: Box<PredicateExpr>,
    pub target: ValueType,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<PredicateExpr>,
    pub return_type: ValueType,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Lambda {
    pub parameters: Vec<ParameterRef>,
    pub body: Box<PredicateExpr>,
}

impl Lambda {
    pub fn new(parameters: Vec<ParameterRef>, body: PredicateExpr) -> Self {
        Self {
            parameters,
            body: Box::new(body),
        }
    }

    /// Type names of the lambda's parameters, in order
    pub fn parameter_types(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.type_name.as_str()).collect()
    }
}

impl PredicateExpr {
    /// Static type of the expression, where one is known
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            PredicateExpr::Literal(value) => value.value_type(),
            PredicateExpr::Parameter(p) => Some(ValueType::Composite(p.type_name.clone())),
            PredicateExpr::MemberAccess(access) => Some(access.value_type.clone()),
            PredicateExpr::Binary(bin) if bin.operator.is_logical() || bin.operator.is_comparison() => {
                Some(ValueType::Bool)
            }
            PredicateExpr::Binary(bin) => bin.left.value_type(),
            PredicateExpr::Not(_) => Some(ValueType::Bool),
            PredicateExpr::Convert(conv) => Some(conv.target.clone()),
            PredicateExpr::MethodCall(call) => Some(call.return_type.clone()),
            PredicateExpr::Lambda(_) => None,
        }
    }

    /// Member names from the root of an access chain outwards, plus the root.
    ///
    /// `e.RefID.EntityID` yields `(e, ["RefID", "EntityID"])`. Conversions
    /// between links are looked through.
    pub fn member_path(&self) -> Option<(&PredicateExpr, Vec<&str>)> {
        let (root, path) = chain_root(self);
        if path.is_empty() {
            None
        } else {
            Some((root, path))
        }
    }
}

fn chain_root(expr: &PredicateExpr) -> (&PredicateExpr, Vec<&str>) {
    match expr {
        PredicateExpr::MemberAccess(access) => {
            let (root, mut path) = chain_root(&access.target);
            path.push(access.member.as_str());
            (root, path)
        }
        PredicateExpr::Convert(conv) => chain_root(&conv.operand),
        other => (other, Vec::new()),
    }
}

impl fmt::Display for PredicateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateExpr::Literal(Value::Text(s)) => write!(f, "\"{}\"", s),
            PredicateExpr::Literal(value) => write!(f, "{}", value),
            PredicateExpr::Parameter(p) => f.write_str(&p.name),
            PredicateExpr::MemberAccess(access) => write!(f, "{}.{}", access.target, access.member),
            PredicateExpr::Binary(bin) => {
                write!(f, "({} {} {})", bin.left, bin.operator, bin.right)
            }
            PredicateExpr::Not(inner) => write!(f, "!{}", inner),
            PredicateExpr::Convert(conv) => write!(f, "Convert({}, {})", conv.operand, conv.target),
            PredicateExpr::MethodCall(call) => {
                let args: Vec<String> = call.args.iter().map(|a| a.to_string()).collect();
                write!(f, "{}({})", call.method, args.join(", "))
            }
            PredicateExpr::Lambda(lambda) => write!(f, "{}", lambda),
        }
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<&str> = self.parameters.iter().map(|p| p.name.as_str()).collect();
        if params.len() == 1 {
            write!(f, "{} => {}", params[0], self.body)
        } else {
            write!(f, "({}) => {}", params.join(", "), self.body)
        }
    }
}
