//! rowmap - schema mapping and predicate compilation for a lightweight relational mapper
//!
//! This crate provides the core of an object/row mapping layer:
//! - Type shape declarations and a metadata registry for late-bound annotations
//! - Table mappings derived from a type's members, including multi-column expansion
//!   of composite-valued members
//! - A predicate AST with combinators for composing independently built filters
//! - A compiler turning predicates into parameterized SQL filter fragments

pub mod config;
pub mod predicate;
pub mod schema_catalog;
pub mod sql_generator;
