//! Integration tests - catalog loading, schema mapping and predicate compilation
//! working together through the public API.

mod common;
mod composite_mapping_tests;
mod fixture_predicate_tests;
mod predicate_compilation_tests;
