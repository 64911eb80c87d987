/// Comparator method registry
///
/// Maps method-style comparator names to the binary operator they stand for, so
/// `Gt(e.Nome, "m")` compiles exactly like `e.Nome > "m"`. Names are matched
/// case-sensitively.
use std::collections::HashMap;

use crate::predicate::BinaryOperator;

/// Comparator mapping entry
#[derive(Clone, Debug)]
pub struct ComparatorMapping {
    pub method_name: &'static str,
    pub operator: BinaryOperator,
}

/// Get the comparator registered under `method`
pub fn get_comparator(method: &str) -> Option<ComparatorMapping> {
    COMPARATORS.get(method).cloned()
}

/// Registered comparator names, sorted
pub fn registered_comparators() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = COMPARATORS.keys().copied().collect();
    names.sort_unstable();
    names
}

lazy_static::lazy_static! {
    static ref COMPARATORS: HashMap<&'static str, ComparatorMapping> = {
        let mut m = HashMap::new();

        for (method_name, operator) in [
            ("Eq", BinaryOperator::Equal),
            ("Ne", BinaryOperator::NotEqual),
            ("Gt", BinaryOperator::GreaterThan),
            ("Ge", BinaryOperator::GreaterThanOrEqual),
            ("Lt", BinaryOperator::LessThan),
            ("Le", BinaryOperator::LessThanOrEqual),
        ] {
            m.insert(method_name, ComparatorMapping { method_name, operator });
        }

        m
    };
}
