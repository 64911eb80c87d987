pub mod comparator_registry;
pub mod compiler;
pub mod errors;
pub mod parameter_substitution;
pub mod parameters;

pub use compiler::{compile, compile_filter, compile_lambda, CompiledFilter};
pub use errors::CompileError;
pub use parameter_substitution::{render_inline, ParameterSubstitutionError};
pub use parameters::{ParameterTable, MAX_NAME_SUFFIX};
