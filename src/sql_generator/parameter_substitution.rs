/// Inline rendering of compiled filters
///
/// Replaces the `:name` placeholders of a compiled fragment with SQL literals,
/// for logging and CLI output. Statements sent to an engine should bind the
/// parameter table instead.
use super::parameters::ParameterTable;
use crate::schema_catalog::Value;

#[derive(Debug, thiserror::Error)]
pub enum ParameterSubstitutionError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter name: {0} (must start with a letter or underscore)")]
    InvalidParameterName(String),

    #[error("Unsupported parameter type for value: {0}")]
    UnsupportedType(String),
}

/// Escape a string value for a single-quoted SQL literal
fn escape_string(s: &str) -> String {
    s.replace('\'', "''")
}

/// Format a parameter value as SQL literal
fn format_parameter(value: &Value) -> Result<String, ParameterSubstitutionError> {
    match value {
        Value::Null => Ok("NULL".to_string()),
        Value::Bool(b) => Ok(if *b { "1".to_string() } else { "0".to_string() }),
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) if f.is_finite() => Ok(f.to_string()),
        Value::Float(f) => Err(ParameterSubstitutionError::UnsupportedType(format!(
            "Non-finite float: {}",
            f
        ))),
        Value::Text(s) => Ok(format!("'{}'", escape_string(s))),
        Value::DateTime(dt) => Ok(format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S%.f"))),
        Value::Uuid(u) => Ok(format!("'{}'", u)),
        Value::Enum(e) => Ok(format!("'{}'", escape_string(&e.variant))),
        Value::Composite(c) => Err(ParameterSubstitutionError::UnsupportedType(format!(
            "Composite `{}` values are bound per column",
            c.type_name
        ))),
    }
}

/// Substitute parameters in a compiled fragment
///
/// # Errors
/// - `MissingParameter` if a placeholder has no value in `parameters`
/// - `InvalidParameterName` if a placeholder starts with a digit
/// - `UnsupportedType` if a value cannot be formatted as SQL
///
/// # Example
/// ```ignore
/// let mut params = ParameterTable::new();
/// params.insert(":Nome", Value::from("O'Brien"));
/// let sql = render_inline("(Nome = :Nome)", &params)?;
/// // "(Nome = 'O''Brien')"
/// ```
pub fn render_inline(
    sql: &str,
    parameters: &ParameterTable,
) -> Result<String, ParameterSubstitutionError> {
    let mut result = String::with_capacity(sql.len() * 2);
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != ':' {
            result.push(ch);
            continue;
        }

        let mut param_name = String::from(":");
        while let Some(&next_ch) = chars.peek() {
            if next_ch.is_alphanumeric() || next_ch == '_' {
                param_name.push(next_ch);
                chars.next();
            } else {
                break;
            }
        }

        if param_name.len() == 1 {
            // Just a lone : character
            result.push(':');
            continue;
        }
        if param_name[1..].starts_with(|c: char| c.is_ascii_digit()) {
            return Err(ParameterSubstitutionError::InvalidParameterName(param_name));
        }

        match parameters.get(&param_name) {
            Some(value) => result.push_str(&format_parameter(value)?),
            None => return Err(ParameterSubstitutionError::MissingParameter(param_name)),
        }
    }

    Ok(result)
}
