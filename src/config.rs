use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::Validate;

use crate::schema_catalog::table_mapping::{
    CreateFlags, DEFAULT_IMPLICIT_INDEX_SUFFIX, DEFAULT_IMPLICIT_PK_NAME,
};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Naming conventions used by the schema mapper
#[derive(Clone, Debug, Validate, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Member name treated as primary key under the implicit primary-key flag
    #[validate(length(min = 1, message = "Implicit primary key name cannot be empty"))]
    pub implicit_pk_name: String,

    /// Column-name suffix that triggers an implicit index
    #[validate(length(min = 1, message = "Implicit index suffix cannot be empty"))]
    pub implicit_index_suffix: String,

    /// Creation flags applied when none are given explicitly
    #[serde(default)]
    pub default_create_flags: Vec<String>,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            implicit_pk_name: DEFAULT_IMPLICIT_PK_NAME.to_string(),
            implicit_index_suffix: DEFAULT_IMPLICIT_INDEX_SUFFIX.to_string(),
            default_create_flags: Vec::new(),
        }
    }
}

impl MapperConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            implicit_pk_name: env::var("ROWMAP_IMPLICIT_PK_NAME")
                .unwrap_or_else(|_| DEFAULT_IMPLICIT_PK_NAME.to_string()),
            implicit_index_suffix: env::var("ROWMAP_IMPLICIT_INDEX_SUFFIX")
                .unwrap_or_else(|_| DEFAULT_IMPLICIT_INDEX_SUFFIX.to_string()),
            default_create_flags: split_flag_list(
                &env::var("ROWMAP_CREATE_FLAGS").unwrap_or_default(),
            ),
        };

        config.check()?;
        Ok(config)
    }

    /// Create configuration from CLI arguments, falling back to `base` for
    /// anything not given on the command line
    pub fn from_cli(cli: CliConfig, base: Self) -> Result<Self, ConfigError> {
        let config = Self {
            implicit_pk_name: cli.implicit_pk_name.unwrap_or(base.implicit_pk_name),
            implicit_index_suffix: cli
                .implicit_index_suffix
                .unwrap_or(base.implicit_index_suffix),
            default_create_flags: cli.create_flags.unwrap_or(base.default_create_flags),
        };

        config.check()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.check()?;
        Ok(config)
    }

    /// Parsed [`CreateFlags`] from `default_create_flags`
    pub fn create_flags(&self) -> Result<CreateFlags, ConfigError> {
        CreateFlags::from_names(&self.default_create_flags).map_err(|e| ConfigError::Parse {
            field: "default_create_flags".to_string(),
            value: self.default_create_flags.join(","),
            source: Box::new(e),
        })
    }

    fn check(&self) -> Result<(), ConfigError> {
        self.validate()?;
        self.create_flags()?;
        Ok(())
    }
}

/// CLI configuration (parsed from command line arguments)
#[derive(Clone, Debug, Default)]
pub struct CliConfig {
    pub implicit_pk_name: Option<String>,
    pub implicit_index_suffix: Option<String>,
    pub create_flags: Option<Vec<String>>,
}

/// Split a comma separated flag list, dropping blanks
pub fn split_flag_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MapperConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.implicit_pk_name, "Id");
        assert_eq!(config.implicit_index_suffix, "Id");
        assert_eq!(config.create_flags().unwrap(), CreateFlags::NONE);
    }

    #[test]
    fn test_empty_pk_name_rejected() {
        let config = MapperConfig {
            implicit_pk_name: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_overrides_base() {
        let cli = CliConfig {
            implicit_pk_name: Some("Key".to_string()),
            implicit_index_suffix: None,
            create_flags: Some(vec!["implicit_pk".to_string(), "auto_inc_pk".to_string()]),
        };
        let config = MapperConfig::from_cli(cli, MapperConfig::default()).unwrap();
        assert_eq!(config.implicit_pk_name, "Key");
        assert_eq!(config.implicit_index_suffix, "Id");
        assert_eq!(
            config.create_flags().unwrap(),
            CreateFlags::IMPLICIT_PK | CreateFlags::AUTO_INC_PK
        );
    }

    #[test]
    fn test_unknown_flag_rejected() {
        let cli = CliConfig {
            create_flags: Some(vec!["sometimes".to_string()]),
            ..Default::default()
        };
        let result = MapperConfig::from_cli(cli, MapperConfig::default());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_split_flag_list() {
        assert_eq!(
            split_flag_list("implicit_pk, implicit_index,,"),
            vec!["implicit_pk".to_string(), "implicit_index".to_string()]
        );
        assert!(split_flag_list("").is_empty());
    }
}
