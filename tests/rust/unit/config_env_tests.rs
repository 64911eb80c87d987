//! Mapper configuration from environment variables and YAML files

#[cfg(test)]
mod config_env_tests {
    use std::env;
    use std::io::Write;
    use std::path::PathBuf;

    use rowmap::config::{CliConfig, ConfigError, MapperConfig};
    use rowmap::schema_catalog::CreateFlags;
    use serial_test::serial;

    fn clear_env() {
        unsafe {
            env::remove_var("ROWMAP_IMPLICIT_PK_NAME");
            env::remove_var("ROWMAP_IMPLICIT_INDEX_SUFFIX");
            env::remove_var("ROWMAP_CREATE_FLAGS");
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = MapperConfig::from_env().unwrap();
        assert_eq!(config.implicit_pk_name, "Id");
        assert_eq!(config.implicit_index_suffix, "Id");
        assert_eq!(config.create_flags().unwrap(), CreateFlags::NONE);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        unsafe {
            env::set_var("ROWMAP_IMPLICIT_PK_NAME", "Key");
            env::set_var("ROWMAP_CREATE_FLAGS", "implicit_pk, auto_inc_pk");
        }

        let config = MapperConfig::from_env().unwrap();
        assert_eq!(config.implicit_pk_name, "Key");
        assert_eq!(config.implicit_index_suffix, "Id");
        assert_eq!(
            config.create_flags().unwrap(),
            CreateFlags::IMPLICIT_PK | CreateFlags::AUTO_INC_PK
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_unknown_flag() {
        clear_env();
        unsafe {
            env::set_var("ROWMAP_CREATE_FLAGS", "implicit_pk,sometimes");
        }

        let err = MapperConfig::from_env().unwrap_err();
        match err {
            ConfigError::Parse { field, .. } => assert_eq!(field, "default_create_flags"),
            other => panic!("Expected Parse error, got {:?}", other),
        }
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_empty_pk_name() {
        clear_env();
        unsafe {
            env::set_var("ROWMAP_IMPLICIT_PK_NAME", "");
        }

        assert!(matches!(
            MapperConfig::from_env(),
            Err(ConfigError::Validation(_))
        ));
        clear_env();
    }

    #[test]
    fn test_yaml_fixture_with_cli_overrides() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/mapper.yaml");
        let base = MapperConfig::from_yaml_file(&path).unwrap();
        assert_eq!(base.implicit_pk_name, "Key");
        assert_eq!(base.create_flags().unwrap(), CreateFlags::ALL_IMPLICIT);

        let cli = CliConfig {
            implicit_index_suffix: Some("Code".to_string()),
            ..Default::default()
        };
        let merged = MapperConfig::from_cli(cli, base).unwrap();
        assert_eq!(merged.implicit_pk_name, "Key");
        assert_eq!(merged.implicit_index_suffix, "Code");
        assert_eq!(merged.default_create_flags.len(), 2);
    }

    #[test]
    fn test_yaml_file_validation() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "implicit_pk_name: \"\"\nimplicit_index_suffix: Id")?;

        assert!(matches!(
            MapperConfig::from_yaml_file(file.path()),
            Err(ConfigError::Validation(_))
        ));
        Ok(())
    }
}
