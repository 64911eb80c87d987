//! Loading catalog definitions from YAML and JSON files

#[cfg(test)]
mod catalog_file_tests {
    use std::io::Write;
    use std::path::PathBuf;

    use rowmap::schema_catalog::{
        AnnotationKind, CatalogConfig, CreateFlags, SchemaError, ValueType,
    };
    use tempfile::NamedTempFile;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    #[test]
    fn test_fixture_catalog_resolves() -> anyhow::Result<()> {
        let loaded = CatalogConfig::from_file(fixture("entity_catalog.yaml"))?.to_catalog()?;

        let entity = loaded.catalog.get_type("Entity")?;
        assert_eq!(
            entity.member("Type").map(|m| m.value_type.clone()),
            Some(ValueType::nullable(ValueType::Enum("TypeTest".into())))
        );
        assert!(!loaded
            .registry
            .annotations_for_type("CloudID", AnnotationKind::MultiColumn)
            .is_empty());

        let mapping = loaded
            .mapper()
            .build_mapping("Entity", CreateFlags::NONE)?;
        assert_eq!(mapping.table_name, "MyEntity");
        assert!(mapping.find_column("Notes").is_none());

        let nome = mapping.find_column_with_property_name("Nome").unwrap();
        assert_eq!(nome.max_string_length, Some(64));
        assert_eq!(nome.collation.as_deref(), Some("NOCASE"));
        Ok(())
    }

    #[test]
    fn test_json_catalog_file() -> anyhow::Result<()> {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile()?;
        write!(
            file,
            r#"{{
  "types": [
    {{ "name": "Order", "members": [
        {{ "name": "Id", "type": "integer" }},
        {{ "name": "Total", "type": "float?" }}
    ] }}
  ],
  "bindings": [
    {{ "scope": "member", "type": "Order", "member": "Id", "kind": "primary_key" }},
    {{ "scope": "member", "type": "Order", "member": "Id", "kind": "auto_increment" }}
  ]
}}"#
        )?;

        let loaded = CatalogConfig::from_file(file.path())?.to_catalog()?;
        let mapping = loaded.mapper().build_mapping("Order", CreateFlags::NONE)?;
        assert!(mapping.has_auto_inc_pk());
        assert_eq!(mapping.insert_columns().len(), 1);
        assert!(mapping.find_column("Total").unwrap().is_nullable);
        Ok(())
    }

    #[test]
    fn test_yaml_file_without_extension() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "types:\n  - name: Tag\n    members:\n      - {{ name: Label, type: string }}")?;

        let loaded = CatalogConfig::from_file(file.path())?.to_catalog()?;
        assert!(loaded.catalog.contains_type("Tag"));
        Ok(())
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = CatalogConfig::from_file("/nonexistent/rowmap/catalog.yaml").unwrap_err();
        assert!(matches!(err, SchemaError::ConfigReadError { .. }));
    }

    #[test]
    fn test_malformed_file_is_parse_error() -> anyhow::Result<()> {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile()?;
        write!(file, "{{ \"types\": [ }}")?;

        let err = CatalogConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, SchemaError::ConfigParseError { .. }));
        Ok(())
    }
}
