//! Mapping cache configuration and sharing across threads

#[cfg(test)]
mod mapping_cache_tests {
    use std::env;
    use std::sync::Arc;
    use std::thread;

    use rowmap::schema_catalog::{
        CreateFlags, MappingCache, MappingCacheConfig, MemberDescriptor, SchemaMapper,
        TypeCatalog, TypeDescriptor, ValueType,
    };
    use serial_test::serial;

    fn catalog() -> TypeCatalog {
        TypeCatalog::new().with_type(
            TypeDescriptor::new("Order")
                .with_member(MemberDescriptor::new("Id", ValueType::Integer))
                .with_member(MemberDescriptor::new("CustomerId", ValueType::Text)),
        )
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        unsafe {
            env::set_var("ROWMAP_MAPPING_CACHE_ENABLED", "false");
            env::set_var("ROWMAP_MAPPING_CACHE_MAX_ENTRIES", "8");
        }
        let config = MappingCacheConfig::from_env();
        assert!(!config.enabled);
        assert_eq!(config.max_entries, 8);

        unsafe {
            env::set_var("ROWMAP_MAPPING_CACHE_MAX_ENTRIES", "not a number");
            env::remove_var("ROWMAP_MAPPING_CACHE_ENABLED");
        }
        let config = MappingCacheConfig::from_env();
        assert!(config.enabled);
        assert_eq!(config.max_entries, 256);

        unsafe {
            env::remove_var("ROWMAP_MAPPING_CACHE_MAX_ENTRIES");
        }
    }

    #[test]
    fn test_disabled_cache_always_builds() {
        let catalog = catalog();
        let cache = MappingCache::new(
            SchemaMapper::new(&catalog),
            MappingCacheConfig {
                enabled: false,
                max_entries: 4,
            },
        );

        let first = cache.get_or_build("Order", CreateFlags::NONE).unwrap();
        let second = cache.get_or_build("Order", CreateFlags::NONE).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first, second);
        assert_eq!(cache.metrics().size, 0);
    }

    #[test]
    fn test_shared_across_threads() {
        let catalog = catalog();
        let cache = MappingCache::with_defaults(SchemaMapper::new(&catalog));

        let names: Vec<String> = thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        cache
                            .get_or_build("Order", CreateFlags::IMPLICIT_PK)
                            .unwrap()
                            .table_name
                            .clone()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(names.iter().all(|name| name == "Order"));
        let metrics = cache.metrics();
        assert_eq!(metrics.size, 1);
        assert_eq!(metrics.hits + metrics.misses, 4);
    }
}
