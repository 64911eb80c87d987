pub mod annotations;
pub mod catalog_config;
pub mod column;
pub mod errors;
pub mod mapping_cache;
pub mod registry;
pub mod table_mapping;
pub mod types;
pub mod value;

// Re-export commonly used types
pub use annotations::{Annotation, AnnotationKind, IndexSpec};
pub use catalog_config::{CatalogConfig, LoadedCatalog};
pub use column::{Column, ColumnModel};
pub use errors::SchemaError;
pub use mapping_cache::{MappingCache, MappingCacheConfig, MappingCacheKey};
pub use registry::{AttributeRegistry, MemberBinding};
pub use table_mapping::{CreateFlags, SchemaMapper, TableMapping};
pub use types::{EnumDescriptor, MemberDescriptor, TypeCatalog, TypeDescriptor, ValueType};
pub use value::{CompositeValue, EnumValue, Value};
