//! Unit tests - file loading and environment handling
//!
//! These tests exercise configuration and catalog loading through the public API
//! without touching anything outside temporary files.

mod catalog_file_tests;
mod config_env_tests;
mod mapping_cache_tests;
