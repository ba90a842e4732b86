//! # Configuration Modules
//!
//! This module aggregates the static configuration loaders and the
//! case-insensitive settings map exposed to the hosting process.

/// Static configuration: JSON file, environment variables, in-memory.
pub mod config_gsdk;

/// Case-insensitive string map.
pub mod config_map;

/// Well-known map keys and environment variable names.
pub mod keys;

pub use config_gsdk::{
    process_env, ConfigSource, DefaultConfiguration, EnvLookup, EnvironmentConfiguration,
    GsdkConfiguration, JsonFileConfiguration, StaticConfiguration,
};
pub use config_map::ConfigMap;
