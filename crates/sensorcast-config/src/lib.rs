//! Configuration system for the Sensorcast server.
//!
//! Provides TOML-based configuration with:
//! - Sections for the HTTP server, admission and rate limits, security
//!   headers, event streaming, caching, the sensor simulator and logging
//! - Config file layering (user config dir + project-local overrides)
//! - `SENSORCAST_ENV` override of the deployment environment
//! - Range validation with field-level error messages

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    CONFIG_DIR_ENV, ConfigSource, ENV_VAR, LoadedConfig, load_config, load_config_file,
    load_config_from, load_config_with_options, user_config_dir, user_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
