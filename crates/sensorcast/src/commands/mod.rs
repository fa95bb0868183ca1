//! CLI command handlers.

pub mod config;
pub mod serve;

use sensorcast_config::LoadedConfig;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Verbose output enabled.
    pub verbose: bool,
    /// Configuration after discovery, before command-line overrides.
    pub loaded: LoadedConfig,
}
