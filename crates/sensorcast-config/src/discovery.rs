//! Config file discovery and layered merging.
//!
//! Resolution order (later overrides earlier):
//! 1. `~/.config/sensorcast/config.toml` (user config)
//! 2. `./sensorcast.toml` (project-local)
//! 3. `SENSORCAST_ENV` environment variable (environment only)
//! 4. CLI arguments (handled externally)

use std::path::{Path, PathBuf};

use crate::{ConfigError, Environment, Result, SensorcastConfig};

/// Default config filename for project-local config.
const PROJECT_CONFIG_FILE: &str = "sensorcast.toml";

/// Default config filename within the user config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Application name for config directory resolution.
const APP_NAME: &str = "sensorcast";

/// Environment variable to override the user config directory.
pub const CONFIG_DIR_ENV: &str = "SENSORCAST_CONFIG_DIR";

/// Environment variable to override the deployment environment.
pub const ENV_VAR: &str = "SENSORCAST_ENV";

/// Tracks where each config layer was loaded from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Path to the config file.
    pub path: PathBuf,
    /// Whether the file was found and loaded.
    pub loaded: bool,
}

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The merged configuration.
    pub config: SensorcastConfig,
    /// Sources that were checked, in order of precedence (lowest first).
    pub sources: Vec<ConfigSource>,
    /// Warnings generated during loading (e.g., unparseable layers).
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Get paths of sources that were actually loaded.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Load configuration by discovering and merging all config layers.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// Load configuration with explicit control over the user config directory.
///
/// `config_dir` overrides both `SENSORCAST_CONFIG_DIR` and the platform default.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    let mut config = SensorcastConfig::new();
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    // 1. User config: explicit override, then env var, then platform default
    let user_config_path = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => user_config_path(),
    };
    if let Some(path) = user_config_path {
        sources.push(load_layer(&mut config, &path, &mut warnings));
    }

    // 2. Project-local config
    let project_path = project_dir
        .map(|d| d.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
    sources.push(load_layer(&mut config, &project_path, &mut warnings));

    // 3. Environment override
    apply_env_override(&mut config, std::env::var(ENV_VAR).ok().as_deref())?;

    Ok(LoadedConfig {
        config,
        sources,
        warnings,
    })
}

/// Load config from a specific file path (no discovery).
pub fn load_config_file(path: &Path) -> Result<SensorcastConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    SensorcastConfig::from_toml(&contents)
}

/// Load an explicitly chosen config file, skipping discovery.
///
/// Unlike discovered layers, a file that fails to load is an error.
/// `SENSORCAST_ENV` still applies on top.
pub fn load_config_from(path: &Path) -> Result<LoadedConfig> {
    let mut config = load_config_file(path)?;
    apply_env_override(&mut config, std::env::var(ENV_VAR).ok().as_deref())?;

    Ok(LoadedConfig {
        config,
        sources: vec![ConfigSource {
            path: path.to_path_buf(),
            loaded: true,
        }],
        warnings: Vec::new(),
    })
}

/// Get the user config file path.
pub fn user_config_path() -> Option<PathBuf> {
    user_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// Get the user config directory for sensorcast.
///
/// Checks `SENSORCAST_CONFIG_DIR` first, then falls back to the platform default.
pub fn user_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Apply a `SENSORCAST_ENV` value. Empty or unset leaves the config alone.
pub(crate) fn apply_env_override(config: &mut SensorcastConfig, value: Option<&str>) -> Result<()> {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        config.env = Some(value.parse::<Environment>()?);
    }
    Ok(())
}

/// Try to load a config file and merge it into the existing config.
///
/// A file that exists but fails to load is reported as a warning, not an error.
fn load_layer(
    config: &mut SensorcastConfig,
    path: &Path,
    warnings: &mut Vec<String>,
) -> ConfigSource {
    if !path.is_file() {
        return ConfigSource {
            path: path.to_path_buf(),
            loaded: false,
        };
    }

    match load_config_file(path) {
        Ok(layer) => {
            config.merge(layer);
            ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            }
        }
        Err(e) => {
            warnings.push(format!("Failed to load {}: {}", path.display(), e));
            ConfigSource {
                path: path.to_path_buf(),
                loaded: false,
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[server]
port = 9000
"#,
        )
        .unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.server().port, 9000);
    }

    #[test]
    fn test_load_config_from_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[cache]\nttl_secs = 5\n").unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.config.cache().ttl_secs, 5);
        assert_eq!(loaded.loaded_from(), vec![path.as_path()]);
        assert!(loaded.warnings.is_empty());

        fs::write(&path, "[cache\n").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let err = load_config_file(Path::new("/nonexistent/sensorcast.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_layering_project_overrides_user() {
        let user_dir = TempDir::new().unwrap();
        let project_dir = TempDir::new().unwrap();

        fs::write(
            user_dir.path().join("config.toml"),
            r#"
[server]
port = 9000

[cache]
ttl_secs = 5
"#,
        )
        .unwrap();
        fs::write(
            project_dir.path().join("sensorcast.toml"),
            r#"
[server]
port = 9100
"#,
        )
        .unwrap();

        let loaded =
            load_config_with_options(Some(project_dir.path()), Some(user_dir.path())).unwrap();

        assert_eq!(loaded.config.server().port, 9100);
        assert_eq!(loaded.config.cache().ttl_secs, 5);
        assert_eq!(loaded.loaded_from().len(), 2);
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn test_no_files_gives_defaults() {
        let user_dir = TempDir::new().unwrap();
        let project_dir = TempDir::new().unwrap();

        let loaded =
            load_config_with_options(Some(project_dir.path()), Some(user_dir.path())).unwrap();

        assert!(loaded.loaded_from().is_empty());
        assert_eq!(loaded.config.server().port, 8080);
    }

    #[test]
    fn test_broken_layer_is_a_warning() {
        let user_dir = TempDir::new().unwrap();
        let project_dir = TempDir::new().unwrap();
        fs::write(project_dir.path().join("sensorcast.toml"), "[server\nport = ").unwrap();

        let loaded =
            load_config_with_options(Some(project_dir.path()), Some(user_dir.path())).unwrap();

        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.loaded_from().is_empty());
    }

    #[test]
    fn test_env_override() {
        let mut config = SensorcastConfig::from_toml("env = \"dev\"\n").unwrap();

        apply_env_override(&mut config, None).unwrap();
        assert_eq!(config.env(), Environment::Dev);

        apply_env_override(&mut config, Some("")).unwrap();
        assert_eq!(config.env(), Environment::Dev);

        apply_env_override(&mut config, Some("prod")).unwrap();
        assert_eq!(config.env(), Environment::Prod);

        assert!(apply_env_override(&mut config, Some("staging")).is_err());
    }
}
