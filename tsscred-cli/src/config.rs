//! CLI configuration handling.
//!
//! The config file holds connection defaults only. It never holds the
//! password: unknown keys, including `password`, are rejected.

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tsscred_core::ResolverConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Default Secret Server base URL.
    pub base_url: Option<String>,

    /// Default application user name.
    pub username: Option<String>,

    /// Default application user domain.
    pub domain: Option<String>,

    /// HTTP client settings.
    pub resolver: ResolverConfig,

    /// Path to the configuration file that was loaded.
    #[serde(skip)]
    pub config_path: PathBuf,
}

/// Default location of the config file.
pub fn default_config_path() -> PathBuf {
    project_dirs()
        .map(|d| d.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("tsscred.toml"))
}

/// Load configuration.
///
/// An explicit `path` must exist. Without one, the default location is
/// used when present and built-in defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    match path {
        Some(path) => {
            if !path.exists() {
                bail!("config file {:?} does not exist", path);
            }
            load_from_path(path)
        }
        None => {
            let path = default_config_path();
            if path.exists() {
                load_from_path(&path)
            } else {
                Ok(CliConfig {
                    config_path: path,
                    ..CliConfig::default()
                })
            }
        }
    }
}

/// Parse a config file.
pub fn load_from_path(path: &Path) -> Result<CliConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {:?}", path))?;
    let mut config: CliConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config from {:?}", path))?;
    config.config_path = path.to_path_buf();
    Ok(config)
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "raibid-labs", "tsscred")
}
