//! Configuration for the loader.
//!
//! Two sources feed the loader settings:
//! - Environment: `DXC_DXIL_DLL_PATH` names the substitute validator module.
//! - Files: `~/.extval/config.toml` (global) and `.extval/config.toml`
//!   (project). Project config takes precedence over global config.
//!
//! The environment variable wins over `[validator] path` from either file.
//! Configuration is read, never written.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::loader::errors::ConfigError;

/// Environment variable naming the substitute validator module.
pub const DXIL_PATH_ENV: &str = "DXC_DXIL_DLL_PATH";

/// Logical name of the default compiler module.
pub const DEFAULT_COMPILER_LIBRARY: &str = "dxcompiler";

/// Extval configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Compiler module settings
    pub compiler: CompilerConfig,

    /// Validator module settings
    pub validator: ValidatorConfig,
}

/// Compiler module settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Logical module name or path (defaults to `dxcompiler`)
    pub library: Option<String>,
}

/// Validator module settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Absolute path to a substitute validator module
    pub path: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.compiler.library.is_some() {
            self.compiler.library = other.compiler.library;
        }
        if other.validator.path.is_some() {
            self.validator.path = other.validator.path;
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.extval/config.toml)
/// 2. Global config (~/.extval/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global extval config directory (~/.extval).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".extval"))
}

/// Get the global config path (~/.extval/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.extval/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".extval").join("config.toml")
}

/// Raw loader inputs, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderSettings {
    /// Compiler module name or path
    pub compiler_library: String,

    /// Unvalidated substitute validator path, kept as raw OS bytes
    pub dxil_dll_path: Option<OsString>,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        LoaderSettings {
            compiler_library: DEFAULT_COMPILER_LIBRARY.to_string(),
            dxil_dll_path: None,
        }
    }
}

impl LoaderSettings {
    /// Combine file configuration with the process environment.
    pub fn from_env(config: &Config) -> Self {
        let env_value = std::env::var_os(DXIL_PATH_ENV);
        Self::from_parts(config, env_value)
    }

    /// Combine file configuration with an explicit environment value.
    pub fn from_parts(config: &Config, env_value: Option<OsString>) -> Self {
        let compiler_library = config
            .compiler
            .library
            .clone()
            .unwrap_or_else(|| DEFAULT_COMPILER_LIBRARY.to_string());

        // A set-but-empty variable still disables substitution.
        let dxil_dll_path = match env_value {
            Some(value) => Some(value),
            None => config.validator.path.clone().map(OsString::from),
        };

        LoaderSettings {
            compiler_library,
            dxil_dll_path,
        }
    }

    /// Override the compiler module.
    pub fn with_compiler_library(mut self, library: impl Into<String>) -> Self {
        self.compiler_library = library.into();
        self
    }

    /// Override the substitute validator path.
    pub fn with_dxil_dll_path<S: Into<OsString>>(mut self, path: Option<S>) -> Self {
        self.dxil_dll_path = path.map(Into::into);
        self
    }
}

/// Validate the substitute module setting.
///
/// `Ok(None)` means substitution is not wanted. A value must name an
/// absolute path to an existing file.
pub fn resolve_substitute_path(value: Option<&OsStr>) -> Result<Option<PathBuf>, ConfigError> {
    let value = match value {
        Some(v) if !v.is_empty() => v,
        _ => return Ok(None),
    };

    let path = PathBuf::from(value);
    if !path.is_absolute() {
        return Err(ConfigError::RelativePath { path });
    }
    if !path.is_file() {
        return Err(ConfigError::PathNotFound { path });
    }

    Ok(Some(path))
}
