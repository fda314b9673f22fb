//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ShutdownConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed configuration: {0}")]
    MalformedSource(String),

    #[error("failed to encode default configuration: {0}")]
    Encode(String),

    #[error("invalid duration: {}", join_errors(.0))]
    InvalidDuration(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Syntax of a configuration source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a file extension. Anything that is not `.toml`
    /// is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }
}

/// Parse and validate configuration from an in-memory source.
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<ShutdownConfig, ConfigError> {
    let config: ShutdownConfig = match format {
        // An empty YAML document deserializes to unit; treat it as all defaults.
        ConfigFormat::Yaml if content.trim().is_empty() => ShutdownConfig::default(),
        ConfigFormat::Yaml => serde_yaml::from_str(content)
            .map_err(|e| ConfigError::MalformedSource(e.to_string()))?,
        ConfigFormat::Toml => {
            toml::from_str(content).map_err(|e| ConfigError::MalformedSource(e.to_string()))?
        }
    };

    validate_config(&config).map_err(ConfigError::InvalidDuration)?;

    Ok(config)
}

/// Load and validate configuration from a YAML or TOML file.
pub fn load_config(path: &Path) -> Result<ShutdownConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config(&content, ConfigFormat::from_path(path))
}

/// Load configuration from `path`, writing the default configuration there
/// first if the file does not exist yet.
pub fn load_or_init_config(path: &Path) -> Result<ShutdownConfig, ConfigError> {
    if !path.exists() {
        write_default_config(path)?;
        tracing::info!(path = ?path, "Created default configuration file");
    }
    load_config(path)
}

fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let io_error = |source: std::io::Error| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };

    let defaults = ShutdownConfig::default();
    let content = match ConfigFormat::from_path(path) {
        ConfigFormat::Yaml => {
            serde_yaml::to_string(&defaults).map_err(|e| ConfigError::Encode(e.to_string()))?
        }
        ConfigFormat::Toml => {
            toml::to_string(&defaults).map_err(|e| ConfigError::Encode(e.to_string()))?
        }
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    fs::write(path, content).map_err(io_error)
}
