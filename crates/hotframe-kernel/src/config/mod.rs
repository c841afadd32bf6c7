//! Configuration loading
//!
//! Reload settings can live in YAML, TOML, JSON, INI, RON or JSON5 files.
//! Content goes through environment variable substitution (`${VAR}` and
//! `$VAR`) before parsing, and environment overrides can be layered on top
//! with [`load_with_env`].

use config::{Config as Cfg, Environment, File};
use regex::Regex;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, trace};

pub use config::FileFormat;

mod reload;
pub use reload::{ReloadConfig, WatchConfig};

static BRACED_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("braced env var pattern is valid")
});

static SIMPLE_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)\b").expect("simple env var pattern is valid")
});

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    Parse(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Detect configuration format from file extension
pub fn detect_format(path: impl AsRef<Path>) -> ConfigResult<FileFormat> {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ConfigError::UnsupportedFormat("No file extension found".to_string()))?;

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        "ini" => Ok(FileFormat::Ini),
        "ron" => Ok(FileFormat::Ron),
        "json5" => Ok(FileFormat::Json5),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

/// Substitute environment variables in a string
///
/// Unset variables are left untouched.
pub fn substitute_env_vars(content: &str) -> String {
    let result = BRACED_VAR.replace_all(content, |caps: &regex::Captures| lookup_var(caps));
    SIMPLE_VAR
        .replace_all(&result, |caps: &regex::Captures| lookup_var(caps))
        .into_owned()
}

fn lookup_var(caps: &regex::Captures) -> String {
    match std::env::var(&caps[1]) {
        Ok(value) => value,
        Err(_) => {
            trace!("Environment variable {} is not set, keeping {}", &caps[1], &caps[0]);
            caps[0].to_string()
        }
    }
}

fn deserialize<T: DeserializeOwned>(builder: config::ConfigBuilder<config::builder::DefaultState>) -> ConfigResult<T> {
    let config = builder
        .build()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::Serialization(e.to_string()))
}

fn read_source(path: &Path) -> ConfigResult<File<config::FileSourceString, FileFormat>> {
    let format = detect_format(path)?;
    debug!("Loading {:?} configuration from {:?}", format, path);
    let content = std::fs::read_to_string(path)?;
    Ok(File::from_str(&substitute_env_vars(&content), format))
}

/// Load configuration from a file, detecting the format from its extension.
pub fn load_config<T>(path: impl AsRef<Path>) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    deserialize(Cfg::builder().add_source(read_source(path.as_ref())?))
}

/// Load configuration from a string with explicit format
pub fn from_str<T>(content: &str, format: FileFormat) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    deserialize(Cfg::builder().add_source(File::from_str(&substitute_env_vars(content), format)))
}

/// Merge multiple configuration sources; later sources override earlier ones.
pub fn merge_configs<T>(sources: &[(&str, FileFormat)]) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let mut builder = Cfg::builder();
    for (content, format) in sources {
        builder = builder.add_source(File::from_str(&substitute_env_vars(content), *format));
    }
    deserialize(builder)
}

/// Load configuration with environment variable overrides
///
/// Variables use `prefix` and `__` for nesting, e.g. `HOTFRAME_WATCH__RECURSIVE`.
pub fn load_with_env<T>(path: impl AsRef<Path>, env_prefix: &str) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    deserialize(
        Cfg::builder()
            .add_source(read_source(path.as_ref())?)
            .add_source(Environment::with_prefix(env_prefix).separator("__")),
    )
}
