//! Configuration loading from disk and the environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::{EchoConfig, RunMode};
use crate::config::validation::{validate_config, ValidationError};

/// Port variable honoured by container platforms.
pub const ENV_PORT: &str = "PORT";
/// Mode variable; `development` turns on console access lines.
pub const ENV_MODE: &str = "NODE_ENV";
/// Overrides the access log directory.
pub const ENV_LOG_DIR: &str = "LOG_DIR";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// What happened when looking for a `.env` file. The file is read before
/// logging is up, so the outcome is reported afterwards with [`DotenvStatus::log`].
#[derive(Debug)]
pub enum DotenvStatus {
    Loaded(PathBuf),
    Missing,
    Failed(dotenvy::Error),
}

impl DotenvStatus {
    fn from_result(result: Result<PathBuf, dotenvy::Error>) -> Self {
        match result {
            Ok(path) => Self::Loaded(path),
            Err(error) if error.not_found() => Self::Missing,
            Err(error) => Self::Failed(error),
        }
    }

    pub fn log(&self) {
        match self {
            Self::Loaded(path) => tracing::info!(path = %path.display(), "Loaded .env file"),
            Self::Missing => tracing::info!("No .env file found, using environment variables"),
            Self::Failed(error) => tracing::warn!(error = %error, "Failed to load .env file"),
        }
    }
}

/// Load `.env` from the working directory or one of its parents into the
/// process environment. Variables that are already set keep their value.
pub fn load_dotenv() -> DotenvStatus {
    DotenvStatus::from_result(dotenvy::dotenv())
}

/// Same as [`load_dotenv`] for an explicit file.
pub fn load_dotenv_from(path: &Path) -> DotenvStatus {
    DotenvStatus::from_result(dotenvy::from_path(path).map(|()| path.to_path_buf()))
}

/// Values that take precedence over both the file and the environment,
/// typically from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub log_dir: Option<PathBuf>,
}

/// Load configuration: defaults, then the optional TOML file, then the
/// process environment, then `overrides`. The result is validated.
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<EchoConfig, ConfigError> {
    load_with_env(path, overrides, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] with an injectable environment lookup.
pub fn load_with_env<F>(
    path: Option<&Path>,
    overrides: &Overrides,
    env: F,
) -> Result<EchoConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => load_file(path)?,
        None => EchoConfig::default(),
    };

    apply_env(&mut config, env)?;

    if let Some(port) = overrides.port {
        config.listener.port = port;
    }
    if let Some(dir) = &overrides.log_dir {
        config.logging.dir = dir.clone();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn load_file(path: &Path) -> Result<EchoConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Apply environment variables on top of `config`. Unset or empty variables
/// leave the current value untouched.
fn apply_env<F>(config: &mut EchoConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| env(key).filter(|value| !value.is_empty());

    if let Some(value) = lookup(ENV_PORT) {
        config.listener.port = value.trim().parse().map_err(|_| ConfigError::Env {
            var: ENV_PORT,
            value: value.clone(),
        })?;
    }

    if let Some(value) = lookup(ENV_MODE) {
        // RunMode parsing is infallible.
        config.logging.mode = value.parse().unwrap_or(RunMode::Production);
    }

    if let Some(value) = lookup(ENV_LOG_DIR) {
        config.logging.dir = PathBuf::from(value);
    }

    Ok(())
}
