//! Configuration System
//!
//! Layered configuration: built-in defaults, then an optional TOML file, then
//! `DOCMIGRATE__`-prefixed environment variables (`__` separates nesting, so
//! `DOCMIGRATE__GENERATION__DEFAULT_LIMIT=50` sets `generation.default_limit`).

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::network::{DependencyNetwork, InMemoryNetwork, SledNetwork};
use crate::types::{Document, GeneratorOptions, Namespace};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const ENV_PREFIX: &str = "DOCMIGRATE";
const ENV_SEPARATOR: &str = "__";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MigrateConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

/// Defaults applied to generators built from configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Job limit per generator; 0 means unlimited
    #[serde(default)]
    pub default_limit: usize,

    /// Query filter used when the caller supplies none
    #[serde(default)]
    pub default_query: Document,
}

impl GenerationConfig {
    pub fn options_for(&self, job_id: impl Into<String>, namespace: Namespace) -> GeneratorOptions {
        GeneratorOptions::new(job_id, namespace)
            .with_query(self.default_query.clone())
            .with_limit(self.default_limit)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkBackend {
    #[default]
    Memory,
    Sled,
}

/// Where dependency groups are published
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub backend: NetworkBackend,

    /// Database directory for the sled backend
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl NetworkConfig {
    pub fn open_network(&self) -> Result<Arc<dyn DependencyNetwork>, ApiError> {
        match self.backend {
            NetworkBackend::Memory => Ok(Arc::new(InMemoryNetwork::new())),
            NetworkBackend::Sled => {
                let path = self.path.as_deref().ok_or_else(|| {
                    ApiError::ConfigError("network.path is required for the sled backend".to_string())
                })?;
                debug!(path = %path.display(), "Opening sled dependency network");
                Ok(Arc::new(SledNetwork::open(path)?))
            }
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Logging(String),
    Network(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
            ValidationError::Network(msg) => write!(f, "Network: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl MigrateConfig {
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            errors.push(ValidationError::Logging(format!(
                "unknown format '{}'",
                self.logging.format
            )));
        }
        if !matches!(self.logging.output.as_str(), "stdout" | "stderr" | "file") {
            errors.push(ValidationError::Logging(format!(
                "unknown output '{}'",
                self.logging.output
            )));
        }

        if self.network.backend == NetworkBackend::Sled {
            match &self.network.path {
                None => errors.push(ValidationError::Network(
                    "sled backend requires a path".to_string(),
                )),
                Some(path) if path.as_os_str().is_empty() => errors.push(
                    ValidationError::Network("sled path cannot be empty".to_string()),
                ),
                Some(_) => {}
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from defaults, `path` (if given), and the process environment.
    pub fn load(path: Option<&Path>) -> Result<MigrateConfig, ApiError> {
        Self::load_with_env(path, None)
    }

    /// Like `load`, reading overrides from `env` instead of the process
    /// environment when it is given.
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<MigrateConfig, ApiError> {
        let mut builder = builder_with_defaults()?;
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .source(env),
        );

        let config: MigrateConfig = builder.build()?.try_deserialize()?;
        config.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })?;
        Ok(config)
    }
}

fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ApiError> {
    Ok(Config::builder()
        .set_default("generation.default_limit", 0)?
        .set_default("network.backend", "memory")?)
}
