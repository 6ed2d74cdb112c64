use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::token::TokenRequest;

/// Environment variable consulted for the signing secret when `--key` is absent
pub const SECRET_ENV_VAR: &str = "GEN_TOKEN_SECRET";

const CONFIG_DIR: &str = ".gen-token";
const CONFIG_FILE: &str = "config.toml";

/// A validation error in the configuration
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.field, self.message)
    }
}

/// Defaults for token requests, read from TOML.
///
/// `validate` only covers the file. A stored default `lifetime` must be
/// positive, while a lifetime passed with `-l` goes to the token builder
/// unchecked and may be zero or negative.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub stream_id: Option<String>,
    /// Secret stored inline. Prefer `secret_env`.
    #[serde(default)]
    pub secret: Option<String>,
    /// Name of an environment variable holding the secret
    #[serde(default)]
    pub secret_env: Option<String>,
    #[serde(default)]
    pub lifetime: Option<i64>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub vod: Option<String>,
}

/// Values supplied on the command line. Anything set here beats the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub stream_id: Option<String>,
    pub secret: Option<String>,
    pub vod_stream_id: Option<String>,
    pub ip: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub lifetime: Option<String>,
}

impl Config {
    /// Load configuration from default paths
    /// Priority: project (.gen-token/config.toml) > user (~/.gen-token/config.toml)
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        for path in Self::default_paths() {
            if path.exists() {
                let found = Self::load_from(&path)?;
                tracing::debug!(path = %path.display(), "loaded config");
                config.merge(found);
            }
        }

        Ok(config)
    }

    /// Candidate config files, lowest priority first
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(CONFIG_DIR).join(CONFIG_FILE));
        }
        paths.push(Path::new(CONFIG_DIR).join(CONFIG_FILE));
        paths
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Config) {
        if other.stream_id.is_some() {
            self.stream_id = other.stream_id;
        }
        // An inline secret and an env reference are alternatives; the later file picks one.
        if other.secret.is_some() || other.secret_env.is_some() {
            self.secret = other.secret;
            self.secret_env = other.secret_env;
        }
        if other.lifetime.is_some() {
            self.lifetime = other.lifetime;
        }
        if other.ip.is_some() {
            self.ip = other.ip;
        }
        if other.vod.is_some() {
            self.vod = other.vod;
        }
    }

    /// Validate configuration and return any errors found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.secret.is_some() && self.secret_env.is_some() {
            errors.push(ValidationError {
                field: "secret".to_string(),
                message: "Set either secret or secret_env, not both".to_string(),
            });
        }

        if let Some(var) = &self.secret_env {
            if var.is_empty() {
                errors.push(ValidationError {
                    field: "secret_env".to_string(),
                    message: "Environment variable name must not be empty".to_string(),
                });
            }
        }

        if let Some(lifetime) = self.lifetime {
            if lifetime <= 0 {
                errors.push(ValidationError {
                    field: "lifetime".to_string(),
                    message: format!("Must be greater than 0, got {}", lifetime),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Resolve the secret from config or environment
    pub fn resolve_secret(&self) -> Option<String> {
        if let Some(secret) = &self.secret {
            return Some(secret.clone());
        }
        self.secret_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
    }

    /// Build a request from command-line values, falling back to this config.
    ///
    /// A secret that cannot be found anywhere becomes an empty key so the
    /// builder reports it as missing.
    pub fn apply(&self, overrides: Overrides) -> TokenRequest {
        let secret = overrides
            .secret
            .or_else(|| self.resolve_secret())
            .unwrap_or_default();

        TokenRequest {
            stream_id: overrides.stream_id.or_else(|| self.stream_id.clone()),
            secret: secret.into_bytes(),
            vod_stream_id: overrides.vod_stream_id.or_else(|| self.vod.clone()),
            ip: overrides.ip.or_else(|| self.ip.clone()),
            start_time: overrides.start_time,
            end_time: overrides.end_time,
            lifetime: overrides
                .lifetime
                .or_else(|| self.lifetime.map(|l| l.to_string())),
        }
    }
}
