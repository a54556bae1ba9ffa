//! Configuration management for DocVault Server
//!
//! Read once from the environment at startup; nothing is reloaded while the
//! server runs.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::document::{CacheConfig, DEFAULT_MAX_DOCUMENTS, DEFAULT_MAX_MEMORY_BYTES};
use crate::service::DEFAULT_LOAD_TIMEOUT_SECS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub loader: LoaderConfig,
    pub passwords: PasswordConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub load_timeout: Duration,
}

/// Password sources applied at startup
#[derive(Debug, Clone, Default)]
pub struct PasswordConfig {
    /// Directory tree scanned for sidecar password files
    pub auto_detect_dir: Option<PathBuf>,
    /// JSON object of path or glob -> password
    pub password_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            cache: CacheConfig::default(),
            loader: LoaderConfig {
                load_timeout: Duration::from_secs(DEFAULT_LOAD_TIMEOUT_SECS),
            },
            passwords: PasswordConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Config {
            server: ServerConfig {
                host: var("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_var(&var, "SERVER_PORT", "port number", 3000)?,
            },
            cache: CacheConfig {
                max_documents: parse_var(&var, "CACHE_MAX_DOCUMENTS", "document count", DEFAULT_MAX_DOCUMENTS)?,
                max_memory_bytes: parse_var(&var, "CACHE_MAX_MEMORY_BYTES", "byte count", DEFAULT_MAX_MEMORY_BYTES)?,
            },
            loader: LoaderConfig {
                load_timeout: Duration::from_secs(parse_var(
                    &var,
                    "LOAD_TIMEOUT_SECS",
                    "number of seconds",
                    DEFAULT_LOAD_TIMEOUT_SECS,
                )?),
            },
            passwords: PasswordConfig {
                auto_detect_dir: var("PASSWORD_AUTO_DETECT_DIR").map(PathBuf::from),
                password_file: var("PASSWORD_FILE").map(PathBuf::from),
            },
        })
    }
}

fn parse_var<T, F>(var: &F, name: &'static str, expected: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value,
            expected,
        }),
        None => Ok(default),
    }
}
