//! Centralized configuration (environment variables + defaults).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_MODELS_DIR: &str = "models";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("LOG_FORMAT must be 'pretty' or 'json', got '{}'", other),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Database URL. When unset, predictions are kept in process memory.
pub fn database_url() -> Option<String> {
    non_empty_var("DATABASE_URL")
}

/// Directory holding `<model>_model.json` artifacts.
pub fn models_dir() -> PathBuf {
    non_empty_var("MODELS_DIR")
        .unwrap_or_else(|| DEFAULT_MODELS_DIR.to_string())
        .into()
}

pub fn bind_addr() -> anyhow::Result<SocketAddr> {
    let raw = non_empty_var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
    raw.parse()
        .map_err(|e| anyhow::anyhow!("BIND_ADDR '{}' is not a socket address: {}", raw, e))
}

pub fn log_level() -> String {
    non_empty_var("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

pub fn log_format() -> anyhow::Result<LogFormat> {
    non_empty_var("LOG_FORMAT").map_or(Ok(LogFormat::default()), |v| v.parse())
}

/// Settings for the HTTP server binary.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub database_url: Option<String>,
    pub models_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl ServiceConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: database_url(),
            models_dir: models_dir(),
            bind_addr: bind_addr()?,
            log_level: log_level(),
            log_format: log_format()?,
        })
    }
}
