use std::str::FromStr;
use std::string::String;
use std::{env, fmt};

use thiserror::Error;
use tracing::level_filters::LevelFilter;

pub const DEFAULT_TAG_KEYS: &str = "name,namespace,displayName,resourceDisplayName,unit";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("error parsing {name} - {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_endpoint: String,
    pub api_token: String,
    pub tag_keys: Vec<String>,
    pub logging_level: LogLevel,
    pub forwarding_enabled: bool,
    // Per-POST timeout for the ingestion endpoint, in seconds
    pub request_timeout_seconds: u64,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum LogLevel {
    Info,
    Warn,
    Critical,
    Error,
    Debug,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s.to_uppercase().as_str() {
            "INFO" => Ok(LogLevel::Info),
            "WARN" => Ok(LogLevel::Warn),
            "CRITICAL" => Ok(LogLevel::Critical),
            "ERROR" => Ok(LogLevel::Error),
            "DEBUG" => Ok(LogLevel::Debug),
            other => Err(format!("Invalid or unsupported logging level {}", other)),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            // tracing has no CRITICAL level
            LogLevel::Critical | LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

impl Config {
    pub fn load_from_env() -> Result<Config, ConfigError> {
        let conf = Config {
            api_endpoint: env::var("API_ENDPOINT")
                .map_err(|_| ConfigError::Missing("API_ENDPOINT"))?,

            api_token: env::var("API_TOKEN").map_err(|_| ConfigError::Missing("API_TOKEN"))?,

            tag_keys: parse_tag_keys(
                &env::var("TAG_KEYS").unwrap_or_else(|_| DEFAULT_TAG_KEYS.to_string()),
            ),

            logging_level: env::var("LOGGING_LEVEL")
                .unwrap_or_else(|_| "INFO".to_string())
                .parse::<LogLevel>()
                .map_err(|reason| ConfigError::Invalid {
                    name: "LOGGING_LEVEL",
                    reason,
                })?,

            forwarding_enabled: env::var("FORWARDING_ENABLED")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(true),

            request_timeout_seconds: env::var("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "5".to_string())
                .parse::<u64>()
                .map_err(|e| ConfigError::Invalid {
                    name: "REQUEST_TIMEOUT_SECONDS",
                    reason: e.to_string(),
                })?,
        };

        Ok(conf)
    }
}

/// Splits the comma-separated TAG_KEYS value into an ordered key list.
/// Entries are trimmed, empty entries dropped; duplicates are kept as-is.
pub fn parse_tag_keys(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}
