//! Type-Safe Configuration with Validation
//!
//! Environment-driven configuration, read once at startup. Any error here
//! stops the process before it binds its port.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

use crate::keys::{KeyError, VerificationKey};

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid port number
    #[error("Invalid port: must be between 1 and 65535")]
    InvalidPort,

    /// Missing required field
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// Parser message
        reason: String,
    },

    /// Host and port do not form a socket address
    #[error("Invalid listen address {0}")]
    InvalidAddress(String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable, for local runs
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Service configuration with validation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port (1-65535)
    pub port: u16,
    /// PEM-encoded RSA public key, `\n` escapes allowed
    pub public_key_pem: String,
    /// Leeway applied to exp/nbf/iat checks
    pub clock_skew_seconds: u64,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
    /// Log output format
    pub log_format: LogFormat,
}

impl Config {
    /// Loads configuration from environment variables with validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_source(|name| env::var(name).ok())
    }

    /// Loads configuration from an arbitrary variable lookup.
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let public_key_pem = lookup("PUBLIC_KEY_PEM")
            .filter(|pem| !pem.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingRequired("PUBLIC_KEY_PEM".to_string()))?;

        let config = Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_var(&lookup, "PORT", 8080)?,
            public_key_pem,
            clock_skew_seconds: parse_var(&lookup, "CLOCK_SKEW_SECONDS", 0)?,
            shutdown_timeout_seconds: parse_var(&lookup, "SHUTDOWN_TIMEOUT", 30)?,
            log_format: parse_var(&lookup, "LOG_FORMAT", LogFormat::Json)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.host.is_empty() {
            return Err(ConfigError::MissingRequired("HOST".to_string()));
        }
        Ok(())
    }

    /// Address the gRPC server binds to.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|_| ConfigError::InvalidAddress(addr))
    }

    /// Decodes the configured verification key.
    pub fn verification_key(&self) -> Result<VerificationKey, KeyError> {
        VerificationKey::from_pem(&self.public_key_pem)
    }
}

/// Parse a variable with a default value.
fn parse_var<T, F>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(val) => val.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
