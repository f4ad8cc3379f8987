//! Environment-driven server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Configuration failures surfaced at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable {name}")]
    Missing { name: &'static str },

    /// An environment variable holds an unusable value.
    #[error("invalid value for {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

/// Runtime configuration assembled from the environment.
///
/// | Variable | Default | Meaning |
/// |---|---|---|
/// | `DATABASE_URL` | required | PostgreSQL connection string |
/// | `BIND_ADDR` | `0.0.0.0:8000` | Listen address |
/// | `MEDIA_ROOT` | `media` | Directory for uploaded recipe images |
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub media_root: PathBuf,
}

impl ServerConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing {
            name: "DATABASE_URL",
        })?;

        let bind_addr = match std::env::var("BIND_ADDR") {
            Ok(raw) => raw.parse().map_err(|err| ConfigError::Invalid {
                name: "BIND_ADDR",
                message: format!("{err}"),
            })?,
            Err(_) => SocketAddr::from(([0, 0, 0, 0], 8000)),
        };

        let media_root = std::env::var("MEDIA_ROOT")
            .map_or_else(|_| PathBuf::from("media"), PathBuf::from);

        Ok(Self {
            database_url,
            bind_addr,
            media_root,
        })
    }
}
