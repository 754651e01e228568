use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_STATIC_DIR: &str = "frontend/dist";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Prebuilt client bundle served on non-WebSocket requests
    pub static_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid PORT value: {0}")]
    InvalidPort(String),

    #[error("Invalid BIND_ADDRESS value: {0}")]
    InvalidBindAddress(String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    ///
    /// `BIND_ADDRESS` wins over `PORT` when both are set.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = match (vars.get("BIND_ADDRESS"), vars.get("PORT")) {
            (Some(addr), _) => addr
                .parse()
                .map_err(|_| ConfigError::InvalidBindAddress(addr.clone()))?,
            (None, Some(port)) => {
                let port: u16 = port
                    .parse()
                    .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
                SocketAddr::from(([0, 0, 0, 0], port))
            }
            (None, None) => SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
        };

        let static_dir = vars
            .get("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));

        Ok(Config {
            bind_address,
            static_dir,
        })
    }
}
