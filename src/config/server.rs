use crate::core::{AppError, Result};
use std::env;

/// HTTP listener settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    /// Seconds in-flight webhook and render requests get to finish on shutdown
    pub shutdown_timeout: u64,
}

impl ServerConfig {
    pub fn new(host: String, port: u16) -> Self {
        Self {
            host,
            port,
            // renders block on an external process, so oversubscribe the cores
            workers: num_cpus::get() * 2,
            shutdown_timeout: 30,
        }
    }

    pub fn from_env() -> Result<Self> {
        let host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_var("SERVER_PORT", 8080)?;

        let mut config = Self::new(host, port);
        config.workers = parse_var("SERVER_WORKERS", config.workers)?;
        config.shutdown_timeout = parse_var("SERVER_SHUTDOWN_TIMEOUT_SECS", config.shutdown_timeout)?;

        if config.workers == 0 {
            return Err(AppError::Configuration(
                "SERVER_WORKERS must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration(format!("Invalid {}", name))),
        Err(_) => Ok(default),
    }
}
