//! HTTP listener configuration parsing from environment variables.

use anyhow::{Context, Result};

/// Listener environment configuration
#[derive(Debug, Clone)]
pub struct ServerEnvConfig {
    pub port: u16,
    pub bind_address: String,
}

impl Default for ServerEnvConfig {
    fn default() -> Self {
        Self {
            port: 9798,
            bind_address: "0.0.0.0".to_string(),
        }
    }
}

impl ServerEnvConfig {
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            port: lookup("SPEEDTEST_PORT")
                .unwrap_or_else(|| "9798".to_string())
                .trim()
                .parse::<u16>()
                .context("Failed to parse SPEEDTEST_PORT")?,
            bind_address: lookup("SPEEDTEST_BIND_ADDRESS")
                .unwrap_or_else(|| "0.0.0.0".to_string()),
        })
    }

    /// `address:port` to listen on
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
