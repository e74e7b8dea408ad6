//! Configuration module for the speedtest exporter.
//!
//! Settings are read once at startup from environment variables (optionally
//! seeded from a `.env` file), split into the measurement pipeline and the
//! HTTP listener.

mod server_config;
mod speedtest_config;

pub use server_config::ServerEnvConfig;
pub use speedtest_config::SpeedtestEnvConfig;

use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub speedtest: SpeedtestEnvConfig,
    pub server: ServerEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(&|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, e.g. a map in tests
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let speedtest =
            SpeedtestEnvConfig::from_lookup(lookup).context("Failed to load speedtest config")?;
        let server = ServerEnvConfig::from_lookup(lookup).context("Failed to load server config")?;

        Ok(Self { speedtest, server })
    }
}
