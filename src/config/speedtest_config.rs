//! Speedtest configuration parsing from environment variables.
//!
//! This module handles the cache, timeout and target settings of the
//! measurement pipeline.

use crate::domain::target::TargetSet;
use anyhow::{Context, Result, ensure};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Speedtest environment configuration
#[derive(Debug, Clone)]
pub struct SpeedtestEnvConfig {
    /// Minimum interval between two real measurements; zero disables caching
    pub cache_ttl: Duration,
    /// Hard limit for one run of the tool
    pub timeout: Duration,
    pub targets: TargetSet,
    pub binary: PathBuf,
}

impl Default for SpeedtestEnvConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::ZERO,
            timeout: Duration::from_secs(90),
            targets: TargetSet::Auto,
            binary: PathBuf::from("speedtest"),
        }
    }
}

impl SpeedtestEnvConfig {
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let cache_seconds = lookup("SPEEDTEST_CACHE_FOR")
            .unwrap_or_else(|| "0".to_string())
            .trim()
            .parse::<u64>()
            .context("Failed to parse SPEEDTEST_CACHE_FOR")?;

        let timeout_seconds = lookup("SPEEDTEST_TIMEOUT")
            .unwrap_or_else(|| "90".to_string())
            .trim()
            .parse::<u64>()
            .context("Failed to parse SPEEDTEST_TIMEOUT")?;
        ensure!(timeout_seconds > 0, "SPEEDTEST_TIMEOUT must be greater than zero");

        let targets = match lookup("SPEEDTEST_SERVER") {
            Some(list) => TargetSet::from_str(&list).context("Failed to parse SPEEDTEST_SERVER")?,
            None => TargetSet::Auto,
        };

        let binary = lookup("SPEEDTEST_BINARY")
            .filter(|b| !b.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("speedtest"));

        Ok(Self {
            cache_ttl: Duration::from_secs(cache_seconds),
            timeout: Duration::from_secs(timeout_seconds),
            targets,
            binary,
        })
    }
}
