//! Configuration for SNP deployments
//!
//! Loads retry budgets and timing from a TOML file so node firmware and the
//! coordinator share one tuning surface. All values have defaults matching
//! the reference deployment.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level SNP configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnpConfig {
    pub node: NodeConfig,
    pub server: ServerConfig,
}

/// Node role tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeConfig {
    /// HELLO attempts per announcement round
    pub hello_attempts: u8,
    /// Idle between HELLO attempts (milliseconds)
    pub hello_interval_ms: u16,
    /// Poll rounds to serve queries before giving up on a SLEEP command
    pub poll_attempts: u8,
    /// Idle between poll rounds (milliseconds)
    pub poll_interval_ms: u16,
    /// Sleep duration before the first SLEEP command arrives (milliseconds)
    pub default_sleep_ms: u16,
}

/// Server role tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Bound for the incoming-message wait, in milliseconds
    ///
    /// `None` keeps the unbounded wait of the reference deployment.
    pub wait_timeout_ms: Option<u64>,
    /// Sleep duration to command after a completed poll cycle (milliseconds)
    pub sleep_duration_ms: u16,
}

impl SnpConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: SnpConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Reference deployment defaults
    pub fn defaults() -> Self {
        Self {
            node: NodeConfig {
                hello_attempts: 10,
                hello_interval_ms: 250,
                poll_attempts: 100,
                poll_interval_ms: 250,
                default_sleep_ms: 1000,
            },
            server: ServerConfig {
                wait_timeout_ms: None,
                sleep_duration_ms: 60000,
            },
        }
    }
}

impl Default for SnpConfig {
    fn default() -> Self {
        Self::defaults()
    }
}
