use anyhow::{Context, Result};
use chrono::Duration;
use dotenvy::dotenv;
use ocpm_core::EngineConfig;
use std::env;
use std::path::PathBuf;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the filesystem blob store
    pub data_dir: PathBuf,
    pub artifact_ttl: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let ttl_hours = env::var("OCPM_ARTIFACT_TTL_HOURS").unwrap_or_else(|_| "24".to_string());

        Ok(Self {
            data_dir: env::var("OCPM_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./ocpm-data")),
            artifact_ttl: parse_ttl_hours(&ttl_hours)?,
        })
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default().with_artifact_ttl(self.artifact_ttl)
    }
}

/// Parse a TTL given in whole, non-negative hours.
fn parse_ttl_hours(value: &str) -> Result<Duration> {
    let hours: u64 = value
        .trim()
        .parse()
        .context("OCPM_ARTIFACT_TTL_HOURS must be a non-negative whole number of hours")?;
    i64::try_from(hours)
        .ok()
        .and_then(Duration::try_hours)
        .with_context(|| format!("OCPM_ARTIFACT_TTL_HOURS={hours} is out of range"))
}
