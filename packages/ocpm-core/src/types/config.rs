//! Engine configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::types::filter::FilterSpec;

/// Process-wide settings passed into [`crate::DiscoveryEngine`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Artifacts older than this are removed by
    /// [`crate::DiscoveryEngine::evict_expired`].
    ///
    /// Default: 24 hours.
    #[serde(with = "ttl_seconds")]
    pub artifact_ttl: Duration,

    /// Filter used to build the parameters returned by `ingest`.
    pub default_filter: FilterSpec,

    /// Blob key prefix of serialized artifacts.
    ///
    /// Default: `artifacts/`.
    pub artifact_prefix: String,

    /// Blob key prefix of uploaded raw logs.
    ///
    /// Default: `logs/`.
    pub log_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            artifact_ttl: Duration::hours(24),
            default_filter: FilterSpec::default(),
            artifact_prefix: "artifacts/".to_string(),
            log_prefix: "logs/".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the artifact TTL. Negative durations are treated as zero.
    pub fn with_artifact_ttl(mut self, ttl: Duration) -> Self {
        self.artifact_ttl = ttl.max(Duration::zero());
        self
    }

    pub fn with_default_filter(mut self, filter: FilterSpec) -> Self {
        self.default_filter = filter;
        self
    }

    pub fn with_artifact_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.artifact_prefix = prefix.into();
        self
    }

    pub fn with_log_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.log_prefix = prefix.into();
        self
    }
}

mod ttl_seconds {
    use chrono::Duration;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ttl: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(ttl.num_seconds().max(0).unsigned_abs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let seconds = u64::deserialize(deserializer)?;
        i64::try_from(seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| D::Error::custom(format!("artifact_ttl of {seconds}s is out of range")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_ttl_is_clamped_to_zero() {
        let config = EngineConfig::default().with_artifact_ttl(Duration::hours(-1));
        assert_eq!(config.artifact_ttl, Duration::zero());
    }

    #[test]
    fn ttl_serializes_as_seconds() {
        let config = EngineConfig::default();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["artifact_ttl"], 86_400);

        let back: EngineConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back.artifact_ttl, Duration::hours(24));
    }

    #[test]
    fn out_of_range_ttl_is_a_deserialize_error() {
        let mut json = serde_json::to_value(EngineConfig::default()).unwrap();

        json["artifact_ttl"] = serde_json::json!(u64::MAX);
        assert!(serde_json::from_value::<EngineConfig>(json.clone()).is_err());

        json["artifact_ttl"] = serde_json::json!(-1);
        assert!(serde_json::from_value::<EngineConfig>(json).is_err());
    }
}
