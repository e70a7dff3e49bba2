//! Typed errors for the discovery engine.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Every variant is local to a
//! single request; none of them leaves the cache in a partially written
//! state.

use thiserror::Error;

/// Errors that can occur while serving ingest/filter/evict requests.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Raw bytes are not a valid object-centric event log
    #[error("invalid event log: {0}")]
    Parse(#[from] ParseError),

    /// Mining failed on an otherwise parsed log
    #[error("discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Caller supplied an unrecognized metric name
    #[error("unknown metric: {name}")]
    InvalidMetric { name: String },

    /// Caller selected object types the log does not contain
    #[error("unknown object types: {}", unknown.join(", "))]
    InvalidObjectTypes { unknown: Vec<String> },

    /// Artifact (or its backing blob) has no entry
    #[error("artifact not found: {id}")]
    NotFound { id: String },

    /// Blob or cache backend failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Artifact (de)serialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Renderer could not produce output
    #[error("render error: {0}")]
    Render(String),
}

impl EngineError {
    /// Wrap any backend error as a storage failure.
    pub fn storage(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage(err.into())
    }

    /// Whether the error was caused by bad caller input rather than a
    /// processing failure.
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            Self::Parse(_) | Self::InvalidMetric { .. } | Self::InvalidObjectTypes { .. }
        )
    }
}

/// Errors raised while turning raw bytes into an event log.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Not well-formed JSON, or the wrong shape
    #[error("malformed log: {0}")]
    Json(#[from] serde_json::Error),

    /// Timestamp in neither RFC 3339 nor naive ISO form
    #[error("invalid timestamp '{value}' on event {event}")]
    Timestamp { event: String, value: String },

    /// Event relates to an object missing from the object table
    #[error("event {event} references unknown object {object}")]
    UnknownObject { event: String, object: String },

    /// Required section or field is absent
    #[error("missing field: {0}")]
    MissingField(String),
}

/// Errors raised by the mining provider or while normalizing its output.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Underlying mining library failed
    #[error("mining failed: {0}")]
    Mining(String),

    /// Edge references an activity missing from the activity table
    #[error("edge {source_activity} -> {target_activity} ({object_type}) references an unknown activity")]
    DanglingEdge {
        object_type: String,
        source_activity: String,
        target_activity: String,
    },

    /// Present edge key with an empty metric collection
    #[error("edge {source_activity} -> {target_activity} ({object_type}) has no {metric} entries")]
    EmptyEdgeMetric {
        object_type: String,
        source_activity: String,
        target_activity: String,
        metric: String,
    },

    /// Arc endpoint is neither a place nor a transition of its net
    #[error("arc endpoint {endpoint} is not part of the {object_type} net")]
    DanglingArc {
        object_type: String,
        endpoint: String,
    },
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Result type alias for parse operations.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Result type alias for discovery operations.
pub type DiscoveryResult<T> = std::result::Result<T, DiscoveryError>;
