//! Event log summaries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Counts describing a parsed (or type-filtered) log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSummary {
    pub object_types: BTreeSet<String>,
    pub event_count: usize,
    pub object_count: usize,
}
