//! Cached discovery artifacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::EngineError;
use crate::traits::blob::BlobHandle;
use crate::types::graph::ObjectCentricGraph;
use crate::types::log::LogSummary;
use crate::types::petri::PetriNet;

/// Opaque identifier of one ingested log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(Uuid);

impl ArtifactId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ArtifactId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ArtifactId {
    type Err = EngineError;

    /// Malformed identifiers cannot name a cached artifact.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| EngineError::NotFound { id: s.to_string() })
    }
}

/// The discovered flow graph and Petri net of one uploaded log.
///
/// `selection` records the object types the structures were discovered
/// for (`None` = the full log), so a filter request can tell whether
/// re-discovery is needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryArtifact {
    pub id: ArtifactId,
    pub source_name: String,
    /// SHA-256 of the raw upload, hex encoded
    pub source_digest: String,
    /// Blob holding the raw upload
    pub source_key: BlobHandle,
    /// Object types of the full log
    pub object_types: BTreeSet<String>,
    pub selection: Option<BTreeSet<String>>,
    pub summary: LogSummary,
    pub graph: ObjectCentricGraph,
    pub petri_net: PetriNet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Incremented on every in-place update
    pub generation: u64,
}

impl DiscoveryArtifact {
    /// Copy of this artifact holding structures re-discovered for `selection`.
    pub fn rediscovered(
        &self,
        selection: Option<BTreeSet<String>>,
        summary: LogSummary,
        graph: ObjectCentricGraph,
        petri_net: PetriNet,
    ) -> Self {
        Self {
            id: self.id,
            source_name: self.source_name.clone(),
            source_digest: self.source_digest.clone(),
            source_key: self.source_key.clone(),
            object_types: self.object_types.clone(),
            selection,
            summary,
            graph,
            petri_net,
            created_at: self.created_at,
            updated_at: Utc::now(),
            generation: self.generation + 1,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now - self.created_at > ttl
    }
}
