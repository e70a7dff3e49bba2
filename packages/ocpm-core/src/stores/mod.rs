//! Storage implementations for the discovery engine.
//!
//! Available backends:
//! - `MemoryArtifactCache` / `MemoryBlobStore` - In-memory (testing, single process)
//! - `BlobArtifactCache` - Artifacts serialized as JSON into any `BlobStore`
//! - `FsBlobStore` - Files below a root directory

pub mod blob_cache;
pub mod fs;
pub mod memory;

pub use blob_cache::BlobArtifactCache;
pub use fs::FsBlobStore;
pub use memory::{MemoryArtifactCache, MemoryBlobStore};
