//! Core trait abstractions.
//!
//! These traits define the collaborators the engine depends on: mining,
//! artifact caching, blob persistence and rendering.

pub mod blob;
pub mod cache;
pub mod miner;
pub mod renderer;
