//! Domain types for discovery, filtering and rendering.

pub mod artifact;
pub mod config;
pub mod filter;
pub mod graph;
pub mod ids;
pub mod log;
pub mod metric;
pub mod petri;
pub mod render;
