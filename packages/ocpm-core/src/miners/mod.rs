//! Log-mining implementations.
//!
//! Available miners:
//! - `JsonOcelMiner` - OCEL 1.0 JSON uploads, DFG-shaped Petri nets

pub mod ocel_json;

pub use ocel_json::{JsonOcelMiner, OcelEvent, OcelLog};
