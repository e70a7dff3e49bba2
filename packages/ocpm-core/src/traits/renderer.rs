//! Renderer abstraction.

use crate::error::Result;
use crate::types::graph::ObjectCentricGraph;
use crate::types::petri::PetriNet;
use crate::types::render::RenderParams;

/// Borrowed view of the model selected by a filter request.
#[derive(Debug, Clone, Copy)]
pub enum ModelView<'a> {
    FlowGraph(&'a ObjectCentricGraph),
    PetriNet(&'a PetriNet),
}

/// Renderer output in the requested format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Text(String),
    Bytes(Vec<u8>),
}

impl Rendered {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Rendered::Text(text) => text.as_bytes(),
            Rendered::Bytes(bytes) => bytes,
        }
    }
}

/// Turns a model plus parameters into a visual format.
pub trait Renderer: Send + Sync {
    fn render(&self, model: ModelView<'_>, params: &RenderParams) -> Result<Rendered>;
}
