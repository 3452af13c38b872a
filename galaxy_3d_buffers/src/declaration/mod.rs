//! Vertex declarations
//!
//! Per-vertex layout descriptors, their structural cache, and the
//! built-in vertex types that expose a declaration.

pub mod vertex_element;
pub mod vertex_declaration;
pub mod declaration_cache;
pub mod vertex_type;

pub use vertex_element::{VertexElement, VertexElementFormat, VertexElementUsage};
pub use vertex_declaration::VertexDeclaration;
pub use declaration_cache::DeclarationCache;
pub use vertex_type::{
    VertexType,
    VertexPosition, VertexPositionColor, VertexPositionTexture,
    VertexPositionNormalTexture, VertexPositionColorTexture,
};
