//! Vertex and index buffers
//!
//! - `VertexBuffer` / `IndexBuffer`: typed, fixed capacity, static allocation
//! - `DynamicVertexBuffer` / `DynamicIndexBuffer`: same, streaming allocation
//! - `UnsafeVertexBuffer` / `UnsafeIndexBuffer`: byte regions, growable store

mod buffer_base;
pub mod dynamic;
pub mod index_buffer;
pub mod unsafe_buffer;
pub mod vertex_buffer;

pub use dynamic::{DynamicIndexBuffer, DynamicVertexBuffer};
pub use index_buffer::{IndexBuffer, IndexBufferDesc, IndexElement, IndexElementSize};
pub use unsafe_buffer::{UnsafeIndexBuffer, UnsafeIndexBufferDesc, UnsafeVertexBuffer, UnsafeVertexBufferDesc};
pub use vertex_buffer::{VertexBuffer, VertexBufferDesc};

use crate::declaration::VertexDeclaration;
use crate::error::Result;

/// A buffer the device can bind as vertex input
pub trait VertexSource {
    fn vertex_declaration(&self) -> &VertexDeclaration;

    /// Realize the native handle if needed and bind it
    fn bind(&self) -> Result<()>;
}

/// A buffer the device can bind as index input
pub trait IndexSource {
    fn index_element_size(&self) -> IndexElementSize;

    /// Realize the native handle if needed and bind it
    fn bind(&self) -> Result<()>;
}
