/// Dynamic (streaming) variants of the typed buffers.
///
/// Same API as the static buffers, allocated with the streaming hint. They
/// carry a caller-managed `user_offset` for ring-buffer style uploads; the
/// buffer never reads it.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use crate::declaration::{VertexDeclaration, VertexType};
use crate::error::Result;
use crate::graphics_device::{BufferUsage, GraphicsDevice};
use super::index_buffer::{IndexBuffer, IndexBufferDesc, IndexElement, IndexElementSize};
use super::vertex_buffer::{VertexBuffer, VertexBufferDesc};
use super::{IndexSource, VertexSource};

// ============================================================================
// Dynamic vertex buffer
// ============================================================================

pub struct DynamicVertexBuffer {
    inner: VertexBuffer,
    user_offset: i32,
}

impl DynamicVertexBuffer {
    pub fn from_desc(device: &Arc<GraphicsDevice>, desc: VertexBufferDesc) -> Result<Self> {
        let inner = VertexBuffer::create(device, desc, true, "galaxy3d::DynamicVertexBuffer")?;
        Ok(Self { inner, user_offset: 0 })
    }

    pub fn new(
        device: &Arc<GraphicsDevice>,
        declaration: VertexDeclaration,
        vertex_count: u32,
        usage: BufferUsage,
    ) -> Result<Self> {
        Self::from_desc(device, VertexBufferDesc { declaration, vertex_count, usage })
    }

    pub fn for_type<T: VertexType>(device: &Arc<GraphicsDevice>, vertex_count: u32, usage: BufferUsage) -> Result<Self> {
        Self::new(device, VertexDeclaration::from_type::<T>()?, vertex_count, usage)
    }

    /// Caller-side ring-buffer position
    pub fn user_offset(&self) -> i32 { self.user_offset }

    pub fn set_user_offset(&mut self, user_offset: i32) { self.user_offset = user_offset; }

    /// Always false. Content loss is not tracked: after a device reset the
    /// native handle is recreated on next use but its contents are not, so
    /// callers upload again.
    pub fn is_content_lost(&self) -> bool { false }
}

impl Deref for DynamicVertexBuffer {
    type Target = VertexBuffer;

    fn deref(&self) -> &VertexBuffer { &self.inner }
}

impl DerefMut for DynamicVertexBuffer {
    fn deref_mut(&mut self) -> &mut VertexBuffer { &mut self.inner }
}

// ============================================================================
// Dynamic index buffer
// ============================================================================

pub struct DynamicIndexBuffer {
    inner: IndexBuffer,
    user_offset: i32,
}

impl DynamicIndexBuffer {
    pub fn from_desc(device: &Arc<GraphicsDevice>, desc: IndexBufferDesc) -> Result<Self> {
        let inner = IndexBuffer::create(device, desc, true, "galaxy3d::DynamicIndexBuffer")?;
        Ok(Self { inner, user_offset: 0 })
    }

    pub fn new(
        device: &Arc<GraphicsDevice>,
        element_size: IndexElementSize,
        index_count: u32,
        usage: BufferUsage,
    ) -> Result<Self> {
        Self::from_desc(device, IndexBufferDesc { element_size, index_count, usage })
    }

    pub fn for_type<T: IndexElement>(device: &Arc<GraphicsDevice>, index_count: u32, usage: BufferUsage) -> Result<Self> {
        Self::new(device, T::ELEMENT_SIZE, index_count, usage)
    }

    pub fn user_offset(&self) -> i32 { self.user_offset }

    pub fn set_user_offset(&mut self, user_offset: i32) { self.user_offset = user_offset; }

    /// Always false, see `DynamicVertexBuffer::is_content_lost`
    pub fn is_content_lost(&self) -> bool { false }
}

impl Deref for DynamicIndexBuffer {
    type Target = IndexBuffer;

    fn deref(&self) -> &IndexBuffer { &self.inner }
}

impl DerefMut for DynamicIndexBuffer {
    fn deref_mut(&mut self) -> &mut IndexBuffer { &mut self.inner }
}

impl VertexSource for DynamicVertexBuffer {
    fn vertex_declaration(&self) -> &VertexDeclaration {
        self.inner.vertex_declaration()
    }

    fn bind(&self) -> Result<()> {
        self.inner.bind()
    }
}

impl IndexSource for DynamicIndexBuffer {
    fn index_element_size(&self) -> IndexElementSize {
        self.inner.index_element_size()
    }

    fn bind(&self) -> Result<()> {
        self.inner.bind()
    }
}

#[cfg(test)]
#[path = "dynamic_tests.rs"]
mod tests;
