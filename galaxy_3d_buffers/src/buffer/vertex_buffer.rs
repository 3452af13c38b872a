/// Typed vertex buffer with a fixed vertex declaration and capacity.

use std::sync::Arc;
use bytemuck::Pod;
use crate::declaration::{VertexDeclaration, VertexType};
use crate::error::Result;
use crate::graphics_device::{BufferKind, BufferUsage, GraphicsDevice, SetDataOptions};
use super::buffer_base::{BufferBase, BufferBaseDesc};
use super::VertexSource;

// ===== VERTEX BUFFER DESC =====

/// Descriptor for creating a VertexBuffer
#[derive(Debug, Clone)]
pub struct VertexBufferDesc {
    /// Layout of one vertex; its stride is the buffer's element size
    pub declaration: VertexDeclaration,
    /// Capacity in vertices
    pub vertex_count: u32,
    pub usage: BufferUsage,
}

// ===== VERTEX BUFFER =====

/// GPU vertex buffer
///
/// The native handle is created on first `set_data`, `get_data` or bind,
/// released on device reset and re-created on next use.
pub struct VertexBuffer {
    base: BufferBase,
    declaration: VertexDeclaration,
}

impl VertexBuffer {
    /// Create a static vertex buffer
    pub fn from_desc(device: &Arc<GraphicsDevice>, desc: VertexBufferDesc) -> Result<Self> {
        Self::create(device, desc, false, "galaxy3d::VertexBuffer")
    }

    pub(crate) fn create(
        device: &Arc<GraphicsDevice>,
        desc: VertexBufferDesc,
        dynamic: bool,
        source: &'static str,
    ) -> Result<Self> {
        let base = BufferBase::new(device, BufferBaseDesc {
            kind: BufferKind::Vertex,
            stride: desc.declaration.vertex_stride(),
            capacity: Some(desc.vertex_count),
            dynamic,
            usage: desc.usage,
            source,
        })?;
        Ok(Self { base, declaration: desc.declaration })
    }

    pub fn new(
        device: &Arc<GraphicsDevice>,
        declaration: VertexDeclaration,
        vertex_count: u32,
        usage: BufferUsage,
    ) -> Result<Self> {
        Self::from_desc(device, VertexBufferDesc { declaration, vertex_count, usage })
    }

    /// Create a buffer laid out for vertex type `T`
    pub fn for_type<T: VertexType>(device: &Arc<GraphicsDevice>, vertex_count: u32, usage: BufferUsage) -> Result<Self> {
        Self::new(device, VertexDeclaration::from_type::<T>()?, vertex_count, usage)
    }

    // ===== ACCESSORS =====

    pub fn declaration(&self) -> &VertexDeclaration { &self.declaration }

    /// Number of valid vertices (set by the last `set_data`)
    pub fn vertex_count(&self) -> u32 { self.base.count() }

    /// Capacity in vertices
    pub fn capacity(&self) -> u32 { self.base.capacity().unwrap_or(0) }

    pub fn usage(&self) -> BufferUsage { self.base.usage() }

    pub fn is_dynamic(&self) -> bool { self.base.is_dynamic() }

    pub fn is_disposed(&self) -> bool { self.base.is_disposed() }

    /// Whether the native handle currently exists
    pub fn is_realized(&self) -> bool { self.base.is_realized() }

    pub fn device(&self) -> &Arc<GraphicsDevice> { self.base.device() }

    // ===== DATA =====

    /// Upload vertices or vertex fields
    ///
    /// `element_stride` is the size of one caller element in bytes (0 for
    /// `size_of::<T>()`). When it is a whole number of vertices the data is
    /// copied as is; otherwise each element is written at
    /// `offset_bytes + i * vertex_stride`, which updates one field of
    /// consecutive vertices.
    pub fn set_data<T: Pod>(
        &mut self,
        offset_bytes: u64,
        data: &[T],
        element_stride: u32,
        options: SetDataOptions,
    ) -> Result<()> {
        self.base.set_typed(offset_bytes, data, element_stride, options)
    }

    /// Upload `data` from the start of the buffer
    pub fn set_data_all<T: Pod>(&mut self, data: &[T]) -> Result<()> {
        self.set_data(0, data, 0, SetDataOptions::None)
    }

    /// Read back vertices or vertex fields, with the same layout rules as `set_data`
    pub fn get_data<T: Pod>(&self, offset_bytes: u64, data: &mut [T], element_stride: u32) -> Result<()> {
        self.base.get_typed(offset_bytes, data, element_stride)
    }

    /// Read back `data.len()` elements from the start of the buffer
    pub fn get_data_all<T: Pod>(&self, data: &mut [T]) -> Result<()> {
        self.get_data(0, data, 0)
    }

    /// Destroy the native handle now. Further use fails with `InvalidResource`.
    pub fn dispose(&mut self) {
        self.base.dispose();
    }
}

impl VertexSource for VertexBuffer {
    fn vertex_declaration(&self) -> &VertexDeclaration {
        &self.declaration
    }

    fn bind(&self) -> Result<()> {
        self.base.bind()
    }
}

#[cfg(test)]
#[path = "vertex_buffer_tests.rs"]
mod tests;
