/// Growable vertex and index buffers fed from borrowed byte regions.
///
/// No capacity is fixed at construction: each `set_data` may cover any
/// number of elements and the native store is reallocated (discarding its
/// contents) whenever a write ends past the last allocated size. Regions are
/// only borrowed for the duration of a call. The `*_raw` variants accept raw
/// pointers for callers that hold foreign memory.

use std::sync::Arc;
use crate::declaration::VertexDeclaration;
use crate::error::Result;
use crate::graphics_device::{BufferKind, BufferUsage, GraphicsDevice, SetDataOptions};
use super::buffer_base::{BufferBase, BufferBaseDesc};
use super::index_buffer::{check_element_size, IndexElementSize};
use super::{IndexSource, VertexSource};

// ============================================================================
// Unsafe vertex buffer
// ============================================================================

#[derive(Debug, Clone)]
pub struct UnsafeVertexBufferDesc {
    pub declaration: VertexDeclaration,
    pub usage: BufferUsage,
    pub dynamic: bool,
}

pub struct UnsafeVertexBuffer {
    base: BufferBase,
    declaration: VertexDeclaration,
}

impl UnsafeVertexBuffer {
    pub fn from_desc(device: &Arc<GraphicsDevice>, desc: UnsafeVertexBufferDesc) -> Result<Self> {
        let base = BufferBase::new(device, BufferBaseDesc {
            kind: BufferKind::Vertex,
            stride: desc.declaration.vertex_stride(),
            capacity: None,
            dynamic: desc.dynamic,
            usage: desc.usage,
            source: "galaxy3d::UnsafeVertexBuffer",
        })?;
        Ok(Self { base, declaration: desc.declaration })
    }

    pub fn declaration(&self) -> &VertexDeclaration { &self.declaration }

    /// Vertices covered by the last `set_data`
    pub fn vertex_count(&self) -> u32 { self.base.count() }

    /// Native storage high-water mark in bytes
    pub fn last_allocated_size(&self) -> u64 { self.base.last_allocated_size() }

    pub fn usage(&self) -> BufferUsage { self.base.usage() }

    pub fn is_dynamic(&self) -> bool { self.base.is_dynamic() }

    pub fn is_disposed(&self) -> bool { self.base.is_disposed() }

    pub fn is_realized(&self) -> bool { self.base.is_realized() }

    /// Upload `vertex_count` vertices from the front of `region`
    pub fn set_data(
        &mut self,
        offset_bytes: u64,
        region: &[u8],
        vertex_count: u32,
        options: SetDataOptions,
    ) -> Result<()> {
        self.base.set_region(offset_bytes, region, vertex_count, options)
    }

    /// Read `vertex_count` vertices into the front of `region`
    pub fn get_data(&self, offset_bytes: u64, region: &mut [u8], vertex_count: u32) -> Result<()> {
        self.base.get_region(offset_bytes, region, vertex_count)
    }

    /// Upload from a raw address
    ///
    /// # Safety
    ///
    /// `data` must be valid for reads of `vertex_count * vertex_stride`
    /// bytes for the duration of the call.
    pub unsafe fn set_data_raw(
        &mut self,
        offset_bytes: u64,
        data: *const u8,
        vertex_count: u32,
        options: SetDataOptions,
    ) -> Result<()> {
        let len = vertex_count as usize * self.declaration.vertex_stride() as usize;
        let region = raw_region(data, len);
        self.set_data(offset_bytes, region, vertex_count, options)
    }

    /// Read back to a raw address
    ///
    /// # Safety
    ///
    /// `data` must be valid for writes of `vertex_count * vertex_stride`
    /// bytes for the duration of the call and not aliased by the caller.
    pub unsafe fn get_data_raw(&self, offset_bytes: u64, data: *mut u8, vertex_count: u32) -> Result<()> {
        let len = vertex_count as usize * self.declaration.vertex_stride() as usize;
        let region = raw_region_mut(data, len);
        self.get_data(offset_bytes, region, vertex_count)
    }

    pub fn dispose(&mut self) {
        self.base.dispose();
    }
}

impl VertexSource for UnsafeVertexBuffer {
    fn vertex_declaration(&self) -> &VertexDeclaration {
        &self.declaration
    }

    fn bind(&self) -> Result<()> {
        self.base.bind()
    }
}

// ============================================================================
// Unsafe index buffer
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct UnsafeIndexBufferDesc {
    pub element_size: IndexElementSize,
    pub usage: BufferUsage,
    pub dynamic: bool,
}

pub struct UnsafeIndexBuffer {
    base: BufferBase,
    element_size: IndexElementSize,
}

impl UnsafeIndexBuffer {
    pub fn from_desc(device: &Arc<GraphicsDevice>, desc: UnsafeIndexBufferDesc) -> Result<Self> {
        const SOURCE: &str = "galaxy3d::UnsafeIndexBuffer";
        check_element_size(device, desc.element_size, SOURCE)?;
        let base = BufferBase::new(device, BufferBaseDesc {
            kind: BufferKind::Index,
            stride: desc.element_size.size_bytes(),
            capacity: None,
            dynamic: desc.dynamic,
            usage: desc.usage,
            source: SOURCE,
        })?;
        Ok(Self { base, element_size: desc.element_size })
    }

    pub fn element_size(&self) -> IndexElementSize { self.element_size }

    pub fn index_count(&self) -> u32 { self.base.count() }

    pub fn last_allocated_size(&self) -> u64 { self.base.last_allocated_size() }

    pub fn usage(&self) -> BufferUsage { self.base.usage() }

    pub fn is_dynamic(&self) -> bool { self.base.is_dynamic() }

    pub fn is_disposed(&self) -> bool { self.base.is_disposed() }

    pub fn is_realized(&self) -> bool { self.base.is_realized() }

    /// Upload `index_count` indices from the front of `region`
    pub fn set_data(
        &mut self,
        offset_bytes: u64,
        region: &[u8],
        index_count: u32,
        options: SetDataOptions,
    ) -> Result<()> {
        self.base.set_region(offset_bytes, region, index_count, options)
    }

    pub fn get_data(&self, offset_bytes: u64, region: &mut [u8], index_count: u32) -> Result<()> {
        self.base.get_region(offset_bytes, region, index_count)
    }

    /// Upload from a raw address
    ///
    /// # Safety
    ///
    /// `data` must be valid for reads of `index_count * index_size` bytes
    /// for the duration of the call.
    pub unsafe fn set_data_raw(
        &mut self,
        offset_bytes: u64,
        data: *const u8,
        index_count: u32,
        options: SetDataOptions,
    ) -> Result<()> {
        let len = index_count as usize * self.element_size.size_bytes() as usize;
        let region = raw_region(data, len);
        self.set_data(offset_bytes, region, index_count, options)
    }

    /// Read back to a raw address
    ///
    /// # Safety
    ///
    /// `data` must be valid for writes of `index_count * index_size` bytes
    /// for the duration of the call and not aliased by the caller.
    pub unsafe fn get_data_raw(&self, offset_bytes: u64, data: *mut u8, index_count: u32) -> Result<()> {
        let len = index_count as usize * self.element_size.size_bytes() as usize;
        let region = raw_region_mut(data, len);
        self.get_data(offset_bytes, region, index_count)
    }

    pub fn dispose(&mut self) {
        self.base.dispose();
    }
}

impl IndexSource for UnsafeIndexBuffer {
    fn index_element_size(&self) -> IndexElementSize {
        self.element_size
    }

    fn bind(&self) -> Result<()> {
        self.base.bind()
    }
}

// ===== RAW REGIONS =====

/// Borrow `len` bytes at `data`; a null or empty region becomes an empty slice
unsafe fn raw_region<'a>(data: *const u8, len: usize) -> &'a [u8] {
    if data.is_null() || len == 0 {
        return &[];
    }
    std::slice::from_raw_parts(data, len)
}

unsafe fn raw_region_mut<'a>(data: *mut u8, len: usize) -> &'a mut [u8] {
    if data.is_null() || len == 0 {
        return &mut [];
    }
    std::slice::from_raw_parts_mut(data, len)
}

#[cfg(test)]
#[path = "unsafe_buffer_tests.rs"]
mod tests;
