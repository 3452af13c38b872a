/// Typed index buffer with 16-bit or 32-bit indices.

use std::sync::Arc;
use bytemuck::Pod;
use crate::engine_bail;
use crate::error::Result;
use crate::graphics_device::{BufferKind, BufferUsage, GraphicsDevice, SetDataOptions};
use super::buffer_base::{BufferBase, BufferBaseDesc};
use super::IndexSource;

// ===== INDEX ELEMENT SIZE =====

/// Width of one index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexElementSize {
    SixteenBits,
    ThirtyTwoBits,
}

impl IndexElementSize {
    /// Size in bytes
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexElementSize::SixteenBits => 2,
            IndexElementSize::ThirtyTwoBits => 4,
        }
    }
}

/// Rust integer type matching an index width
pub trait IndexElement: Pod {
    const ELEMENT_SIZE: IndexElementSize;
}

impl IndexElement for u16 {
    const ELEMENT_SIZE: IndexElementSize = IndexElementSize::SixteenBits;
}

impl IndexElement for u32 {
    const ELEMENT_SIZE: IndexElementSize = IndexElementSize::ThirtyTwoBits;
}

// ===== INDEX BUFFER DESC =====

/// Descriptor for creating an IndexBuffer
#[derive(Debug, Clone, Copy)]
pub struct IndexBufferDesc {
    pub element_size: IndexElementSize,
    /// Capacity in indices
    pub index_count: u32,
    pub usage: BufferUsage,
}

// ===== INDEX BUFFER =====

/// GPU index buffer
pub struct IndexBuffer {
    base: BufferBase,
    element_size: IndexElementSize,
}

impl IndexBuffer {
    /// Create a static index buffer
    ///
    /// 32-bit indices fail with `Unsupported` on a Reach device.
    pub fn from_desc(device: &Arc<GraphicsDevice>, desc: IndexBufferDesc) -> Result<Self> {
        Self::create(device, desc, false, "galaxy3d::IndexBuffer")
    }

    pub(crate) fn create(
        device: &Arc<GraphicsDevice>,
        desc: IndexBufferDesc,
        dynamic: bool,
        source: &'static str,
    ) -> Result<Self> {
        check_element_size(device, desc.element_size, source)?;
        let base = BufferBase::new(device, BufferBaseDesc {
            kind: BufferKind::Index,
            stride: desc.element_size.size_bytes(),
            capacity: Some(desc.index_count),
            dynamic,
            usage: desc.usage,
            source,
        })?;
        Ok(Self { base, element_size: desc.element_size })
    }

    pub fn new(
        device: &Arc<GraphicsDevice>,
        element_size: IndexElementSize,
        index_count: u32,
        usage: BufferUsage,
    ) -> Result<Self> {
        Self::from_desc(device, IndexBufferDesc { element_size, index_count, usage })
    }

    /// Create a buffer of `u16` or `u32` indices
    pub fn for_type<T: IndexElement>(device: &Arc<GraphicsDevice>, index_count: u32, usage: BufferUsage) -> Result<Self> {
        Self::new(device, T::ELEMENT_SIZE, index_count, usage)
    }

    // ===== ACCESSORS =====

    pub fn element_size(&self) -> IndexElementSize { self.element_size }

    /// Number of valid indices (set by the last `set_data`)
    pub fn index_count(&self) -> u32 { self.base.count() }

    /// Capacity in indices
    pub fn capacity(&self) -> u32 { self.base.capacity().unwrap_or(0) }

    pub fn usage(&self) -> BufferUsage { self.base.usage() }

    pub fn is_dynamic(&self) -> bool { self.base.is_dynamic() }

    pub fn is_disposed(&self) -> bool { self.base.is_disposed() }

    pub fn is_realized(&self) -> bool { self.base.is_realized() }

    pub fn device(&self) -> &Arc<GraphicsDevice> { self.base.device() }

    // ===== DATA =====

    /// Upload indices
    ///
    /// `element_stride` is the caller element size in bytes (0 for
    /// `size_of::<T>()`); `count` becomes the number of indices covered.
    pub fn set_data<T: Pod>(
        &mut self,
        offset_bytes: u64,
        data: &[T],
        element_stride: u32,
        options: SetDataOptions,
    ) -> Result<()> {
        self.base.set_typed(offset_bytes, data, element_stride, options)
    }

    pub fn set_data_all<T: Pod>(&mut self, data: &[T]) -> Result<()> {
        self.set_data(0, data, 0, SetDataOptions::None)
    }

    pub fn get_data<T: Pod>(&self, offset_bytes: u64, data: &mut [T], element_stride: u32) -> Result<()> {
        self.base.get_typed(offset_bytes, data, element_stride)
    }

    pub fn get_data_all<T: Pod>(&self, data: &mut [T]) -> Result<()> {
        self.get_data(0, data, 0)
    }

    pub fn dispose(&mut self) {
        self.base.dispose();
    }
}

impl IndexSource for IndexBuffer {
    fn index_element_size(&self) -> IndexElementSize {
        self.element_size
    }

    fn bind(&self) -> Result<()> {
        self.base.bind()
    }
}

/// Reject index widths the device profile can't draw with
pub(crate) fn check_element_size(
    device: &GraphicsDevice,
    element_size: IndexElementSize,
    source: &'static str,
) -> Result<()> {
    if element_size == IndexElementSize::ThirtyTwoBits && !device.profile().supports_32bit_indices() {
        engine_bail!(source, Unsupported,
            "32-bit indices are not supported by the {:?} profile", device.profile());
    }
    Ok(())
}

#[cfg(test)]
#[path = "index_buffer_tests.rs"]
mod tests;
