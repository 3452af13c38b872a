/// OpenGL buffer API surface used by the OpenGL backend
///
/// Mirrors the subset of GL entry points the buffer layer needs. Calls act on
/// the buffer currently bound to `target`, as in GL.

use std::ptr::NonNull;
use bitflags::bitflags;
use crate::error::Result;

/// GL buffer object name
pub type GlBufferName = u32;

/// GL buffer binding target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlTarget {
    /// GL_ARRAY_BUFFER
    ArrayBuffer,
    /// GL_ELEMENT_ARRAY_BUFFER
    ElementArrayBuffer,
}

/// GL buffer usage hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlUsage {
    StaticDraw,
    DynamicDraw,
    StreamDraw,
}

bitflags! {
    /// glMapBufferRange access bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GlMapAccess: u32 {
        const READ = 0x0001;
        const WRITE = 0x0002;
        const INVALIDATE_RANGE = 0x0004;
        const INVALIDATE_BUFFER = 0x0008;
        const UNSYNCHRONIZED = 0x0020;
    }
}

/// OpenGL buffer entry points
///
/// # Safety
///
/// `map_buffer_range` must return a pointer valid for reads and writes of
/// `length` bytes until `unmap_buffer` is called for the same target or
/// the implementation is dropped. Implementations must refuse any call that
/// would reallocate a mapped buffer's storage.
pub unsafe trait GlApi: Send {
    /// glGenBuffers (one name)
    fn gen_buffer(&mut self) -> Result<GlBufferName>;

    /// glDeleteBuffers (one name). Unknown names are ignored.
    fn delete_buffer(&mut self, name: GlBufferName);

    /// glBindBuffer
    fn bind_buffer(&mut self, target: GlTarget, name: GlBufferName) -> Result<()>;

    /// glBufferData. `None` allocates (or orphans) without uploading.
    fn buffer_data(&mut self, target: GlTarget, size: u64, data: Option<&[u8]>, usage: GlUsage) -> Result<()>;

    /// glBufferSubData
    fn buffer_sub_data(&mut self, target: GlTarget, offset: u64, data: &[u8]) -> Result<()>;

    /// Whether the context allows mapping buffers into client memory
    fn supports_buffer_mapping(&self) -> bool;

    /// glMapBufferRange
    fn map_buffer_range(
        &mut self,
        target: GlTarget,
        offset: u64,
        length: u64,
        access: GlMapAccess,
    ) -> Result<NonNull<u8>>;

    /// glUnmapBuffer
    fn unmap_buffer(&mut self, target: GlTarget) -> Result<()>;

    /// Rebuild the context after a device reset
    fn reset_context(&mut self) {}
}
