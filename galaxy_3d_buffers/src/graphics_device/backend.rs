/// Backend strategy traits and the transfer description shared by all backends.
///
/// A backend is chosen once when the GraphicsDevice is created and is
/// injected into every buffer through the device. It exposes the capability
/// set {allocate, bind, read, write, release}: `allocate` lives on
/// BufferBackend, the rest on the NativeBuffer it returns (release is Drop).

use bitflags::bitflags;
use crate::error::Result;

/// Which binding point a buffer targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Vertex buffer
    Vertex,
    /// Index buffer
    Index,
}

bitflags! {
    /// Buffer usage hint
    ///
    /// `BufferUsage::empty()` allows CPU readback through `get_data`;
    /// `WRITE_ONLY` forbids it regardless of backend capability.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const WRITE_ONLY = 1 << 0;
    }
}

impl BufferUsage {
    /// No usage restriction
    pub const NONE: BufferUsage = BufferUsage::empty();
}

/// Caller-facing write policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetDataOptions {
    /// The write may block until the GPU is done with the buffer
    #[default]
    None,
    /// Prior contents may be dropped; the driver may hand back fresh storage
    Discard,
    /// The caller guarantees the GPU is not reading the written region
    NoOverwrite,
}

/// Outcome of the discard check, handed to the backend with each write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Plain sub-range write, may stall on in-flight GPU use
    Blocking,
    /// Non-blocking write into a region the GPU is not reading
    NoOverwrite,
    /// Orphan (and grow to at least `size` bytes) before writing
    Discard { size: u64 },
}

/// What a backend needs to allocate a native buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeBufferDesc {
    pub kind: BufferKind,
    /// Size in bytes
    pub size: u64,
    /// Streaming allocation instead of static
    pub dynamic: bool,
    pub usage: BufferUsage,
}

/// Placement of one `get_data`/`set_data` call
///
/// Client memory holds `element_count` elements of `element_size` bytes,
/// packed. In the buffer, element `i` starts at `offset + i * buffer_stride`
/// unless the transfer is contiguous, in which case the client bytes map
/// 1:1 onto `offset..offset + byte_len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    /// Byte offset in the buffer
    pub offset: u64,
    /// Caller element size in bytes
    pub element_size: usize,
    /// Buffer element size (vertex stride or index size)
    pub buffer_stride: usize,
    pub element_count: usize,
}

impl Transfer {
    /// Client bytes map 1:1 onto the buffer
    ///
    /// True when the caller's element is exactly one or several buffer elements.
    pub fn is_contiguous(&self) -> bool {
        self.element_size % self.buffer_stride == 0
    }

    /// Size of the client memory region
    pub fn byte_len(&self) -> usize {
        self.element_size * self.element_count
    }

    /// Buffer bytes touched, from `offset` to the end of the last element
    ///
    /// `None` when the size does not fit in a `u64`.
    pub fn span(&self) -> Option<u64> {
        if self.element_count == 0 {
            return Some(0);
        }
        if self.is_contiguous() {
            u64::try_from(self.byte_len()).ok()
        } else {
            let last = u64::try_from(self.element_count - 1).ok()?
                .checked_mul(self.buffer_stride as u64)?;
            last.checked_add(self.element_size as u64)
        }
    }

    /// First buffer byte past the transfer, `None` on overflow
    pub fn extent(&self) -> Option<u64> {
        self.offset.checked_add(self.span()?)
    }

    /// Number of buffer elements (vertices, indices) the transfer covers
    pub fn buffer_elements(&self) -> usize {
        if self.is_contiguous() {
            self.byte_len() / self.buffer_stride
        } else {
            self.element_count
        }
    }

    /// Buffer byte offset of element `index` (per-element placement)
    pub fn element_offset(&self, index: usize) -> u64 {
        self.offset + (index * self.buffer_stride) as u64
    }

    /// Copy client bytes into a view of the buffer starting at `self.offset`
    pub fn scatter(&self, client: &[u8], view: &mut [u8]) {
        if self.is_contiguous() {
            let len = self.byte_len();
            view[..len].copy_from_slice(&client[..len]);
            return;
        }
        for (index, chunk) in client.chunks_exact(self.element_size).take(self.element_count).enumerate() {
            let start = index * self.buffer_stride;
            view[start..start + self.element_size].copy_from_slice(chunk);
        }
    }

    /// Copy from a view of the buffer starting at `self.offset` into client memory
    pub fn gather(&self, view: &[u8], client: &mut [u8]) {
        if self.is_contiguous() {
            let len = self.byte_len();
            client[..len].copy_from_slice(&view[..len]);
            return;
        }
        for (index, chunk) in client.chunks_exact_mut(self.element_size).take(self.element_count).enumerate() {
            let start = index * self.buffer_stride;
            chunk.copy_from_slice(&view[start..start + self.element_size]);
        }
    }
}

/// Backend strategy (OpenGL-style, Direct3D-style, ...)
pub trait BufferBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Allocate a native buffer
    ///
    /// The returned object is owned exclusively by one buffer; the backend
    /// keeps no reference to it.
    fn allocate(&self, desc: &NativeBufferDesc) -> Result<Box<dyn NativeBuffer>>;

    /// Rebuild the native context after every live buffer released its handle
    fn device_reset(&self) {}
}

/// One realized native buffer. Dropping it releases the native resources.
pub trait NativeBuffer: Send {
    /// Current native storage size in bytes
    fn allocated_size(&self) -> u64;

    /// Bind for drawing
    fn bind(&mut self) -> Result<()>;

    /// Upload `data` (already validated against the transfer)
    fn write(&mut self, transfer: &Transfer, data: &[u8], mode: WriteMode) -> Result<()>;

    /// Read back into `data` (already validated against the transfer)
    fn read(&mut self, transfer: &Transfer, data: &mut [u8]) -> Result<()>;
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
