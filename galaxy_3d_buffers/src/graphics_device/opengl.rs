/// OpenGL backend
///
/// Every native call goes through one context mutex. A caller on any thread
/// blocks until it owns the context, which stands in for GL's
/// one-thread-per-context rule.

use std::ptr::NonNull;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use crate::error::Result;
use crate::{engine_bail, engine_debug, engine_err, engine_error, engine_trace};
use super::backend::{BufferBackend, BufferKind, NativeBuffer, NativeBufferDesc, Transfer, WriteMode};
use super::opengl_api::{GlApi, GlBufferName, GlMapAccess, GlTarget, GlUsage};

const SOURCE: &str = "galaxy3d::gl";

/// Shared GL context
struct GlContext {
    api: Mutex<Box<dyn GlApi>>,
}

impl GlContext {
    fn lock(&self) -> Result<MutexGuard<'_, Box<dyn GlApi>>> {
        self.api
            .lock()
            .map_err(|_| engine_err!(SOURCE, BackendError, "GL context lock poisoned"))
    }

    /// Lock for release paths, which must not fail
    fn lock_recovering(&self) -> MutexGuard<'_, Box<dyn GlApi>> {
        self.api.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// Backend
// ============================================================================

/// OpenGL buffer backend
pub struct OpenGlBackend {
    context: Arc<GlContext>,
}

impl OpenGlBackend {
    pub fn new(api: impl GlApi + 'static) -> Self {
        Self {
            context: Arc::new(GlContext { api: Mutex::new(Box::new(api)) }),
        }
    }
}

fn gl_target(kind: BufferKind) -> GlTarget {
    match kind {
        BufferKind::Vertex => GlTarget::ArrayBuffer,
        BufferKind::Index => GlTarget::ElementArrayBuffer,
    }
}

impl BufferBackend for OpenGlBackend {
    fn name(&self) -> &'static str {
        "OpenGL"
    }

    fn allocate(&self, desc: &NativeBufferDesc) -> Result<Box<dyn NativeBuffer>> {
        let target = gl_target(desc.kind);
        let usage = if desc.dynamic { GlUsage::DynamicDraw } else { GlUsage::StaticDraw };

        let mut api = self.context.lock()?;
        let name = api.gen_buffer()?;
        let storage = api
            .bind_buffer(target, name)
            .and_then(|()| api.buffer_data(target, desc.size, None, usage));
        if let Err(err) = storage {
            api.delete_buffer(name);
            return Err(err);
        }
        drop(api);

        engine_trace!(SOURCE, "Allocated buffer {} ({:?}, {} bytes, {:?})", name, target, desc.size, usage);
        Ok(Box::new(GlBuffer {
            context: Arc::clone(&self.context),
            name,
            target,
            usage,
            size: desc.size,
        }))
    }

    fn device_reset(&self) {
        self.context.lock_recovering().reset_context();
        engine_debug!(SOURCE, "Context rebuilt");
    }
}

// ============================================================================
// Native buffer
// ============================================================================

/// GL buffer object
struct GlBuffer {
    context: Arc<GlContext>,
    name: GlBufferName,
    target: GlTarget,
    usage: GlUsage,
    size: u64,
}

impl NativeBuffer for GlBuffer {
    fn allocated_size(&self) -> u64 {
        self.size
    }

    fn bind(&mut self) -> Result<()> {
        self.context.lock()?.bind_buffer(self.target, self.name)
    }

    fn write(&mut self, transfer: &Transfer, data: &[u8], mode: WriteMode) -> Result<()> {
        let mut api = self.context.lock()?;
        api.bind_buffer(self.target, self.name)?;

        match mode {
            WriteMode::Discard { size } => {
                // Orphan: the driver hands back fresh storage, old contents stay with in-flight draws
                let new_size = size.max(self.size);
                api.buffer_data(self.target, new_size, None, self.usage)?;
                if new_size != self.size {
                    engine_debug!(SOURCE, "Buffer {} grown {} -> {} bytes", self.name, self.size, new_size);
                }
                self.size = new_size;
            }
            WriteMode::NoOverwrite if api.supports_buffer_mapping() => {
                let len = mapped_len(transfer)?;
                let mut range = MappedRange::map(
                    &mut **api,
                    self.target,
                    transfer.offset,
                    len,
                    GlMapAccess::WRITE | GlMapAccess::UNSYNCHRONIZED,
                )?;
                transfer.scatter(data, range.bytes_mut());
                return range.finish();
            }
            _ => {}
        }

        if transfer.is_contiguous() {
            api.buffer_sub_data(self.target, transfer.offset, data)
        } else {
            for (index, chunk) in data.chunks_exact(transfer.element_size).enumerate() {
                api.buffer_sub_data(self.target, transfer.element_offset(index), chunk)?;
            }
            Ok(())
        }
    }

    fn read(&mut self, transfer: &Transfer, data: &mut [u8]) -> Result<()> {
        let mut api = self.context.lock()?;
        if !api.supports_buffer_mapping() {
            engine_bail!(SOURCE, Unsupported, "GL context does not allow buffer mapping, cannot read buffer {}", self.name);
        }
        api.bind_buffer(self.target, self.name)?;

        let len = mapped_len(transfer)?;
        let range = MappedRange::map(
            &mut **api,
            self.target,
            transfer.offset,
            len,
            GlMapAccess::READ,
        )?;
        transfer.gather(range.bytes(), data);
        range.finish()
    }
}

/// Length of the range to map for `transfer`
fn mapped_len(transfer: &Transfer) -> Result<u64> {
    transfer.extent()
        .map(|end| end - transfer.offset)
        .ok_or_else(|| engine_err!(SOURCE, OutOfRange, "transfer at offset {} overflows the buffer address space", transfer.offset))
}

impl Drop for GlBuffer {
    fn drop(&mut self) {
        self.context.lock_recovering().delete_buffer(self.name);
        engine_trace!(SOURCE, "Deleted buffer {}", self.name);
    }
}

// ============================================================================
// Mapped range guard
// ============================================================================

/// A mapped buffer range, unmapped when dropped
///
/// `finish` unmaps and reports the unmap result; dropping without `finish`
/// (early return, panic) still unmaps and logs a failure.
struct MappedRange<'a> {
    api: &'a mut dyn GlApi,
    target: GlTarget,
    ptr: NonNull<u8>,
    len: usize,
    mapped: bool,
}

impl<'a> MappedRange<'a> {
    fn map(
        api: &'a mut dyn GlApi,
        target: GlTarget,
        offset: u64,
        length: u64,
        access: GlMapAccess,
    ) -> Result<Self> {
        let ptr = api.map_buffer_range(target, offset, length, access)?;
        Ok(Self { api, target, ptr, len: length as usize, mapped: true })
    }

    fn bytes(&self) -> &[u8] {
        // SAFETY: GlApi guarantees `len` valid bytes until unmap, and the
        // exclusive borrow of the api keeps anyone else from unmapping
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: same as `bytes`, and `&mut self` makes the view unique
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    fn finish(mut self) -> Result<()> {
        self.mapped = false;
        self.api.unmap_buffer(self.target)
    }
}

impl Drop for MappedRange<'_> {
    fn drop(&mut self) {
        if self.mapped {
            if let Err(err) = self.api.unmap_buffer(self.target) {
                engine_error!(SOURCE, "Unmap failed while unwinding: {}", err);
            }
        }
    }
}

#[cfg(test)]
#[path = "opengl_tests.rs"]
mod tests;
