/// Direct3D backend
///
/// Static buffers live in Default usage and are written with
/// update_subresource; dynamic buffers live in Dynamic usage and are written
/// through map. Reads and per-element writes go through a staging copy,
/// created on first need and kept until the buffer is released.

use std::ptr::NonNull;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use crate::error::Result;
use crate::{engine_bail, engine_debug, engine_err, engine_error, engine_trace, engine_warn};
use super::backend::{BufferBackend, BufferKind, NativeBuffer, NativeBufferDesc, Transfer, WriteMode};
use super::direct3d_api::{
    D3dBindFlags, D3dBufferDesc, D3dCpuAccess, D3dDeviceContext, D3dMapMode, D3dResourceId, D3dUsage,
};

const SOURCE: &str = "galaxy3d::d3d";

/// Immediate context shared by every buffer of a device
struct D3dContext {
    context: Mutex<Box<dyn D3dDeviceContext>>,
}

impl D3dContext {
    fn lock(&self) -> Result<MutexGuard<'_, Box<dyn D3dDeviceContext>>> {
        self.context
            .lock()
            .map_err(|_| engine_err!(SOURCE, BackendError, "D3D context lock poisoned"))
    }

    fn lock_recovering(&self) -> MutexGuard<'_, Box<dyn D3dDeviceContext>> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// Backend
// ============================================================================

/// Direct3D buffer backend
pub struct Direct3dBackend {
    context: Arc<D3dContext>,
}

impl Direct3dBackend {
    pub fn new(context: impl D3dDeviceContext + 'static) -> Self {
        Self {
            context: Arc::new(D3dContext { context: Mutex::new(Box::new(context)) }),
        }
    }
}

fn buffer_desc(kind: BufferKind, size: u64, dynamic: bool) -> D3dBufferDesc {
    let bind_flags = match kind {
        BufferKind::Vertex => D3dBindFlags::VERTEX_BUFFER,
        BufferKind::Index => D3dBindFlags::INDEX_BUFFER,
    };
    if dynamic {
        D3dBufferDesc { byte_width: size, usage: D3dUsage::Dynamic, bind_flags, cpu_access: D3dCpuAccess::WRITE }
    } else {
        D3dBufferDesc { byte_width: size, usage: D3dUsage::Default, bind_flags, cpu_access: D3dCpuAccess::empty() }
    }
}

impl BufferBackend for Direct3dBackend {
    fn name(&self) -> &'static str {
        "Direct3D"
    }

    fn allocate(&self, desc: &NativeBufferDesc) -> Result<Box<dyn NativeBuffer>> {
        let native_desc = buffer_desc(desc.kind, desc.size, desc.dynamic);
        let id = self.context.lock()?.create_buffer(&native_desc, None)?;
        engine_trace!(SOURCE, "Created buffer {} ({:?}, {} bytes)", id, native_desc.usage, desc.size);
        Ok(Box::new(D3dBuffer {
            context: Arc::clone(&self.context),
            kind: desc.kind,
            id,
            desc: native_desc,
            staging: None,
        }))
    }

    fn device_reset(&self) {
        self.context.lock_recovering().reset_device();
        engine_debug!(SOURCE, "Device recreated");
    }
}

// ============================================================================
// Native buffer
// ============================================================================

struct D3dBuffer {
    context: Arc<D3dContext>,
    kind: BufferKind,
    id: D3dResourceId,
    desc: D3dBufferDesc,
    /// CPU-readable copy target, created on first read or per-element write
    staging: Option<D3dResourceId>,
}

impl D3dBuffer {
    fn is_dynamic(&self) -> bool {
        self.desc.usage == D3dUsage::Dynamic
    }

    fn staging(&mut self, ctx: &mut dyn D3dDeviceContext) -> Result<D3dResourceId> {
        if let Some(id) = self.staging {
            return Ok(id);
        }
        let desc = D3dBufferDesc {
            byte_width: self.desc.byte_width,
            usage: D3dUsage::Staging,
            bind_flags: D3dBindFlags::empty(),
            cpu_access: D3dCpuAccess::READ | D3dCpuAccess::WRITE,
        };
        let id = ctx.create_buffer(&desc, None)?;
        engine_trace!(SOURCE, "Created staging buffer {} for buffer {}", id, self.id);
        self.staging = Some(id);
        Ok(id)
    }

    /// Replace the resource with a larger one. Contents are not preserved.
    fn grow(&mut self, ctx: &mut dyn D3dDeviceContext, size: u64) -> Result<()> {
        let desc = D3dBufferDesc { byte_width: size, ..self.desc };
        let id = ctx.create_buffer(&desc, None)?;
        if let Some(staging) = self.staging.take() {
            ctx.release(staging);
        }
        ctx.release(self.id);
        engine_debug!(SOURCE, "Buffer {} recreated as {} ({} -> {} bytes)", self.id, id, self.desc.byte_width, size);
        self.id = id;
        self.desc = desc;
        Ok(())
    }
}

impl NativeBuffer for D3dBuffer {
    fn allocated_size(&self) -> u64 {
        self.desc.byte_width
    }

    fn bind(&mut self) -> Result<()> {
        let mut ctx = self.context.lock()?;
        match self.kind {
            BufferKind::Vertex => ctx.ia_set_vertex_buffer(self.id),
            BufferKind::Index => ctx.ia_set_index_buffer(self.id),
        }
    }

    fn write(&mut self, transfer: &Transfer, data: &[u8], mode: WriteMode) -> Result<()> {
        let context = Arc::clone(&self.context);
        let mut ctx = context.lock()?;

        if let WriteMode::Discard { size } = mode {
            if size > self.desc.byte_width {
                self.grow(&mut **ctx, size)?;
            }
        }

        let (start, end) = view_bounds(transfer)?;

        if !transfer.is_contiguous() {
            engine_warn!(SOURCE, "Per-element write of {} elements into buffer {} goes through a staging round trip",
                transfer.element_count, self.id);
            let staging = self.staging(&mut **ctx)?;
            ctx.copy_resource(staging, self.id)?;
            let mut mapped = MappedResource::map(&mut **ctx, staging, D3dMapMode::ReadWrite)?;
            transfer.scatter(data, &mut mapped.bytes_mut()[start..end]);
            mapped.finish()?;
            return ctx.copy_resource(self.id, staging);
        }

        if !self.is_dynamic() {
            return ctx.update_subresource(self.id, transfer.offset, data);
        }

        let map_mode = match mode {
            WriteMode::Discard { .. } => D3dMapMode::WriteDiscard,
            _ => D3dMapMode::WriteNoOverwrite,
        };
        let mut mapped = MappedResource::map(&mut **ctx, self.id, map_mode)?;
        transfer.scatter(data, &mut mapped.bytes_mut()[start..end]);
        mapped.finish()
    }

    fn read(&mut self, transfer: &Transfer, data: &mut [u8]) -> Result<()> {
        if self.is_dynamic() {
            engine_bail!(SOURCE, NotImplemented, "reading back dynamic buffer {} is not implemented on Direct3D", self.id);
        }

        let context = Arc::clone(&self.context);
        let mut ctx = context.lock()?;
        let staging = self.staging(&mut **ctx)?;
        ctx.copy_resource(staging, self.id)?;

        let (start, end) = view_bounds(transfer)?;
        let mapped = MappedResource::map(&mut **ctx, staging, D3dMapMode::Read)?;
        transfer.gather(&mapped.bytes()[start..end], data);
        mapped.finish()
    }
}

/// Byte bounds of `transfer` inside a mapped view of the whole buffer
fn view_bounds(transfer: &Transfer) -> Result<(usize, usize)> {
    let bounds = transfer.extent().and_then(|end| {
        Some((usize::try_from(transfer.offset).ok()?, usize::try_from(end).ok()?))
    });
    bounds.ok_or_else(|| engine_err!(SOURCE, OutOfRange,
        "transfer at offset {} overflows the buffer address space", transfer.offset))
}

impl Drop for D3dBuffer {
    fn drop(&mut self) {
        let mut ctx = self.context.lock_recovering();
        if let Some(staging) = self.staging.take() {
            ctx.release(staging);
        }
        ctx.release(self.id);
        engine_trace!(SOURCE, "Released buffer {}", self.id);
    }
}

// ============================================================================
// Mapped resource guard
// ============================================================================

/// A mapped resource, unmapped when dropped
struct MappedResource<'a> {
    ctx: &'a mut dyn D3dDeviceContext,
    id: D3dResourceId,
    ptr: NonNull<u8>,
    len: usize,
    mapped: bool,
}

impl<'a> MappedResource<'a> {
    fn map(ctx: &'a mut dyn D3dDeviceContext, id: D3dResourceId, mode: D3dMapMode) -> Result<Self> {
        let subresource = ctx.map(id, mode)?;
        Ok(Self {
            ctx,
            id,
            ptr: subresource.data,
            len: subresource.size as usize,
            mapped: true,
        })
    }

    fn bytes(&self) -> &[u8] {
        // SAFETY: D3dDeviceContext guarantees `len` valid bytes until unmap;
        // the exclusive borrow of the context prevents any other call
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        // SAFETY: as in `bytes`
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    fn finish(mut self) -> Result<()> {
        self.mapped = false;
        self.ctx.unmap(self.id)
    }
}

impl Drop for MappedResource<'_> {
    fn drop(&mut self) {
        if self.mapped {
            if let Err(err) = self.ctx.unmap(self.id) {
                engine_error!(SOURCE, "Unmap of resource {} failed while unwinding: {}", self.id, err);
            }
        }
    }
}

#[cfg(test)]
#[path = "direct3d_tests.rs"]
mod tests;
