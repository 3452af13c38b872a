/// Shared state and protocol of every vertex and index buffer.
///
/// BufferBase owns the capacity/count bookkeeping, the discard check, the
/// transfer validation and the lazily realized native handle. The handle
/// lives in a NativeSlot registered with the device, so a device reset can
/// release it without reaching into the buffer itself.

use std::sync::{Arc, Mutex, PoisonError, Weak};
use bytemuck::Pod;
use crate::error::Result;
use crate::graphics_device::{
    BufferKind, BufferUsage, GraphicsDevice, NativeBuffer, NativeBufferDesc, ResettableResource,
    ResourceKey, SetDataOptions, Transfer, WriteMode,
};
use crate::{engine_bail, engine_bail_warn, engine_debug, engine_err, engine_trace};

// ===== NATIVE SLOT =====

/// Holder of a buffer's native handle, shared with the device registry
#[derive(Default)]
pub(crate) struct NativeSlot {
    native: Mutex<Option<Box<dyn NativeBuffer>>>,
}

impl NativeSlot {
    fn is_realized(&self) -> bool {
        self.native.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    fn release(&self) -> bool {
        let released = self.native.lock().unwrap_or_else(PoisonError::into_inner).take();
        // Dropped outside the slot lock; the native drop takes the backend lock
        released.is_some()
    }
}

impl ResettableResource for NativeSlot {
    fn graphics_device_resetting(&self) {
        self.release();
    }
}

// ===== BUFFER BASE DESC =====

pub(crate) struct BufferBaseDesc {
    pub kind: BufferKind,
    /// Buffer element size: vertex stride or index size
    pub stride: u32,
    /// Element capacity, `None` for growable buffers
    pub capacity: Option<u32>,
    pub dynamic: bool,
    pub usage: BufferUsage,
    /// Log source of the owning buffer type
    pub source: &'static str,
}

// ===== BUFFER BASE =====

pub(crate) struct BufferBase {
    device: Arc<GraphicsDevice>,
    kind: BufferKind,
    stride: u32,
    capacity: Option<u32>,
    count: u32,
    dynamic: bool,
    usage: BufferUsage,
    slot: Arc<NativeSlot>,
    /// `None` once disposed
    registration: Option<ResourceKey>,
    /// Native storage high-water mark in bytes
    last_allocated_size: u64,
    source: &'static str,
}

impl BufferBase {
    pub(crate) fn new(device: &Arc<GraphicsDevice>, desc: BufferBaseDesc) -> Result<Self> {
        if desc.stride == 0 {
            engine_bail!(desc.source, InvalidLayout, "Buffer element size must be greater than zero");
        }
        if desc.capacity == Some(0) {
            engine_bail!(desc.source, EmptyInput, "Buffer capacity must be at least one element");
        }

        let slot = Arc::new(NativeSlot::default());
        let weak: Weak<dyn ResettableResource> = Arc::downgrade(&slot) as Weak<dyn ResettableResource>;
        let registration = device.register_resource(weak);

        engine_trace!(desc.source, "Created ({:?}, stride {}, capacity {:?}, dynamic {})",
            desc.kind, desc.stride, desc.capacity, desc.dynamic);

        Ok(Self {
            device: Arc::clone(device),
            kind: desc.kind,
            stride: desc.stride,
            capacity: desc.capacity,
            count: 0,
            dynamic: desc.dynamic,
            usage: desc.usage,
            slot,
            registration: Some(registration),
            last_allocated_size: 0,
            source: desc.source,
        })
    }

    // ===== ACCESSORS =====

    pub(crate) fn device(&self) -> &Arc<GraphicsDevice> { &self.device }

    pub(crate) fn stride(&self) -> u32 { self.stride }

    pub(crate) fn capacity(&self) -> Option<u32> { self.capacity }

    pub(crate) fn count(&self) -> u32 { self.count }

    pub(crate) fn is_dynamic(&self) -> bool { self.dynamic }

    pub(crate) fn usage(&self) -> BufferUsage { self.usage }

    pub(crate) fn last_allocated_size(&self) -> u64 { self.last_allocated_size }

    pub(crate) fn is_disposed(&self) -> bool { self.registration.is_none() }

    /// Whether a native handle currently exists
    pub(crate) fn is_realized(&self) -> bool { self.slot.is_realized() }

    /// Capacity in bytes, `None` for growable buffers
    fn capacity_bytes(&self) -> Option<u64> {
        self.capacity.map(|capacity| capacity as u64 * self.stride as u64)
    }

    // ===== DISCARD CHECK =====

    /// Decide how the backend must treat prior contents for a write ending at `requested_bytes`
    pub(crate) fn discard_check(&self, options: SetDataOptions, requested_bytes: u64) -> WriteMode {
        let current = self.capacity_bytes().unwrap_or(self.last_allocated_size);
        if self.capacity.is_none() && requested_bytes > self.last_allocated_size {
            return WriteMode::Discard { size: requested_bytes };
        }
        match options {
            SetDataOptions::Discard => WriteMode::Discard { size: current },
            SetDataOptions::NoOverwrite => WriteMode::NoOverwrite,
            SetDataOptions::None => WriteMode::Blocking,
        }
    }

    // ===== TRANSFER PLANNING =====

    /// Validate one transfer of `byte_len` client bytes at `offset_bytes`
    ///
    /// `element_size` is the caller's element size in bytes. Nothing is
    /// issued to the backend when this fails.
    pub(crate) fn plan_transfer(&self, offset_bytes: u64, byte_len: usize, element_size: usize) -> Result<Transfer> {
        if element_size == 0 || byte_len % element_size != 0 {
            engine_bail!(self.source, OutOfRange,
                "{} bytes are not a whole number of {}-byte elements", byte_len, element_size);
        }

        let transfer = Transfer {
            offset: offset_bytes,
            element_size,
            buffer_stride: self.stride as usize,
            element_count: byte_len / element_size,
        };

        let extent = self.extent_of(&transfer)?;

        if !transfer.is_contiguous() && element_size > transfer.buffer_stride {
            engine_bail!(self.source, OutOfRange,
                "element size {} exceeds buffer stride {} and is not a multiple of it",
                element_size, transfer.buffer_stride);
        }

        if let Some(limit) = self.capacity_bytes() {
            if extent > limit {
                engine_bail!(self.source, OutOfRange,
                    "transfer ends at byte {}, capacity is {} bytes", extent, limit);
            }
        }

        Ok(transfer)
    }

    /// End of `transfer` in buffer bytes, `OutOfRange` when it overflows
    fn extent_of(&self, transfer: &Transfer) -> Result<u64> {
        transfer.extent().ok_or_else(|| engine_err!(self.source, OutOfRange,
            "transfer of {} elements at offset {} overflows the buffer address space",
            transfer.element_count, transfer.offset))
    }

    // ===== NATIVE ACCESS =====

    /// Run `f` on the native handle, realizing it first if needed
    ///
    /// Growable buffers are realized at `max(last_allocated_size, min_size)`.
    fn with_native<R>(&self, min_size: u64, f: impl FnOnce(&mut dyn NativeBuffer) -> Result<R>) -> Result<R> {
        if self.is_disposed() {
            engine_bail!(self.source, InvalidResource, "buffer used after dispose");
        }

        let mut native = self.slot.native.lock()
            .map_err(|_| engine_err!(self.source, BackendError, "native handle lock poisoned"))?;

        let buffer = match native.take() {
            Some(buffer) => buffer,
            None => self.allocate(min_size)?,
        };
        let buffer = native.insert(buffer);
        f(buffer.as_mut())
    }

    fn allocate(&self, min_size: u64) -> Result<Box<dyn NativeBuffer>> {
        let size = match self.capacity_bytes() {
            Some(size) => size,
            None => self.last_allocated_size.max(min_size),
        };
        if size == 0 {
            engine_bail!(self.source, InvalidResource, "growable buffer has no storage yet, write data first");
        }

        let buffer = self.device.backend().allocate(&NativeBufferDesc {
            kind: self.kind,
            size,
            dynamic: self.dynamic,
            usage: self.usage,
        })?;
        engine_debug!(self.source, "Realized {} bytes on {}", size, self.device.backend().name());
        Ok(buffer)
    }

    /// Apply a validated transfer
    pub(crate) fn write(&mut self, transfer: &Transfer, data: &[u8], options: SetDataOptions) -> Result<()> {
        let mode = self.discard_check(options, self.extent_of(transfer)?);
        let min_size = match mode {
            WriteMode::Discard { size } => size,
            _ => 0,
        };
        let allocated = self.with_native(min_size, |native| {
            native.write(transfer, data, mode)?;
            Ok(native.allocated_size())
        })?;
        self.last_allocated_size = self.last_allocated_size.max(allocated);
        Ok(())
    }

    /// Read back a validated transfer
    pub(crate) fn read(&self, transfer: &Transfer, data: &mut [u8]) -> Result<()> {
        if self.usage.contains(BufferUsage::WRITE_ONLY) {
            engine_bail_warn!(self.source, Unsupported, "buffer was created write-only, get_data is not allowed");
        }
        let extent = self.extent_of(transfer)?;
        if self.capacity.is_none() && extent > self.last_allocated_size {
            engine_bail!(self.source, OutOfRange,
                "read ends at byte {}, only {} bytes allocated", extent, self.last_allocated_size);
        }
        self.with_native(0, |native| native.read(transfer, data))
    }

    /// Bind for drawing, realizing the handle if needed
    pub(crate) fn bind(&self) -> Result<()> {
        self.with_native(0, |native| native.bind())
    }

    // ===== TYPED ACCESS =====

    /// Typed upload used by the safe buffers
    ///
    /// `element_stride` is the caller's element size in bytes, 0 meaning
    /// `size_of::<T>()`. An empty slice is a no-op.
    pub(crate) fn set_typed<T: Pod>(
        &mut self,
        offset_bytes: u64,
        data: &[T],
        element_stride: u32,
        options: SetDataOptions,
    ) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let element_size = self.resolve_element_stride::<T>(element_stride)?;
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let transfer = self.plan_transfer(offset_bytes, bytes.len(), element_size)?;
        self.write(&transfer, bytes, options)?;
        self.count = transfer.buffer_elements() as u32;
        Ok(())
    }

    /// Typed readback used by the safe buffers. An empty slice is a no-op.
    pub(crate) fn get_typed<T: Pod>(&self, offset_bytes: u64, data: &mut [T], element_stride: u32) -> Result<()> {
        if self.usage.contains(BufferUsage::WRITE_ONLY) {
            engine_bail_warn!(self.source, Unsupported, "buffer was created write-only, get_data is not allowed");
        }
        if data.is_empty() {
            return Ok(());
        }
        let element_size = self.resolve_element_stride::<T>(element_stride)?;
        let bytes: &mut [u8] = bytemuck::cast_slice_mut(data);
        let transfer = self.plan_transfer(offset_bytes, bytes.len(), element_size)?;
        self.read(&transfer, bytes)
    }

    fn resolve_element_stride<T>(&self, element_stride: u32) -> Result<usize> {
        let type_size = std::mem::size_of::<T>();
        if element_stride == 0 {
            return Ok(type_size);
        }
        if (element_stride as usize) < type_size {
            engine_bail!(self.source, OutOfRange,
                "element stride {} is smaller than the element type ({} bytes)", element_stride, type_size);
        }
        Ok(element_stride as usize)
    }

    // ===== RAW ACCESS =====

    /// Upload `element_count` buffer elements from `region` (growable buffers)
    pub(crate) fn set_region(
        &mut self,
        offset_bytes: u64,
        region: &[u8],
        element_count: u32,
        options: SetDataOptions,
    ) -> Result<()> {
        if element_count == 0 {
            engine_bail_warn!(self.source, OutOfRange, "element count must be greater than zero");
        }
        let byte_len = self.region_len(element_count)?;
        if region.len() < byte_len {
            engine_bail!(self.source, OutOfRange,
                "region holds {} bytes, {} elements need {}", region.len(), element_count, byte_len);
        }
        let transfer = self.plan_transfer(offset_bytes, byte_len, self.stride as usize)?;
        self.write(&transfer, &region[..byte_len], options)?;
        self.count = element_count;
        Ok(())
    }

    /// Read `element_count` buffer elements into `region` (growable buffers)
    pub(crate) fn get_region(&self, offset_bytes: u64, region: &mut [u8], element_count: u32) -> Result<()> {
        if element_count == 0 {
            engine_bail_warn!(self.source, OutOfRange, "element count must be greater than zero");
        }
        let byte_len = self.region_len(element_count)?;
        if region.len() < byte_len {
            engine_bail!(self.source, OutOfRange,
                "region holds {} bytes, {} elements need {}", region.len(), element_count, byte_len);
        }
        let transfer = self.plan_transfer(offset_bytes, byte_len, self.stride as usize)?;
        self.read(&transfer, &mut region[..byte_len])
    }

    fn region_len(&self, element_count: u32) -> Result<usize> {
        (element_count as usize).checked_mul(self.stride as usize).ok_or_else(|| engine_err!(self.source, OutOfRange,
            "{} elements of {} bytes overflow the address space", element_count, self.stride))
    }

    // ===== DISPOSAL =====

    /// Destroy the native handle and leave the device registry. Idempotent.
    pub(crate) fn dispose(&mut self) {
        if let Some(key) = self.registration.take() {
            self.device.unregister_resource(key);
            if self.slot.release() {
                engine_debug!(self.source, "Disposed, native handle released");
            }
        }
    }
}

impl Drop for BufferBase {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
#[path = "buffer_base_tests.rs"]
mod tests;
