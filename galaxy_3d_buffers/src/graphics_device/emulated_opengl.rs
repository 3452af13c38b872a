/// Software OpenGL buffer API
///
/// Keeps buffer storage in client memory and enforces the GL rules the
/// backend depends on: calls act on the bound buffer, a mapped buffer can't
/// be respecified or sub-written, ranges must lie inside the storage. Every
/// call is recorded in a CallLog.

use std::ptr::NonNull;
use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::engine_bail;
use super::call_log::CallLog;
use super::emulated_memory::{zeroed_storage, DEFAULT_MAX_BUFFER_SIZE};
use super::opengl_api::{GlApi, GlBufferName, GlMapAccess, GlTarget, GlUsage};

const SOURCE: &str = "galaxy3d::EmulatedGl";

/// One recorded GL call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlCall {
    GenBuffer(GlBufferName),
    DeleteBuffer(GlBufferName),
    BindBuffer(GlTarget, GlBufferName),
    BufferData { target: GlTarget, size: u64, with_data: bool, usage: GlUsage },
    BufferSubData { target: GlTarget, offset: u64, len: usize },
    MapBufferRange { target: GlTarget, offset: u64, length: u64, access: GlMapAccess },
    UnmapBuffer(GlTarget),
    ResetContext,
}

/// Emulated context capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmulatedGlConfig {
    /// glMapBufferRange available (false models GL ES 2 style contexts)
    pub buffer_mapping: bool,
    /// Largest buffer_data size accepted, larger requests fail with `OutOfMemory`
    pub max_buffer_size: u64,
}

impl Default for EmulatedGlConfig {
    fn default() -> Self {
        Self { buffer_mapping: true, max_buffer_size: DEFAULT_MAX_BUFFER_SIZE }
    }
}

#[derive(Default)]
struct GlStore {
    data: Vec<u8>,
    mapped: Option<GlMapAccess>,
}

/// Software GL context
pub struct EmulatedGl {
    config: EmulatedGlConfig,
    next_name: GlBufferName,
    buffers: FxHashMap<GlBufferName, GlStore>,
    bindings: FxHashMap<GlTarget, GlBufferName>,
    calls: CallLog<GlCall>,
}

impl EmulatedGl {
    pub fn new(config: EmulatedGlConfig) -> Self {
        Self {
            config,
            next_name: 1,
            buffers: FxHashMap::default(),
            bindings: FxHashMap::default(),
            calls: CallLog::new(),
        }
    }

    /// Handle on the call record, shared with this context
    pub fn call_log(&self) -> CallLog<GlCall> {
        self.calls.clone()
    }

    fn bound(&mut self, target: GlTarget) -> Result<&mut GlStore> {
        let Some(name) = self.bindings.get(&target).copied() else {
            engine_bail!(SOURCE, BackendError, "no buffer bound to {:?}", target);
        };
        match self.buffers.get_mut(&name) {
            Some(store) => Ok(store),
            None => engine_bail!(SOURCE, BackendError, "buffer {} bound to {:?} no longer exists", name, target),
        }
    }

    fn check_range(store: &GlStore, offset: u64, length: u64) -> Result<()> {
        let size = store.data.len() as u64;
        if offset.checked_add(length).map_or(true, |end| end > size) {
            engine_bail!(SOURCE, BackendError, "range {}+{} outside storage of {} bytes", offset, length, size);
        }
        Ok(())
    }
}

impl Default for EmulatedGl {
    fn default() -> Self {
        Self::new(EmulatedGlConfig::default())
    }
}

// SAFETY: mapped pointers point into a buffer's Vec, whose heap storage is
// only replaced by buffer_data and freed by delete_buffer/reset_context;
// buffer_data refuses mapped buffers and the other two drop the mapping
// together with the storage.
unsafe impl GlApi for EmulatedGl {
    fn gen_buffer(&mut self) -> Result<GlBufferName> {
        let name = self.next_name;
        self.next_name += 1;
        self.buffers.insert(name, GlStore::default());
        self.calls.push(GlCall::GenBuffer(name));
        Ok(name)
    }

    fn delete_buffer(&mut self, name: GlBufferName) {
        self.calls.push(GlCall::DeleteBuffer(name));
        if self.buffers.remove(&name).is_some() {
            self.bindings.retain(|_, bound| *bound != name);
        }
    }

    fn bind_buffer(&mut self, target: GlTarget, name: GlBufferName) -> Result<()> {
        self.calls.push(GlCall::BindBuffer(target, name));
        if !self.buffers.contains_key(&name) {
            engine_bail!(SOURCE, BackendError, "bind of unknown buffer {}", name);
        }
        self.bindings.insert(target, name);
        Ok(())
    }

    fn buffer_data(&mut self, target: GlTarget, size: u64, data: Option<&[u8]>, usage: GlUsage) -> Result<()> {
        self.calls.push(GlCall::BufferData { target, size, with_data: data.is_some(), usage });
        let limit = self.config.max_buffer_size;
        let store = self.bound(target)?;
        if store.mapped.is_some() {
            engine_bail!(SOURCE, BackendError, "buffer_data on a mapped buffer");
        }
        let mut storage = zeroed_storage(SOURCE, size, limit)?;
        if let Some(data) = data {
            if data.len() as u64 != size {
                engine_bail!(SOURCE, BackendError, "buffer_data with {} bytes for size {}", data.len(), size);
            }
            storage.copy_from_slice(data);
        }
        store.data = storage;
        Ok(())
    }

    fn buffer_sub_data(&mut self, target: GlTarget, offset: u64, data: &[u8]) -> Result<()> {
        self.calls.push(GlCall::BufferSubData { target, offset, len: data.len() });
        let store = self.bound(target)?;
        if store.mapped.is_some() {
            engine_bail!(SOURCE, BackendError, "buffer_sub_data on a mapped buffer");
        }
        Self::check_range(store, offset, data.len() as u64)?;
        let start = offset as usize;
        store.data[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn supports_buffer_mapping(&self) -> bool {
        self.config.buffer_mapping
    }

    fn map_buffer_range(
        &mut self,
        target: GlTarget,
        offset: u64,
        length: u64,
        access: GlMapAccess,
    ) -> Result<NonNull<u8>> {
        self.calls.push(GlCall::MapBufferRange { target, offset, length, access });
        if !self.config.buffer_mapping {
            engine_bail!(SOURCE, BackendError, "buffer mapping not available in this context");
        }
        if !access.intersects(GlMapAccess::READ | GlMapAccess::WRITE) {
            engine_bail!(SOURCE, BackendError, "map access {:?} has neither READ nor WRITE", access);
        }
        let store = self.bound(target)?;
        if store.mapped.is_some() {
            engine_bail!(SOURCE, BackendError, "buffer already mapped");
        }
        Self::check_range(store, offset, length)?;
        store.mapped = Some(access);
        Ok(NonNull::from(&mut store.data[offset as usize..]).cast::<u8>())
    }

    fn unmap_buffer(&mut self, target: GlTarget) -> Result<()> {
        self.calls.push(GlCall::UnmapBuffer(target));
        let store = self.bound(target)?;
        if store.mapped.take().is_none() {
            engine_bail!(SOURCE, BackendError, "unmap of a buffer that is not mapped");
        }
        Ok(())
    }

    fn reset_context(&mut self) {
        self.calls.push(GlCall::ResetContext);
        self.buffers.clear();
        self.bindings.clear();
    }
}

#[cfg(test)]
#[path = "emulated_opengl_tests.rs"]
mod tests;
