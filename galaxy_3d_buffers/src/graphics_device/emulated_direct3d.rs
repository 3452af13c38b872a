/// Software Direct3D 11 immediate context
///
/// Resources are kept in client memory. The usage rules of the real API are
/// enforced: update_subresource only on Default resources, write maps only
/// on Dynamic or CPU-writable Staging resources, reads only through
/// CPU-readable Staging resources, no copies involving a mapped resource.
/// Every call is recorded in a CallLog.

use std::ptr::NonNull;
use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::engine_bail;
use super::call_log::CallLog;
use super::emulated_memory::{zeroed_storage, DEFAULT_MAX_BUFFER_SIZE};
use super::direct3d_api::{
    D3dBindFlags, D3dBufferDesc, D3dCpuAccess, D3dDeviceContext, D3dMapMode, D3dResourceId, D3dUsage,
    MappedSubresource,
};

const SOURCE: &str = "galaxy3d::EmulatedD3d";

/// One recorded D3D call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum D3dCall {
    CreateBuffer { id: D3dResourceId, byte_width: u64, usage: D3dUsage },
    Release(D3dResourceId),
    UpdateSubresource { id: D3dResourceId, offset: u64, len: usize },
    Map { id: D3dResourceId, mode: D3dMapMode },
    Unmap(D3dResourceId),
    CopyResource { dst: D3dResourceId, src: D3dResourceId },
    SetVertexBuffer(D3dResourceId),
    SetIndexBuffer(D3dResourceId),
    ResetDevice,
}

struct D3dStore {
    desc: D3dBufferDesc,
    data: Vec<u8>,
    mapped: Option<D3dMapMode>,
}

/// Emulated device limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmulatedD3dConfig {
    /// Largest byte width accepted by create_buffer, larger requests fail with `OutOfMemory`
    pub max_buffer_size: u64,
}

impl Default for EmulatedD3dConfig {
    fn default() -> Self {
        Self { max_buffer_size: DEFAULT_MAX_BUFFER_SIZE }
    }
}

/// Software D3D device and immediate context
pub struct EmulatedD3d {
    config: EmulatedD3dConfig,
    next_id: D3dResourceId,
    resources: FxHashMap<D3dResourceId, D3dStore>,
    calls: CallLog<D3dCall>,
}

impl EmulatedD3d {
    pub fn new() -> Self {
        Self::with_config(EmulatedD3dConfig::default())
    }

    pub fn with_config(config: EmulatedD3dConfig) -> Self {
        Self {
            config,
            next_id: 1,
            resources: FxHashMap::default(),
            calls: CallLog::new(),
        }
    }

    /// Handle on the call record, shared with this context
    pub fn call_log(&self) -> CallLog<D3dCall> {
        self.calls.clone()
    }

    fn resource(&mut self, id: D3dResourceId) -> Result<&mut D3dStore> {
        match self.resources.get_mut(&id) {
            Some(store) => Ok(store),
            None => engine_bail!(SOURCE, BackendError, "unknown resource {}", id),
        }
    }

    fn validate_desc(desc: &D3dBufferDesc) -> Result<()> {
        if desc.byte_width == 0 {
            engine_bail!(SOURCE, BackendError, "zero-sized buffer");
        }
        let valid = match desc.usage {
            D3dUsage::Default => desc.cpu_access.is_empty(),
            D3dUsage::Dynamic => desc.cpu_access == D3dCpuAccess::WRITE && !desc.bind_flags.is_empty(),
            D3dUsage::Staging => desc.bind_flags.is_empty() && !desc.cpu_access.is_empty(),
        };
        if !valid {
            engine_bail!(SOURCE, BackendError, "invalid buffer description {:?}", desc);
        }
        Ok(())
    }

    fn check_map(desc: &D3dBufferDesc, mode: D3dMapMode) -> bool {
        let reads = matches!(mode, D3dMapMode::Read | D3dMapMode::ReadWrite);
        let writes = !matches!(mode, D3dMapMode::Read);
        match desc.usage {
            D3dUsage::Default => false,
            D3dUsage::Dynamic => matches!(mode, D3dMapMode::WriteDiscard | D3dMapMode::WriteNoOverwrite),
            D3dUsage::Staging => {
                !matches!(mode, D3dMapMode::WriteDiscard | D3dMapMode::WriteNoOverwrite)
                    && (!reads || desc.cpu_access.contains(D3dCpuAccess::READ))
                    && (!writes || desc.cpu_access.contains(D3dCpuAccess::WRITE))
            }
        }
    }

    fn set_input_buffer(&mut self, id: D3dResourceId, flag: D3dBindFlags) -> Result<()> {
        let store = self.resource(id)?;
        if !store.desc.bind_flags.contains(flag) {
            engine_bail!(SOURCE, BackendError, "resource {} lacks bind flag {:?}", id, flag);
        }
        if store.mapped.is_some() {
            engine_bail!(SOURCE, BackendError, "resource {} bound while mapped", id);
        }
        Ok(())
    }
}

impl Default for EmulatedD3d {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: mapped pointers point into a resource's Vec, which is never
// reallocated after creation and is freed only by release/reset_device,
// which end the mapping too.
unsafe impl D3dDeviceContext for EmulatedD3d {
    fn create_buffer(&mut self, desc: &D3dBufferDesc, initial_data: Option<&[u8]>) -> Result<D3dResourceId> {
        Self::validate_desc(desc)?;
        let mut data = zeroed_storage(SOURCE, desc.byte_width, self.config.max_buffer_size)?;
        if let Some(initial) = initial_data {
            if initial.len() != data.len() {
                engine_bail!(SOURCE, BackendError, "initial data of {} bytes for {} byte buffer", initial.len(), data.len());
            }
            data.copy_from_slice(initial);
        }

        let id = self.next_id;
        self.next_id += 1;
        self.resources.insert(id, D3dStore { desc: *desc, data, mapped: None });
        self.calls.push(D3dCall::CreateBuffer { id, byte_width: desc.byte_width, usage: desc.usage });
        Ok(id)
    }

    fn release(&mut self, id: D3dResourceId) {
        self.calls.push(D3dCall::Release(id));
        self.resources.remove(&id);
    }

    fn update_subresource(&mut self, id: D3dResourceId, offset: u64, data: &[u8]) -> Result<()> {
        self.calls.push(D3dCall::UpdateSubresource { id, offset, len: data.len() });
        let store = self.resource(id)?;
        if store.desc.usage != D3dUsage::Default {
            engine_bail!(SOURCE, BackendError, "update_subresource on {:?} resource {}", store.desc.usage, id);
        }
        if store.mapped.is_some() {
            engine_bail!(SOURCE, BackendError, "update_subresource on mapped resource {}", id);
        }
        let start = offset as usize;
        let Some(end) = start.checked_add(data.len()).filter(|end| *end <= store.data.len()) else {
            engine_bail!(SOURCE, BackendError, "update box {}+{} outside resource {}", offset, data.len(), id);
        };
        store.data[start..end].copy_from_slice(data);
        Ok(())
    }

    fn map(&mut self, id: D3dResourceId, mode: D3dMapMode) -> Result<MappedSubresource> {
        self.calls.push(D3dCall::Map { id, mode });
        let store = self.resource(id)?;
        if !Self::check_map(&store.desc, mode) {
            engine_bail!(SOURCE, BackendError, "map {:?} not allowed on {:?} resource {}", mode, store.desc.usage, id);
        }
        if store.mapped.is_some() {
            engine_bail!(SOURCE, BackendError, "resource {} already mapped", id);
        }
        if mode == D3dMapMode::WriteDiscard {
            // Fresh storage: previous contents are gone
            store.data.fill(0);
        }
        store.mapped = Some(mode);
        Ok(MappedSubresource {
            data: NonNull::from(store.data.as_mut_slice()).cast::<u8>(),
            size: store.data.len() as u64,
        })
    }

    fn unmap(&mut self, id: D3dResourceId) -> Result<()> {
        self.calls.push(D3dCall::Unmap(id));
        if self.resource(id)?.mapped.take().is_none() {
            engine_bail!(SOURCE, BackendError, "unmap of resource {} that is not mapped", id);
        }
        Ok(())
    }

    fn copy_resource(&mut self, dst: D3dResourceId, src: D3dResourceId) -> Result<()> {
        self.calls.push(D3dCall::CopyResource { dst, src });
        if dst == src {
            engine_bail!(SOURCE, BackendError, "copy of resource {} onto itself", dst);
        }
        let source = match self.resources.get(&src) {
            Some(store) if store.mapped.is_none() => store.data.clone(),
            Some(_) => engine_bail!(SOURCE, BackendError, "copy from mapped resource {}", src),
            None => engine_bail!(SOURCE, BackendError, "unknown resource {}", src),
        };
        let target = self.resource(dst)?;
        if target.mapped.is_some() {
            engine_bail!(SOURCE, BackendError, "copy into mapped resource {}", dst);
        }
        if target.data.len() != source.len() {
            engine_bail!(SOURCE, BackendError, "copy between resources of {} and {} bytes", source.len(), target.data.len());
        }
        target.data.copy_from_slice(&source);
        Ok(())
    }

    fn ia_set_vertex_buffer(&mut self, id: D3dResourceId) -> Result<()> {
        self.calls.push(D3dCall::SetVertexBuffer(id));
        self.set_input_buffer(id, D3dBindFlags::VERTEX_BUFFER)
    }

    fn ia_set_index_buffer(&mut self, id: D3dResourceId) -> Result<()> {
        self.calls.push(D3dCall::SetIndexBuffer(id));
        self.set_input_buffer(id, D3dBindFlags::INDEX_BUFFER)
    }

    fn reset_device(&mut self) {
        self.calls.push(D3dCall::ResetDevice);
        self.resources.clear();
    }
}

#[cfg(test)]
#[path = "emulated_direct3d_tests.rs"]
mod tests;
