/// Direct3D 11 style buffer API surface used by the Direct3D backend

use std::ptr::NonNull;
use bitflags::bitflags;
use crate::error::Result;

/// Native resource handle
pub type D3dResourceId = u64;

/// D3D11_USAGE subset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum D3dUsage {
    /// GPU read/write, CPU updates through update_subresource only
    Default,
    /// GPU read, CPU write through map
    Dynamic,
    /// Copy target/source with CPU map access, never bound
    Staging,
}

bitflags! {
    /// D3D11_BIND_FLAG subset
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct D3dBindFlags: u32 {
        const VERTEX_BUFFER = 0x1;
        const INDEX_BUFFER = 0x2;
    }
}

bitflags! {
    /// D3D11_CPU_ACCESS_FLAG
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct D3dCpuAccess: u32 {
        const WRITE = 0x10000;
        const READ = 0x20000;
    }
}

/// D3D11_BUFFER_DESC subset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct D3dBufferDesc {
    pub byte_width: u64,
    pub usage: D3dUsage,
    pub bind_flags: D3dBindFlags,
    pub cpu_access: D3dCpuAccess,
}

/// D3D11_MAP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum D3dMapMode {
    Read,
    Write,
    ReadWrite,
    WriteDiscard,
    WriteNoOverwrite,
}

/// Result of a successful map: the whole resource in client memory
#[derive(Debug, Clone, Copy)]
pub struct MappedSubresource {
    pub data: NonNull<u8>,
    /// Mapped length in bytes (the resource's byte width)
    pub size: u64,
}

/// Immediate device context entry points
///
/// # Safety
///
/// `map` must return a pointer valid for reads and writes of `size` bytes
/// until `unmap` is called for the same resource or the resource is
/// released. Implementations must refuse copies into or out of mapped
/// resources.
pub unsafe trait D3dDeviceContext: Send {
    /// ID3D11Device::CreateBuffer
    fn create_buffer(&mut self, desc: &D3dBufferDesc, initial_data: Option<&[u8]>) -> Result<D3dResourceId>;

    /// Release the last reference to a resource. Unknown ids are ignored.
    fn release(&mut self, id: D3dResourceId);

    /// UpdateSubresource with a byte box
    fn update_subresource(&mut self, id: D3dResourceId, offset: u64, data: &[u8]) -> Result<()>;

    /// Map
    fn map(&mut self, id: D3dResourceId, mode: D3dMapMode) -> Result<MappedSubresource>;

    /// Unmap
    fn unmap(&mut self, id: D3dResourceId) -> Result<()>;

    /// CopyResource (whole resource, equal sizes)
    fn copy_resource(&mut self, dst: D3dResourceId, src: D3dResourceId) -> Result<()>;

    /// IASetVertexBuffers, slot 0
    fn ia_set_vertex_buffer(&mut self, id: D3dResourceId) -> Result<()>;

    /// IASetIndexBuffer
    fn ia_set_index_buffer(&mut self, id: D3dResourceId) -> Result<()>;

    /// Recreate the device after a reset
    fn reset_device(&mut self) {}
}
