/// Graphics device, backend strategies and native API surfaces

pub mod backend;
pub mod call_log;
pub mod config;
pub mod direct3d;
pub mod direct3d_api;
pub mod emulated_direct3d;
mod emulated_memory;
pub mod emulated_opengl;
pub mod graphics_device;
pub mod opengl;
pub mod opengl_api;

pub use backend::{
    BufferBackend, BufferKind, BufferUsage, NativeBuffer, NativeBufferDesc, SetDataOptions, Transfer, WriteMode,
};
pub use call_log::CallLog;
pub use config::{DeviceConfig, GraphicsProfile};
pub use direct3d::Direct3dBackend;
pub use direct3d_api::{
    D3dBindFlags, D3dBufferDesc, D3dCpuAccess, D3dDeviceContext, D3dMapMode, D3dResourceId, D3dUsage,
    MappedSubresource,
};
pub use emulated_direct3d::{D3dCall, EmulatedD3d, EmulatedD3dConfig};
pub use emulated_memory::DEFAULT_MAX_BUFFER_SIZE;
pub use emulated_opengl::{EmulatedGl, EmulatedGlConfig, GlCall};
pub use graphics_device::{GraphicsDevice, ResettableResource, ResourceKey};
pub use opengl::OpenGlBackend;
pub use opengl_api::{GlApi, GlBufferName, GlMapAccess, GlTarget, GlUsage};
