/*!
# Galaxy 3D Buffers

GPU vertex and index buffer management for the Galaxy 3D engine.

Buffers are created against a `GraphicsDevice`, which carries the backend
strategy chosen at startup (OpenGL-style or Direct3D-style). Native handles
are allocated lazily, released on device reset and recreated transparently.

## Architecture

- **VertexDeclaration**: immutable vertex layout, deduplicated process-wide
- **VertexBuffer / IndexBuffer**: typed buffers with fixed capacity
- **DynamicVertexBuffer / DynamicIndexBuffer**: streaming variants
- **UnsafeVertexBuffer / UnsafeIndexBuffer**: growable, fed from byte regions
- **GraphicsDevice**: backend owner, reset broadcast, draw binding
- **BufferBackend**: strategy trait implemented by `OpenGlBackend` and `Direct3dBackend`
- **EmulatedGl / EmulatedD3d**: software native APIs for headless use
*/

// Internal modules
mod error;
pub mod log;
pub mod declaration;
pub mod graphics_device;
pub mod buffer;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Device
    pub use crate::graphics_device::{DeviceConfig, GraphicsDevice, GraphicsProfile};

    // Logging sub-module (types and logger installation)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, set_logger, reset_logger};
    }

    // Vertex declarations
    pub mod declaration {
        pub use crate::declaration::*;
    }

    // Buffers
    pub mod buffer {
        pub use crate::buffer::*;
        pub use crate::graphics_device::{BufferUsage, SetDataOptions};
    }

    // Backends and native API surfaces
    pub mod backend {
        pub use crate::graphics_device::*;
    }
}

// Re-export math library at crate root
pub use glam;
