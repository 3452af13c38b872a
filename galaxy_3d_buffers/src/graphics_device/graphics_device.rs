/// GraphicsDevice - owner of the backend strategy and of the reset broadcast.
///
/// Buffers are created against an `Arc<GraphicsDevice>`. On creation each
/// buffer registers a ResettableResource with the device and deregisters it
/// on disposal; `reset()` walks the live registrations and asks each one to
/// drop its native handle. No global registry is involved: a device only
/// knows the resources handed to it.

use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use slotmap::{new_key_type, SlotMap};
use crate::buffer::{IndexSource, VertexSource};
use crate::declaration::VertexDeclaration;
use crate::error::Result;
use crate::{engine_debug, engine_info};
use super::backend::BufferBackend;
use super::config::{DeviceConfig, GraphicsProfile};

const SOURCE: &str = "galaxy3d::GraphicsDevice";

new_key_type! {
    /// Registration of a resource with its device
    pub struct ResourceKey;
}

/// Something that holds native state and must drop it on device reset
///
/// Called synchronously from `GraphicsDevice::reset`. Implementations must
/// not fail and must tolerate never having allocated anything.
pub trait ResettableResource: Send + Sync {
    fn graphics_device_resetting(&self);
}

/// Graphics device
pub struct GraphicsDevice {
    config: DeviceConfig,
    backend: Box<dyn BufferBackend>,
    /// Live resources, weakly held so a leaked registration can't keep a buffer alive
    resources: Mutex<SlotMap<ResourceKey, Weak<dyn ResettableResource>>>,
    /// Declaration of the vertex buffer bound last
    bound_declaration: Mutex<Option<VertexDeclaration>>,
    reset_count: AtomicU64,
}

impl GraphicsDevice {
    /// Create a device around a backend strategy
    pub fn new(config: DeviceConfig, backend: Box<dyn BufferBackend>) -> Arc<Self> {
        engine_info!(SOURCE, "Device '{}' created ({:?} profile, {} backend)",
            config.label, config.profile, backend.name());
        Arc::new(Self {
            config,
            backend,
            resources: Mutex::new(SlotMap::with_key()),
            bound_declaration: Mutex::new(None),
            reset_count: AtomicU64::new(0),
        })
    }

    // ===== ACCESSORS =====

    pub fn config(&self) -> &DeviceConfig { &self.config }

    pub fn profile(&self) -> GraphicsProfile { self.config.profile }

    pub fn backend(&self) -> &dyn BufferBackend { self.backend.as_ref() }

    /// Number of resets performed so far
    pub fn reset_count(&self) -> u64 {
        self.reset_count.load(Ordering::Acquire)
    }

    /// Number of registered resources still alive
    pub fn live_resource_count(&self) -> usize {
        let resources = self.resources.lock().unwrap_or_else(PoisonError::into_inner);
        resources.values().filter(|r| r.strong_count() > 0).count()
    }

    // ===== REGISTRATION =====

    pub(crate) fn register_resource(&self, resource: Weak<dyn ResettableResource>) -> ResourceKey {
        let mut resources = self.resources.lock().unwrap_or_else(PoisonError::into_inner);
        resources.insert(resource)
    }

    pub(crate) fn unregister_resource(&self, key: ResourceKey) {
        let mut resources = self.resources.lock().unwrap_or_else(PoisonError::into_inner);
        resources.remove(key);
    }

    // ===== RESET =====

    /// Broadcast a device reset
    ///
    /// Every live resource drops its native handle (recreated lazily on next
    /// use), then the backend rebuilds its context. Never fails; calling it
    /// again is harmless.
    pub fn reset(&self) {
        // Snapshot first: a handler may lock the registry indirectly
        let live: Vec<Arc<dyn ResettableResource>> = {
            let mut resources = self.resources.lock().unwrap_or_else(PoisonError::into_inner);
            resources.retain(|_, r| r.strong_count() > 0);
            resources.values().filter_map(Weak::upgrade).collect()
        };

        engine_info!(SOURCE, "Device '{}' resetting, notifying {} resources",
            self.config.label, live.len());

        for resource in &live {
            resource.graphics_device_resetting();
        }

        *self.bound_declaration.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.backend.device_reset();
        self.reset_count.fetch_add(1, Ordering::AcqRel);
    }

    // ===== BINDING =====

    /// Bind a vertex buffer for drawing
    ///
    /// Realizes the native handle if needed. Returns whether the vertex
    /// layout changed compared to the previous bind (compared by instance).
    pub fn set_vertex_buffer<B: VertexSource + ?Sized>(&self, buffer: &B) -> Result<bool> {
        buffer.bind()?;
        let mut bound = self.bound_declaration.lock().unwrap_or_else(PoisonError::into_inner);
        let changed = match bound.as_ref() {
            Some(previous) => !VertexDeclaration::ptr_eq(previous, buffer.vertex_declaration()),
            None => true,
        };
        if changed {
            engine_debug!(SOURCE, "Vertex layout changed (stride {})",
                buffer.vertex_declaration().vertex_stride());
            *bound = Some(buffer.vertex_declaration().clone());
        }
        Ok(changed)
    }

    /// Bind an index buffer for drawing
    pub fn set_index_buffer<B: IndexSource + ?Sized>(&self, buffer: &B) -> Result<()> {
        buffer.bind()
    }
}

#[cfg(test)]
#[path = "graphics_device_tests.rs"]
mod tests;
