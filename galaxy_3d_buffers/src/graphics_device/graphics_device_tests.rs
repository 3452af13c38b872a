use super::*;
use std::sync::atomic::AtomicUsize;
use crate::buffer::{IndexBuffer, IndexElementSize, VertexBuffer};
use crate::declaration::{VertexPositionColor, VertexPositionTexture};
use crate::error::Error;
use crate::graphics_device::{BufferUsage, NativeBuffer, NativeBufferDesc};

// ============================================================================
// Mock backend
// ============================================================================

/// Backend that only counts resets; allocation always fails
struct MockBackend {
    resets: Arc<AtomicUsize>,
}

impl BufferBackend for MockBackend {
    fn name(&self) -> &'static str {
        "Mock"
    }

    fn allocate(&self, _desc: &NativeBufferDesc) -> Result<Box<dyn NativeBuffer>> {
        Err(Error::OutOfMemory)
    }

    fn device_reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

fn mock_device(profile: GraphicsProfile) -> (Arc<GraphicsDevice>, Arc<AtomicUsize>) {
    let resets = Arc::new(AtomicUsize::new(0));
    let backend = MockBackend { resets: Arc::clone(&resets) };
    let config = DeviceConfig { profile, label: "Test Device".to_string() };
    (GraphicsDevice::new(config, Box::new(backend)), resets)
}

fn gl_device() -> Arc<GraphicsDevice> {
    let backend = crate::graphics_device::OpenGlBackend::new(crate::graphics_device::EmulatedGl::default());
    GraphicsDevice::new(DeviceConfig::default(), Box::new(backend))
}

/// Resource counting reset notifications
#[derive(Default)]
struct CountingResource {
    resets: AtomicUsize,
}

impl ResettableResource for CountingResource {
    fn graphics_device_resetting(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_default_config() {
    let config = DeviceConfig::default();
    assert_eq!(config.profile, GraphicsProfile::HiDef);
    assert_eq!(config.label, "Galaxy3D Device");
}

#[test]
fn test_profile_index_support() {
    assert!(GraphicsProfile::HiDef.supports_32bit_indices());
    assert!(!GraphicsProfile::Reach.supports_32bit_indices());
}

#[test]
fn test_device_accessors() {
    let (device, _) = mock_device(GraphicsProfile::Reach);
    assert_eq!(device.profile(), GraphicsProfile::Reach);
    assert_eq!(device.config().label, "Test Device");
    assert_eq!(device.backend().name(), "Mock");
    assert_eq!(device.reset_count(), 0);
}

// ============================================================================
// Reset broadcast
// ============================================================================

#[test]
fn test_reset_notifies_every_live_resource() {
    let (device, backend_resets) = mock_device(GraphicsProfile::HiDef);
    let a = Arc::new(CountingResource::default());
    let b = Arc::new(CountingResource::default());
    let weak_a: Weak<dyn ResettableResource> = Arc::downgrade(&a) as Weak<dyn ResettableResource>;
    let weak_b: Weak<dyn ResettableResource> = Arc::downgrade(&b) as Weak<dyn ResettableResource>;
    device.register_resource(weak_a);
    device.register_resource(weak_b);

    device.reset();
    device.reset();

    assert_eq!(a.resets.load(Ordering::SeqCst), 2);
    assert_eq!(b.resets.load(Ordering::SeqCst), 2);
    assert_eq!(backend_resets.load(Ordering::SeqCst), 2);
    assert_eq!(device.reset_count(), 2);
}

#[test]
fn test_unregistered_resource_is_not_notified() {
    let (device, _) = mock_device(GraphicsProfile::HiDef);
    let resource = Arc::new(CountingResource::default());
    let weak: Weak<dyn ResettableResource> = Arc::downgrade(&resource) as Weak<dyn ResettableResource>;
    let key = device.register_resource(weak);
    device.unregister_resource(key);

    device.reset();
    assert_eq!(resource.resets.load(Ordering::SeqCst), 0);
    assert_eq!(device.live_resource_count(), 0);
}

#[test]
fn test_dropped_resources_are_pruned() {
    let (device, _) = mock_device(GraphicsProfile::HiDef);
    let resource = Arc::new(CountingResource::default());
    let weak: Weak<dyn ResettableResource> = Arc::downgrade(&resource) as Weak<dyn ResettableResource>;
    device.register_resource(weak);
    assert_eq!(device.live_resource_count(), 1);

    drop(resource);
    assert_eq!(device.live_resource_count(), 0);
    device.reset();
}

#[test]
fn test_reset_without_resources() {
    let (device, backend_resets) = mock_device(GraphicsProfile::HiDef);
    device.reset();
    assert_eq!(backend_resets.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Draw binding
// ============================================================================

#[test]
fn test_set_vertex_buffer_reports_layout_changes() {
    let device = gl_device();
    let first = VertexBuffer::for_type::<VertexPositionColor>(&device, 4, BufferUsage::NONE).unwrap();
    let same_layout = VertexBuffer::for_type::<VertexPositionColor>(&device, 8, BufferUsage::NONE).unwrap();
    let other_layout = VertexBuffer::for_type::<VertexPositionTexture>(&device, 4, BufferUsage::NONE).unwrap();

    assert!(device.set_vertex_buffer(&first).unwrap());
    assert!(!device.set_vertex_buffer(&first).unwrap());
    // Shared declaration instance: no change
    assert!(!device.set_vertex_buffer(&same_layout).unwrap());
    assert!(device.set_vertex_buffer(&other_layout).unwrap());
    assert!(first.is_realized());
}

#[test]
fn test_reset_forgets_bound_layout() {
    let device = gl_device();
    let buffer = VertexBuffer::for_type::<VertexPositionColor>(&device, 4, BufferUsage::NONE).unwrap();
    assert!(device.set_vertex_buffer(&buffer).unwrap());

    device.reset();
    assert!(!buffer.is_realized());
    assert!(device.set_vertex_buffer(&buffer).unwrap());
    assert!(buffer.is_realized());
}

#[test]
fn test_set_index_buffer_realizes() {
    let device = gl_device();
    let buffer = IndexBuffer::new(&device, IndexElementSize::SixteenBits, 6, BufferUsage::NONE).unwrap();
    device.set_index_buffer(&buffer).unwrap();
    assert!(buffer.is_realized());
}

#[test]
fn test_bind_propagates_allocation_failure() {
    let (device, _) = mock_device(GraphicsProfile::HiDef);
    let buffer = IndexBuffer::new(&device, IndexElementSize::SixteenBits, 6, BufferUsage::NONE).unwrap();
    assert_eq!(device.set_index_buffer(&buffer), Err(Error::OutOfMemory));
    assert!(!buffer.is_realized());
}
