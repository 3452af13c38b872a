use super::*;
use crate::declaration::{VertexPositionColor, VertexType};
use crate::error::Error;
use crate::graphics_device::{
    CallLog, D3dCall, Direct3dBackend, DeviceConfig, EmulatedD3d, EmulatedGl, GlCall, GraphicsProfile,
    OpenGlBackend,
};

fn gl_device() -> (Arc<GraphicsDevice>, CallLog<GlCall>) {
    let gl = EmulatedGl::default();
    let log = gl.call_log();
    (GraphicsDevice::new(DeviceConfig::default(), Box::new(OpenGlBackend::new(gl))), log)
}

fn d3d_device() -> (Arc<GraphicsDevice>, CallLog<D3dCall>) {
    let d3d = EmulatedD3d::new();
    let log = d3d.call_log();
    (GraphicsDevice::new(DeviceConfig::default(), Box::new(Direct3dBackend::new(d3d))), log)
}

fn index_desc() -> UnsafeIndexBufferDesc {
    UnsafeIndexBufferDesc {
        element_size: IndexElementSize::SixteenBits,
        usage: BufferUsage::NONE,
        dynamic: true,
    }
}

fn indices(values: &[u16]) -> Vec<u8> {
    bytemuck::cast_slice(values).to_vec()
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_zero_count_is_out_of_range() {
    let (device, log) = gl_device();
    let mut buffer = UnsafeIndexBuffer::from_desc(&device, index_desc()).unwrap();
    let result = buffer.set_data(0, &indices(&[1, 2]), 0, SetDataOptions::None);
    assert!(matches!(result, Err(Error::OutOfRange(_))));
    assert!(log.is_empty());
}

#[test]
fn test_short_region_is_out_of_range() {
    let (device, _) = gl_device();
    let mut buffer = UnsafeIndexBuffer::from_desc(&device, index_desc()).unwrap();
    let result = buffer.set_data(0, &indices(&[1, 2]), 3, SetDataOptions::None);
    assert!(matches!(result, Err(Error::OutOfRange(_))));
}

#[test]
fn test_reach_rejects_32bit_unsafe_indices() {
    let gl = EmulatedGl::default();
    let config = DeviceConfig { profile: GraphicsProfile::Reach, ..DeviceConfig::default() };
    let device = GraphicsDevice::new(config, Box::new(OpenGlBackend::new(gl)));
    let desc = UnsafeIndexBufferDesc { element_size: IndexElementSize::ThirtyTwoBits, ..index_desc() };
    assert!(matches!(UnsafeIndexBuffer::from_desc(&device, desc), Err(Error::Unsupported(_))));
}

// ============================================================================
// Growth
// ============================================================================

#[test]
fn test_growth_reallocates_on_gl() {
    let (device, log) = gl_device();
    let mut buffer = UnsafeIndexBuffer::from_desc(&device, index_desc()).unwrap();

    buffer.set_data(0, &indices(&[0, 1, 2]), 3, SetDataOptions::None).unwrap();
    assert_eq!(buffer.last_allocated_size(), 6);
    assert_eq!(buffer.index_count(), 3);

    buffer.set_data(0, &indices(&[0, 1, 2, 2, 3, 0]), 6, SetDataOptions::NoOverwrite).unwrap();
    assert_eq!(buffer.last_allocated_size(), 12);
    assert_eq!(buffer.index_count(), 6);
    assert_eq!(log.count(|c| matches!(c, GlCall::BufferData { size: 12, .. })), 1);

    // Shrinking never reallocates
    buffer.set_data(0, &indices(&[4, 5]), 2, SetDataOptions::None).unwrap();
    assert_eq!(buffer.last_allocated_size(), 12);
    assert_eq!(buffer.index_count(), 2);
}

#[test]
fn test_growth_recreates_on_d3d() {
    let (device, log) = d3d_device();
    let mut buffer = UnsafeIndexBuffer::from_desc(&device, index_desc()).unwrap();
    buffer.set_data(0, &indices(&[0, 1]), 2, SetDataOptions::None).unwrap();
    buffer.set_data(0, &indices(&[0, 1, 2, 3]), 4, SetDataOptions::None).unwrap();

    assert_eq!(buffer.last_allocated_size(), 8);
    assert_eq!(log.count(|c| matches!(c, D3dCall::CreateBuffer { byte_width: 8, .. })), 1);
    assert_eq!(log.count(|c| matches!(c, D3dCall::Release(_))), 1);
}

#[test]
fn test_static_unsafe_round_trip() {
    let (device, _) = d3d_device();
    let desc = UnsafeIndexBufferDesc { dynamic: false, ..index_desc() };
    let mut buffer = UnsafeIndexBuffer::from_desc(&device, desc).unwrap();
    buffer.set_data(0, &indices(&[7, 8, 9]), 3, SetDataOptions::None).unwrap();

    let mut out = [0u8; 6];
    buffer.get_data(0, &mut out, 3).unwrap();
    assert_eq!(out.to_vec(), indices(&[7, 8, 9]));
}

// ============================================================================
// Raw pointers
// ============================================================================

#[test]
fn test_raw_pointer_round_trip() {
    let (device, _) = gl_device();
    let declaration = VertexPositionColor::vertex_declaration().unwrap();
    let mut buffer = UnsafeVertexBuffer::from_desc(&device, UnsafeVertexBufferDesc {
        declaration,
        usage: BufferUsage::NONE,
        dynamic: true,
    })
    .unwrap();

    let source: Vec<u8> = (0..32).collect();
    unsafe { buffer.set_data_raw(0, source.as_ptr(), 2, SetDataOptions::None) }.unwrap();
    assert_eq!(buffer.vertex_count(), 2);

    let mut target = vec![0u8; 32];
    unsafe { buffer.get_data_raw(0, target.as_mut_ptr(), 2) }.unwrap();
    assert_eq!(target, source);
}

#[test]
fn test_null_pointer_is_out_of_range() {
    let (device, _) = gl_device();
    let mut buffer = UnsafeIndexBuffer::from_desc(&device, index_desc()).unwrap();
    let result = unsafe { buffer.set_data_raw(0, std::ptr::null(), 4, SetDataOptions::None) };
    assert!(matches!(result, Err(Error::OutOfRange(_))));
}

// ============================================================================
// Reset and binding
// ============================================================================

#[test]
fn test_reset_recreates_at_high_water_mark() {
    let (device, log) = gl_device();
    let mut buffer = UnsafeIndexBuffer::from_desc(&device, index_desc()).unwrap();
    buffer.set_data(0, &indices(&[0, 1, 2, 3]), 4, SetDataOptions::None).unwrap();
    log.clear();

    device.reset();
    assert!(!buffer.is_realized());
    assert_eq!(buffer.last_allocated_size(), 8);

    device.set_index_buffer(&buffer).unwrap();
    assert!(buffer.is_realized());
    assert_eq!(log.count(|c| matches!(c, GlCall::BufferData { size: 8, with_data: false, .. })), 1);
}

#[test]
fn test_unsafe_vertex_buffer_binds() {
    let (device, _) = gl_device();
    let declaration = VertexPositionColor::vertex_declaration().unwrap();
    let mut buffer = UnsafeVertexBuffer::from_desc(&device, UnsafeVertexBufferDesc {
        declaration,
        usage: BufferUsage::NONE,
        dynamic: false,
    })
    .unwrap();
    buffer.set_data(0, &[0u8; 48], 3, SetDataOptions::None).unwrap();
    assert!(device.set_vertex_buffer(&buffer).unwrap());
}
