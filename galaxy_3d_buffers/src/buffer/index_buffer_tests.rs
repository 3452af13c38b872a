use super::*;
use crate::error::Error;
use crate::graphics_device::{DeviceConfig, EmulatedD3d, Direct3dBackend, GraphicsProfile};

fn device(profile: GraphicsProfile) -> Arc<GraphicsDevice> {
    let config = DeviceConfig { profile, ..DeviceConfig::default() };
    GraphicsDevice::new(config, Box::new(Direct3dBackend::new(EmulatedD3d::new())))
}

#[test]
fn test_element_size_bytes() {
    assert_eq!(IndexElementSize::SixteenBits.size_bytes(), 2);
    assert_eq!(IndexElementSize::ThirtyTwoBits.size_bytes(), 4);
    assert_eq!(<u16 as IndexElement>::ELEMENT_SIZE, IndexElementSize::SixteenBits);
    assert_eq!(<u32 as IndexElement>::ELEMENT_SIZE, IndexElementSize::ThirtyTwoBits);
}

#[test]
fn test_reach_rejects_32bit_indices() {
    let device = device(GraphicsProfile::Reach);
    let result = IndexBuffer::for_type::<u32>(&device, 6, BufferUsage::NONE);
    assert!(matches!(result, Err(Error::Unsupported(_))));
    assert_eq!(device.live_resource_count(), 0);

    let buffer = IndexBuffer::for_type::<u16>(&device, 6, BufferUsage::NONE).unwrap();
    assert_eq!(buffer.element_size(), IndexElementSize::SixteenBits);
}

#[test]
fn test_hidef_accepts_32bit_indices() {
    let device = device(GraphicsProfile::HiDef);
    let buffer = IndexBuffer::for_type::<u32>(&device, 6, BufferUsage::NONE).unwrap();
    assert_eq!(buffer.capacity(), 6);
    assert_eq!(buffer.element_size(), IndexElementSize::ThirtyTwoBits);
}

#[test]
fn test_round_trip_with_offset() {
    let device = device(GraphicsProfile::HiDef);
    let mut buffer = IndexBuffer::for_type::<u16>(&device, 8, BufferUsage::NONE).unwrap();
    buffer.set_data(4, &[0u16, 1, 2, 2, 3, 0], 0, SetDataOptions::None).unwrap();
    assert_eq!(buffer.index_count(), 6);

    let mut out = [0u16; 6];
    buffer.get_data(4, &mut out, 0).unwrap();
    assert_eq!(out, [0, 1, 2, 2, 3, 0]);
}

#[test]
fn test_packed_pairs_count_in_indices() {
    let device = device(GraphicsProfile::HiDef);
    let mut buffer = IndexBuffer::for_type::<u16>(&device, 8, BufferUsage::NONE).unwrap();
    // Each u32 carries two 16-bit indices
    buffer.set_data(0, &[0x0001_0000u32, 0x0003_0002], 0, SetDataOptions::None).unwrap();
    assert_eq!(buffer.index_count(), 4);

    let mut out = [0u16; 4];
    buffer.get_data_all(&mut out).unwrap();
    assert_eq!(out, [0, 1, 2, 3]);
}

#[test]
fn test_capacity_is_enforced() {
    let device = device(GraphicsProfile::HiDef);
    let mut buffer = IndexBuffer::for_type::<u16>(&device, 3, BufferUsage::NONE).unwrap();
    buffer.set_data_all(&[0u16, 1, 2]).unwrap();
    let result = buffer.set_data_all(&[0u16, 1, 2, 3]);
    assert!(matches!(result, Err(Error::OutOfRange(_))));
    assert_eq!(buffer.index_count(), 3);
    assert!(buffer.index_count() <= buffer.capacity());
}

#[test]
fn test_bind_through_device() {
    let device = device(GraphicsProfile::HiDef);
    let buffer = IndexBuffer::for_type::<u16>(&device, 3, BufferUsage::NONE).unwrap();
    device.set_index_buffer(&buffer).unwrap();
    assert!(buffer.is_realized());
    assert_eq!(buffer.index_element_size(), IndexElementSize::SixteenBits);
}
