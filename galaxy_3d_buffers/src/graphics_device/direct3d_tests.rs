use super::*;
use crate::error::Error;
use crate::graphics_device::backend::BufferUsage;
use crate::graphics_device::call_log::CallLog;
use crate::graphics_device::direct3d_api::MappedSubresource;
use crate::graphics_device::emulated_direct3d::{D3dCall, EmulatedD3d};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn backend() -> (Direct3dBackend, CallLog<D3dCall>) {
    let d3d = EmulatedD3d::new();
    let log = d3d.call_log();
    (Direct3dBackend::new(d3d), log)
}

fn desc(kind: BufferKind, size: u64, dynamic: bool) -> NativeBufferDesc {
    NativeBufferDesc { kind, size, dynamic, usage: BufferUsage::NONE }
}

fn contiguous(offset: u64, len: usize) -> Transfer {
    Transfer { offset, element_size: len, buffer_stride: len, element_count: 1 }
}

// ============================================================================
// Allocation
// ============================================================================

#[test]
fn test_static_and_dynamic_usages() {
    let (backend, log) = backend();
    let _static_buffer = backend.allocate(&desc(BufferKind::Vertex, 32, false)).unwrap();
    let _dynamic_buffer = backend.allocate(&desc(BufferKind::Index, 32, true)).unwrap();
    assert_eq!(
        log.calls(),
        vec![
            D3dCall::CreateBuffer { id: 1, byte_width: 32, usage: D3dUsage::Default },
            D3dCall::CreateBuffer { id: 2, byte_width: 32, usage: D3dUsage::Dynamic },
        ]
    );
}

#[test]
fn test_bind_uses_kind_slot() {
    let (backend, log) = backend();
    let mut indices = backend.allocate(&desc(BufferKind::Index, 8, false)).unwrap();
    indices.bind().unwrap();
    assert_eq!(log.count(|c| matches!(c, D3dCall::SetIndexBuffer(_))), 1);
}

#[test]
fn test_drop_releases_buffer_and_staging() {
    let (backend, log) = backend();
    let mut buffer = backend.allocate(&desc(BufferKind::Vertex, 8, false)).unwrap();
    let mut out = [0u8; 8];
    buffer.read(&contiguous(0, 8), &mut out).unwrap();
    drop(buffer);
    assert_eq!(log.count(|c| matches!(c, D3dCall::Release(_))), 2);
}

// ============================================================================
// Writes
// ============================================================================

#[test]
fn test_static_contiguous_write_updates_subresource() {
    let (backend, log) = backend();
    let mut buffer = backend.allocate(&desc(BufferKind::Vertex, 16, false)).unwrap();
    buffer.write(&contiguous(4, 8), &[1; 8], WriteMode::Blocking).unwrap();
    assert_eq!(
        log.count(|c| matches!(c, D3dCall::UpdateSubresource { offset: 4, len: 8, .. })),
        1
    );
    assert_eq!(log.count(|c| matches!(c, D3dCall::Map { .. })), 0);
}

#[test]
fn test_dynamic_write_map_modes() {
    let (backend, log) = backend();
    let mut buffer = backend.allocate(&desc(BufferKind::Vertex, 16, true)).unwrap();

    buffer.write(&contiguous(0, 16), &[1; 16], WriteMode::Discard { size: 16 }).unwrap();
    buffer.write(&contiguous(0, 8), &[2; 8], WriteMode::NoOverwrite).unwrap();
    buffer.write(&contiguous(8, 8), &[3; 8], WriteMode::Blocking).unwrap();

    let modes: Vec<D3dMapMode> = log
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            D3dCall::Map { mode, .. } => Some(mode),
            _ => None,
        })
        .collect();
    assert_eq!(
        modes,
        vec![D3dMapMode::WriteDiscard, D3dMapMode::WriteNoOverwrite, D3dMapMode::WriteNoOverwrite]
    );
    assert_eq!(log.count(|c| matches!(c, D3dCall::Unmap(_))), 3);
}

#[test]
fn test_per_element_write_goes_through_staging() {
    let (backend, log) = backend();
    let mut buffer = backend.allocate(&desc(BufferKind::Vertex, 80, false)).unwrap();
    let transfer = Transfer { offset: 12, element_size: 8, buffer_stride: 20, element_count: 4 };
    buffer.write(&transfer, &[9; 32], WriteMode::Blocking).unwrap();

    assert_eq!(log.count(|c| matches!(c, D3dCall::CopyResource { .. })), 2);
    assert_eq!(log.count(|c| matches!(c, D3dCall::Map { mode: D3dMapMode::ReadWrite, .. })), 1);

    let mut out = vec![0u8; 80];
    buffer.read(&contiguous(0, 80), &mut out).unwrap();
    for vertex in 0..4 {
        let base = vertex * 20;
        assert_eq!(&out[base..base + 12], &[0; 12]);
        assert_eq!(&out[base + 12..base + 20], &[9; 8]);
    }
}

#[test]
fn test_discard_beyond_size_recreates_resource() {
    let (backend, log) = backend();
    let mut buffer = backend.allocate(&desc(BufferKind::Index, 8, true)).unwrap();
    buffer.write(&contiguous(0, 24), &[4; 24], WriteMode::Discard { size: 24 }).unwrap();

    assert_eq!(buffer.allocated_size(), 24);
    assert_eq!(log.count(|c| matches!(c, D3dCall::CreateBuffer { byte_width: 24, .. })), 1);
    assert_eq!(log.count(|c| *c == D3dCall::Release(1)), 1);
}

// ============================================================================
// Reads
// ============================================================================

#[test]
fn test_static_read_round_trip() {
    let (backend, _log) = backend();
    let mut buffer = backend.allocate(&desc(BufferKind::Index, 8, false)).unwrap();
    buffer.write(&contiguous(0, 8), &[1, 2, 3, 4, 5, 6, 7, 8], WriteMode::Blocking).unwrap();

    let mut out = [0u8; 3];
    buffer.read(&contiguous(5, 3), &mut out).unwrap();
    assert_eq!(out, [6, 7, 8]);
}

#[test]
fn test_staging_is_created_once() {
    let (backend, log) = backend();
    let mut buffer = backend.allocate(&desc(BufferKind::Index, 8, false)).unwrap();
    let mut out = [0u8; 8];
    buffer.read(&contiguous(0, 8), &mut out).unwrap();
    buffer.read(&contiguous(0, 8), &mut out).unwrap();
    assert_eq!(log.count(|c| matches!(c, D3dCall::CreateBuffer { usage: D3dUsage::Staging, .. })), 1);
}

#[test]
fn test_dynamic_read_is_not_implemented() {
    let (backend, log) = backend();
    let mut buffer = backend.allocate(&desc(BufferKind::Vertex, 8, true)).unwrap();
    log.clear();
    let mut out = [0u8; 8];
    let result = buffer.read(&contiguous(0, 8), &mut out);
    assert!(matches!(result, Err(Error::NotImplemented(_))));
    assert!(log.is_empty());
}

// ============================================================================
// Unmap while unwinding
// ============================================================================

/// EmulatedD3d kept reachable from the test after the backend's context
/// lock is poisoned by a panic
struct SharedD3d(Arc<Mutex<EmulatedD3d>>);

impl SharedD3d {
    fn d3d(&self) -> MutexGuard<'_, EmulatedD3d> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// SAFETY: every call forwards to one EmulatedD3d
unsafe impl D3dDeviceContext for SharedD3d {
    fn create_buffer(&mut self, desc: &D3dBufferDesc, initial_data: Option<&[u8]>) -> Result<D3dResourceId> {
        self.d3d().create_buffer(desc, initial_data)
    }

    fn release(&mut self, id: D3dResourceId) { self.d3d().release(id) }

    fn update_subresource(&mut self, id: D3dResourceId, offset: u64, data: &[u8]) -> Result<()> {
        self.d3d().update_subresource(id, offset, data)
    }

    fn map(&mut self, id: D3dResourceId, mode: D3dMapMode) -> Result<MappedSubresource> {
        self.d3d().map(id, mode)
    }

    fn unmap(&mut self, id: D3dResourceId) -> Result<()> { self.d3d().unmap(id) }

    fn copy_resource(&mut self, dst: D3dResourceId, src: D3dResourceId) -> Result<()> {
        self.d3d().copy_resource(dst, src)
    }

    fn ia_set_vertex_buffer(&mut self, id: D3dResourceId) -> Result<()> { self.d3d().ia_set_vertex_buffer(id) }

    fn ia_set_index_buffer(&mut self, id: D3dResourceId) -> Result<()> { self.d3d().ia_set_index_buffer(id) }
}

fn shared_backend() -> (Direct3dBackend, Arc<Mutex<EmulatedD3d>>, CallLog<D3dCall>) {
    let d3d = EmulatedD3d::new();
    let log = d3d.call_log();
    let shared = Arc::new(Mutex::new(d3d));
    (Direct3dBackend::new(SharedD3d(Arc::clone(&shared))), shared, log)
}

#[test]
fn test_panic_during_dynamic_write_still_unmaps() {
    let (backend, shared, log) = shared_backend();
    let mut buffer = backend.allocate(&desc(BufferKind::Index, 16, true)).unwrap();
    log.clear();

    // Client data shorter than the transfer: the copy into the mapping panics
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let _ = buffer.write(&contiguous(0, 8), &[5; 4], WriteMode::NoOverwrite);
    }));
    assert!(outcome.is_err());
    assert_eq!(log.count(|c| matches!(c, D3dCall::Map { id: 1, mode: D3dMapMode::WriteNoOverwrite })), 1);
    assert_eq!(log.count(|c| *c == D3dCall::Unmap(1)), 1);

    let mut d3d = shared.lock().unwrap();
    assert!(d3d.map(1, D3dMapMode::WriteNoOverwrite).is_ok());
    d3d.unmap(1).unwrap();
}

#[test]
fn test_panic_during_staging_read_still_unmaps() {
    let (backend, shared, log) = shared_backend();
    let mut buffer = backend.allocate(&desc(BufferKind::Vertex, 16, false)).unwrap();
    log.clear();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut out = [0u8; 4];
        let _ = buffer.read(&contiguous(0, 8), &mut out);
    }));
    assert!(outcome.is_err());

    // Staging buffer is resource 2
    assert_eq!(log.count(|c| matches!(c, D3dCall::Map { id: 2, mode: D3dMapMode::Read })), 1);
    assert_eq!(log.count(|c| *c == D3dCall::Unmap(2)), 1);
    {
        let mut d3d = shared.lock().unwrap();
        assert!(d3d.map(2, D3dMapMode::Read).is_ok());
        d3d.unmap(2).unwrap();
    }

    // Dropping after the poisoned context still releases both resources
    drop(buffer);
    assert_eq!(log.count(|c| matches!(c, D3dCall::Release(1) | D3dCall::Release(2))), 2);
}
