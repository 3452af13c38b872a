/// Storage allocation shared by the emulated devices

use crate::error::{Error, Result};
use crate::engine_error;

/// Largest single buffer the emulated devices accept by default (256 MiB)
pub const DEFAULT_MAX_BUFFER_SIZE: u64 = 256 << 20;

/// Zeroed storage of `size` bytes
///
/// Fails with `OutOfMemory` when `size` exceeds `limit` or the allocator
/// refuses the request.
pub(crate) fn zeroed_storage(source: &str, size: u64, limit: u64) -> Result<Vec<u8>> {
    if size > limit {
        engine_error!(source, "OutOfMemory: {} bytes requested, buffer limit is {} bytes", size, limit);
        return Err(Error::OutOfMemory);
    }
    let mut storage = Vec::new();
    let reserved = usize::try_from(size).ok().filter(|&len| storage.try_reserve_exact(len).is_ok());
    let Some(len) = reserved else {
        engine_error!(source, "OutOfMemory: host allocation of {} bytes failed", size);
        return Err(Error::OutOfMemory);
    };
    storage.resize(len, 0);
    Ok(storage)
}

#[cfg(test)]
#[path = "emulated_memory_tests.rs"]
mod tests;
