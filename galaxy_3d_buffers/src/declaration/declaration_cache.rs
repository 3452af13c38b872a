/// Process-wide deduplication of vertex declarations.
///
/// Entries are bucketed by the precomputed structural hash; a bucket holds
/// more than one declaration only on hash collision, in which case full
/// structural equality decides. Lookup and insert happen under one lock, so
/// concurrent callers asking for the same layout always get one instance.

use std::sync::{Mutex, OnceLock, PoisonError};
use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::engine_trace;
use super::vertex_declaration::{structural_hash, validate_layout, VertexDeclaration};
use super::vertex_element::VertexElement;

static GLOBAL_CACHE: OnceLock<DeclarationCache> = OnceLock::new();

/// Structural cache of VertexDeclaration instances
pub struct DeclarationCache {
    buckets: Mutex<FxHashMap<u64, Vec<VertexDeclaration>>>,
}

impl DeclarationCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(FxHashMap::default()),
        }
    }

    /// The cache used by `VertexDeclaration::get_or_create`
    pub fn global() -> &'static DeclarationCache {
        GLOBAL_CACHE.get_or_init(DeclarationCache::new)
    }

    /// Return the cached declaration for `(stride, elements)`, creating it on first use
    pub fn get_or_create(&self, stride: u32, elements: &[VertexElement]) -> Result<VertexDeclaration> {
        validate_layout(stride, elements)?;
        let hash = structural_hash(stride, elements);

        // Entries are immutable once inserted, a poisoned lock still holds a valid map
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        let bucket = buckets.entry(hash).or_default();
        if let Some(existing) = bucket.iter().find(|d| d.matches(stride, elements)) {
            return Ok(existing.clone());
        }

        let declaration = VertexDeclaration::create_uncached(stride, elements, hash);
        bucket.push(declaration.clone());
        engine_trace!("galaxy3d::DeclarationCache",
            "Cached vertex declaration (stride {}, {} elements)", stride, elements.len());
        Ok(declaration)
    }

    /// Number of distinct declarations
    pub fn len(&self) -> usize {
        let buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        buckets.values().map(Vec::len).sum()
    }

    /// Whether the cache holds no declaration
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DeclarationCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "declaration_cache_tests.rs"]
mod tests;
