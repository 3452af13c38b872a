/// Immutable, structurally deduplicated per-vertex layout.
///
/// A VertexDeclaration is a cheap handle (Arc) onto layout data that never
/// changes after creation. All public constructors go through the process-wide
/// DeclarationCache, so two declarations built from the same
/// `(stride, elements)` are the same instance and can be compared by
/// reference when tracking binding-state changes.

use std::any::type_name;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use rustc_hash::FxHasher;
use crate::error::Result;
use crate::{engine_bail, engine_err};
use super::declaration_cache::DeclarationCache;
use super::vertex_element::{VertexElement, VertexElementUsage};
use super::vertex_type::VertexType;

const SOURCE: &str = "galaxy3d::VertexDeclaration";

/// Order-sensitive hash of a layout
pub(crate) fn structural_hash(stride: u32, elements: &[VertexElement]) -> u64 {
    let mut hasher = FxHasher::default();
    stride.hash(&mut hasher);
    elements.len().hash(&mut hasher);
    for element in elements {
        element.hash(&mut hasher);
    }
    hasher.finish()
}

/// Check a layout before it enters the cache
pub(crate) fn validate_layout(stride: u32, elements: &[VertexElement]) -> Result<()> {
    if elements.is_empty() {
        engine_bail!(SOURCE, EmptyInput, "vertex declaration must have at least one element");
    }
    if stride == 0 {
        engine_bail!(SOURCE, InvalidLayout, "vertex stride must be greater than zero");
    }
    for (index, element) in elements.iter().enumerate() {
        let end = element_end(index, element)?;
        if end > stride {
            engine_bail!(SOURCE, InvalidLayout,
                "element {} ({:?} at offset {}) ends at byte {}, past vertex stride {}",
                index, element.format, element.offset, end, stride);
        }
    }
    Ok(())
}

fn element_end(index: usize, element: &VertexElement) -> Result<u32> {
    element.end().ok_or_else(|| engine_err!(SOURCE, InvalidLayout,
        "element {} ({:?} at offset {}) extends past the largest addressable vertex",
        index, element.format, element.offset))
}

struct DeclarationData {
    stride: u32,
    elements: Box<[VertexElement]>,
    hash: u64,
}

/// Shared, immutable vertex layout
#[derive(Clone)]
pub struct VertexDeclaration {
    data: Arc<DeclarationData>,
}

impl VertexDeclaration {
    /// Build a new instance (cache-internal, input already validated)
    pub(crate) fn create_uncached(stride: u32, elements: &[VertexElement], hash: u64) -> Self {
        Self {
            data: Arc::new(DeclarationData {
                stride,
                // Copied so that later changes to the caller's slice can't leak in
                elements: elements.to_vec().into_boxed_slice(),
                hash,
            }),
        }
    }

    /// Get the shared declaration for `(stride, elements)`
    ///
    /// # Errors
    ///
    /// - `EmptyInput` if `elements` is empty
    /// - `InvalidLayout` if an element ends past `stride` or `stride` is zero
    pub fn get_or_create(stride: u32, elements: &[VertexElement]) -> Result<Self> {
        DeclarationCache::global().get_or_create(stride, elements)
    }

    /// Get the shared declaration for tightly packed `elements`
    ///
    /// The stride is the furthest element end.
    pub fn from_elements(elements: &[VertexElement]) -> Result<Self> {
        let mut stride = 0;
        for (index, element) in elements.iter().enumerate() {
            stride = stride.max(element_end(index, element)?);
        }
        Self::get_or_create(stride, elements)
    }

    /// Get the declaration a vertex type exposes
    ///
    /// # Errors
    ///
    /// `InvalidLayout` if the type exposes no declaration or if the declared
    /// stride differs from the type's size.
    pub fn from_type<T: VertexType>() -> Result<Self> {
        let declaration = T::vertex_declaration().ok_or_else(|| {
            engine_err!(SOURCE, InvalidLayout,
                "vertex type {} does not expose a vertex declaration", type_name::<T>())
        })?;
        let size = std::mem::size_of::<T>();
        if declaration.vertex_stride() as usize != size {
            engine_bail!(SOURCE, InvalidLayout,
                "vertex type {} is {} bytes but declares a stride of {}",
                type_name::<T>(), size, declaration.vertex_stride());
        }
        Ok(declaration)
    }

    // ===== ACCESSORS =====

    /// Size of one vertex in bytes
    pub fn vertex_stride(&self) -> u32 { self.data.stride }

    /// Elements in declaration order
    pub fn elements(&self) -> &[VertexElement] { &self.data.elements }

    /// Precomputed structural hash
    pub fn structural_hash(&self) -> u64 { self.data.hash }

    /// Find the element carrying a semantic
    pub fn element(&self, usage: VertexElementUsage, usage_index: u32) -> Option<&VertexElement> {
        self.data.elements.iter()
            .find(|e| e.usage == usage && e.usage_index == usage_index)
    }

    /// Whether both handles point to the same cached instance
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.data, &b.data)
    }

    /// Structural comparison against raw layout input
    pub(crate) fn matches(&self, stride: u32, elements: &[VertexElement]) -> bool {
        self.data.stride == stride && *self.data.elements == *elements
    }
}

impl PartialEq for VertexDeclaration {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
            || (self.data.hash == other.data.hash
                && self.matches(other.data.stride, &other.data.elements))
    }
}

impl Eq for VertexDeclaration {}

impl Hash for VertexDeclaration {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.data.hash);
    }
}

impl fmt::Debug for VertexDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VertexDeclaration")
            .field("stride", &self.data.stride)
            .field("elements", &self.data.elements)
            .finish()
    }
}

#[cfg(test)]
#[path = "vertex_declaration_tests.rs"]
mod tests;
