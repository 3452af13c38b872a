use super::*;
use crate::declaration::{VertexElementFormat, VertexElementUsage};
use std::sync::Arc;
use std::thread;

fn color(offset: u32) -> VertexElement {
    VertexElement::new(offset, VertexElementFormat::Color, VertexElementUsage::Color, 0)
}

fn position(offset: u32) -> VertexElement {
    VertexElement::new(offset, VertexElementFormat::Vector3, VertexElementUsage::Position, 0)
}

#[test]
fn test_new_cache_is_empty() {
    let cache = DeclarationCache::new();
    assert!(cache.is_empty());
    assert_eq!(cache.len(), 0);
}

#[test]
fn test_repeated_lookup_inserts_once() {
    let cache = DeclarationCache::new();
    let a = cache.get_or_create(16, &[position(0), color(12)]).unwrap();
    let b = cache.get_or_create(16, &[position(0), color(12)]).unwrap();
    assert!(VertexDeclaration::ptr_eq(&a, &b));
    assert_eq!(cache.len(), 1);

    cache.get_or_create(20, &[position(0), color(12)]).unwrap();
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_invalid_input_is_not_cached() {
    let cache = DeclarationCache::new();
    assert!(cache.get_or_create(8, &[position(0)]).is_err());
    assert!(cache.get_or_create(8, &[]).is_err());
    assert!(cache.is_empty());
}

#[test]
fn test_separate_caches_hold_separate_instances() {
    let first = DeclarationCache::new();
    let second = DeclarationCache::new();
    let a = first.get_or_create(16, &[position(0), color(12)]).unwrap();
    let b = second.get_or_create(16, &[position(0), color(12)]).unwrap();
    // Structurally equal, not the same instance
    assert_eq!(a, b);
    assert!(!VertexDeclaration::ptr_eq(&a, &b));
}

#[test]
fn test_concurrent_callers_share_one_instance() {
    let cache = Arc::new(DeclarationCache::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || cache.get_or_create(16, &[position(0), color(12)]).unwrap())
        })
        .collect();

    let declarations: Vec<VertexDeclaration> = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .collect();

    for declaration in &declarations[1..] {
        assert!(VertexDeclaration::ptr_eq(&declarations[0], declaration));
    }
    assert_eq!(cache.len(), 1);
}
