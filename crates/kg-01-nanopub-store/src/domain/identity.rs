//! # Identity Allocator
//!
//! Mints identifiers for new nanopublications. Identifiers are never
//! reused: the UUID allocator relies on collision resistance, the
//! sequential allocator on a process-wide counter.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of fresh local identifiers.
pub trait IdentityAllocator: Send + Sync {
    /// Return a new identifier, unique for the lifetime of the store.
    fn allocate(&self) -> String;
}

/// UUID v4 identifiers in simple (unhyphenated) hex form.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidAllocator;

impl IdentityAllocator for UuidAllocator {
    fn allocate(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

/// Deterministic identifiers (`np1`, `np2`, ...), for tests and fixtures.
#[derive(Debug, Default)]
pub struct SequentialAllocator {
    next: AtomicU64,
}

impl SequentialAllocator {
    /// Start counting from one.
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityAllocator for SequentialAllocator {
    fn allocate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        format!("np{}", n)
    }
}
