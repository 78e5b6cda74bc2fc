//! Handle registry: the only owner of live kernel objects.

use std::collections::HashMap;
use std::rc::Rc;

use shared::HandleRef;

/// Live objects keyed by handle hash. Objects are freed only by explicit release.
pub struct HandleRegistry<T> {
    kind: &'static str,
    next_hash: u64,
    objects: HashMap<u64, Rc<T>>,
}

impl<T> HandleRegistry<T> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            next_hash: 1,
            objects: HashMap::new(),
        }
    }

    /// Take ownership of `obj` and hand out a fresh handle for it
    pub fn insert(&mut self, obj: T) -> HandleRef {
        let hash = self.next_hash;
        self.next_hash += 1;
        self.objects.insert(hash, Rc::new(obj));
        HandleRef {
            hash,
            kind: self.kind.to_string(),
        }
    }

    /// Resolve a handle of this registry's kind
    pub fn resolve(&self, handle: &HandleRef) -> Option<Rc<T>> {
        if handle.kind != self.kind {
            return None;
        }
        self.objects.get(&handle.hash).cloned()
    }

    /// Returns false when the handle was unknown or already released
    pub fn release(&mut self, hash: u64) -> bool {
        self.objects.remove(&hash).is_some()
    }

    /// Number of handles actually released
    pub fn release_many(&mut self, hashes: impl IntoIterator<Item = u64>) -> usize {
        hashes.into_iter().filter(|h| self.release(*h)).count()
    }

    pub fn release_all(&mut self) -> usize {
        let count = self.objects.len();
        self.objects.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
