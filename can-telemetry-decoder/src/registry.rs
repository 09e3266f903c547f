//! Registry of identifiers without a known layout
//!
//! Insertion-ordered and append-only. Once `capacity` distinct identifiers are
//! stored, further new identifiers are dropped without error.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFrameRegistry {
    capacity: usize,
    order: Vec<u32>,
    seen: HashSet<u32>,
}

impl UnknownFrameRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Record `can_id`
    ///
    /// Returns `true` only when the identifier was newly stored.
    pub fn insert(&mut self, can_id: u32) -> bool {
        if self.seen.contains(&can_id) {
            return false;
        }
        if self.is_full() {
            log::trace!("Unknown frame registry full, dropping 0x{:03X}", can_id);
            return false;
        }

        self.seen.insert(can_id);
        self.order.push(can_id);
        true
    }

    pub fn contains(&self, can_id: u32) -> bool {
        self.seen.contains(&can_id)
    }

    /// Identifiers in first-seen order
    pub fn ids(&self) -> &[u32] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.order.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_stored_once() {
        let mut registry = UnknownFrameRegistry::new(1024);
        assert!(registry.insert(0x123));
        assert!(!registry.insert(0x123));
        assert_eq!(registry.ids(), &[0x123]);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut registry = UnknownFrameRegistry::new(8);
        for id in [0x300, 0x100, 0x200, 0x100] {
            registry.insert(id);
        }
        assert_eq!(registry.ids(), &[0x300, 0x100, 0x200]);
    }

    #[test]
    fn test_full_registry_drops_silently() {
        let mut registry = UnknownFrameRegistry::new(1024);
        for id in 0..1025u32 {
            registry.insert(id);
        }
        assert_eq!(registry.len(), 1024);
        assert!(registry.is_full());
        assert!(!registry.contains(1024));
        assert!(registry.contains(1023));

        // already-stored identifiers are still recognised once full
        assert!(!registry.insert(5));
        assert_eq!(registry.len(), 1024);
    }
}
