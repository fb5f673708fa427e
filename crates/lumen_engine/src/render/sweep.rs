//! Deferred mark-and-sweep key lists
//!
//! Draw traversal must not mutate the list it is iterating, so stale
//! entries discovered mid-pass are only *marked*; compaction happens in
//! one sweep after the pass, and only when something was actually
//! marked. Both layer draw lists and layer-to-layer bindings share this
//! utility.

/// An ordered key list with deferred compaction
#[derive(Debug)]
pub struct SweepList<K> {
    items: Vec<K>,
    pending: bool,
}

impl<K: PartialEq + Copy> SweepList<K> {
    /// Create an empty list
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            pending: false,
        }
    }

    /// Append a key, preserving insertion order
    pub fn push(&mut self, key: K) {
        self.items.push(key);
    }

    /// Remove a key immediately (outside traversal); true if found
    pub fn remove(&mut self, key: K) -> bool {
        if let Some(index) = self.items.iter().position(|k| *k == key) {
            self.items.remove(index);
            true
        } else {
            false
        }
    }

    /// Whether the list holds a key
    pub fn contains(&self, key: K) -> bool {
        self.items.contains(&key)
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.items.iter().copied()
    }

    /// Flag that a stale entry was seen during traversal
    pub fn mark(&mut self) {
        self.pending = true;
    }

    /// Whether a sweep is pending
    pub fn pending(&self) -> bool {
        self.pending
    }

    /// Compact dead entries, but only when a traversal marked one
    pub fn sweep(&mut self, is_live: impl Fn(K) -> bool) {
        if !self.pending {
            return;
        }
        self.items.retain(|k| is_live(*k));
        self.pending = false;
    }

    /// Number of entries, live or not
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<K: PartialEq + Copy> Default for SweepList<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_is_deferred_until_marked() {
        let mut list = SweepList::new();
        list.push(1);
        list.push(2);
        list.push(3);

        // Nothing marked: sweep must not compact even with dead entries.
        list.sweep(|k| k != 2);
        assert_eq!(list.len(), 3);

        list.mark();
        list.sweep(|k| k != 2);
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![1, 3]);
        assert!(!list.pending());
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut list = SweepList::new();
        list.push(10);
        list.push(20);
        list.push(30);

        assert!(list.remove(20));
        assert!(!list.remove(20));
        assert_eq!(list.iter().collect::<Vec<_>>(), vec![10, 30]);
    }
}
