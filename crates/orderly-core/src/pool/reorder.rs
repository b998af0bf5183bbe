//! Index-keyed reassembly buffer

use std::collections::HashMap;

/// Holds results that arrived before their predecessors and releases them
/// as a contiguous run starting at the next expected index.
#[derive(Debug)]
pub(super) struct ReorderBuffer<V> {
    pending: HashMap<usize, V>,
    next_index: usize,
}

impl<V> ReorderBuffer<V> {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
            next_index: 0,
        }
    }

    /// Store a result for `index`
    pub fn insert(&mut self, index: usize, value: V) {
        debug_assert!(
            index >= self.next_index,
            "index {} already released (next is {})",
            index,
            self.next_index
        );
        let previous = self.pending.insert(index, value);
        debug_assert!(previous.is_none(), "duplicate result for index {}", index);
    }

    /// Remove and return the next in-order result, advancing the cursor
    pub fn pop_ready(&mut self) -> Option<(usize, V)> {
        let value = self.pending.remove(&self.next_index)?;
        let index = self.next_index;
        self.next_index += 1;
        Some((index, value))
    }

    /// Index of the next result to release
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// Results waiting for a predecessor
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_order_passthrough() {
        let mut buffer = ReorderBuffer::new();
        buffer.insert(0, "a");
        assert_eq!(buffer.pop_ready(), Some((0, "a")));
        assert_eq!(buffer.pop_ready(), None);
        assert_eq!(buffer.next_index(), 1);
    }

    #[test]
    fn test_holds_until_gap_filled() {
        let mut buffer = ReorderBuffer::new();
        buffer.insert(2, "c");
        buffer.insert(1, "b");
        assert_eq!(buffer.pop_ready(), None);
        assert_eq!(buffer.pending(), 2);

        buffer.insert(0, "a");
        let released: Vec<_> = std::iter::from_fn(|| buffer.pop_ready()).collect();
        assert_eq!(released, vec![(0, "a"), (1, "b"), (2, "c")]);
        assert_eq!(buffer.pending(), 0);
        assert_eq!(buffer.next_index(), 3);
    }

    #[test]
    fn test_releases_only_contiguous_run() {
        let mut buffer = ReorderBuffer::new();
        for index in [0, 1, 3, 4] {
            buffer.insert(index, index * 10);
        }

        let released: Vec<_> = std::iter::from_fn(|| buffer.pop_ready()).collect();
        assert_eq!(released, vec![(0, 0), (1, 10)]);
        assert_eq!(buffer.pending(), 2);

        buffer.insert(2, 20);
        let released: Vec<_> = std::iter::from_fn(|| buffer.pop_ready()).collect();
        assert_eq!(released, vec![(2, 20), (3, 30), (4, 40)]);
    }
}
