//! Priorities of the slots of a replay buffer.
use segment_tree::{ops::MaxIgnoreNaN, SegmentPoint};

/// Fixed-capacity array of priorities, one per slot of the buffer.
///
/// All priorities start at zero. A segment tree tracks the maximum so that
/// seeding a new transition does not scan the whole array.
#[derive(Debug)]
pub struct PriorityStore {
    priorities: Vec<f32>,
    max_tree: SegmentPoint<f32, MaxIgnoreNaN>,
}

impl PriorityStore {
    /// Creates a store of `capacity` zero priorities.
    pub fn new(capacity: usize) -> Self {
        Self {
            priorities: vec![0f32; capacity],
            max_tree: SegmentPoint::build(vec![0f32; capacity], MaxIgnoreNaN),
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.priorities.len()
    }

    /// Priority of slot `ix`.
    pub fn get(&self, ix: usize) -> f32 {
        self.priorities[ix]
    }

    /// Sets the priority of slot `ix`.
    pub fn set(&mut self, ix: usize, p: f32) {
        debug_assert!(p.is_finite() && p >= 0.0);
        self.priorities[ix] = p;
        self.max_tree.modify(ix, p);
    }

    /// Maximum over the first `len` slots, `None` if `len == 0`.
    pub fn max(&self, len: usize) -> Option<f32> {
        debug_assert!(len <= self.capacity());
        match len {
            0 => None,
            _ => Some(self.max_tree.query(0, len)),
        }
    }

    /// The first `len` priorities.
    pub fn as_slice(&self, len: usize) -> &[f32] {
        &self.priorities[..len]
    }
}

#[cfg(test)]
mod tests {
    use super::PriorityStore;

    #[test]
    fn test_max_over_prefix() {
        let mut store = PriorityStore::new(5);
        assert_eq!(store.max(0), None);
        assert_eq!(store.max(5), Some(0.0));

        store.set(0, 0.5);
        store.set(1, 2.0);
        store.set(3, 7.0);
        assert_eq!(store.max(1), Some(0.5));
        assert_eq!(store.max(3), Some(2.0));
        assert_eq!(store.max(5), Some(7.0));

        store.set(3, 0.1);
        assert_eq!(store.max(5), Some(2.0));
        assert_eq!(store.as_slice(4), &[0.5, 2.0, 0.0, 0.1]);
    }
}
