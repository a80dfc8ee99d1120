use {
    alloy::primitives::B256,
    std::collections::{HashSet, VecDeque},
};

/// Bounded FIFO set of recently seen transaction hashes.
///
/// Membership testing only; when inserting into a full window the oldest
/// entry is evicted first, so the window never holds more than `capacity`
/// hashes.
pub struct SeenWindow {
    order: VecDeque<B256>,
    seen: HashSet<B256>,
    capacity: usize,
}

impl SeenWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "window capacity must be positive");
        Self {
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    pub fn contains(&self, hash: &B256) -> bool {
        self.seen.contains(hash)
    }

    /// Records the hash as seen. Returns false if it was already present.
    pub fn insert(&mut self, hash: B256) -> bool {
        if !self.seen.insert(hash) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.order.push_back(hash);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
