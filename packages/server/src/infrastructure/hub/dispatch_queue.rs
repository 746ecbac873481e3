//! Bounded, non-blocking queue for broadcasts the hub raises about its own mutations.

use std::collections::VecDeque;

use super::config::OverflowPolicy;

#[derive(Debug)]
pub struct DispatchQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
    policy: OverflowPolicy,
    dropped: u64,
}

impl<T> DispatchQueue<T> {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
            policy,
            dropped: 0,
        }
    }

    /// Never blocks. Returns the item discarded by the overflow policy, if any.
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.items.len() < self.capacity {
            self.items.push_back(item);
            return None;
        }

        self.dropped += 1;
        match self.policy {
            OverflowPolicy::DropOldest => {
                let oldest = self.items.pop_front();
                self.items.push_back(item);
                oldest
            }
            OverflowPolicy::DropNewest => Some(item),
        }
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items discarded since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
