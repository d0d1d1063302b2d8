// Rolling window domain model
use std::collections::VecDeque;

/// Fixed-capacity FIFO window. Pushing past capacity evicts the oldest values.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingBuffer<T> {
    values: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> RollingBuffer<T> {
    /// Returns `None` for a zero capacity; callers validate configuration first.
    pub fn new(capacity: usize) -> Option<Self> {
        if capacity == 0 {
            return None;
        }
        Some(Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    pub fn push(&mut self, value: T) {
        self.values.push_back(value);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    /// Oldest first.
    pub fn snapshot(&self) -> Vec<T> {
        self.values.iter().cloned().collect()
    }

    /// The last `n` values, oldest first.
    pub fn tail(&self, n: usize) -> Vec<T> {
        let skip = self.values.len().saturating_sub(n);
        self.values.iter().skip(skip).cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
