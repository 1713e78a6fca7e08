//! Ring Buffer Implementation

use crate::RingBufferError;

/// Fixed-capacity buffer holding the most recent `capacity` values.
///
/// Pushing into a full buffer overwrites the oldest value. Iteration runs
/// oldest to newest.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Backing storage, grows up to `capacity` then wraps
    storage: Vec<T>,
    capacity: usize,
    /// Position of the oldest value once the buffer has wrapped
    head: usize,
}

impl<T: Copy> RingBuffer<T> {
    /// Create a new ring buffer with given capacity
    pub fn new(capacity: usize) -> Result<Self, RingBufferError> {
        if capacity == 0 {
            return Err(RingBufferError::ZeroCapacity);
        }
        Ok(Self {
            storage: Vec::with_capacity(capacity),
            capacity,
            head: 0,
        })
    }

    /// Push a value (overwrites oldest if full)
    pub fn push(&mut self, value: T) {
        if self.storage.len() < self.capacity {
            self.storage.push(value);
        } else {
            self.storage[self.head] = value;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    /// Number of values currently held
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// True once `capacity` values are held
    pub fn is_full(&self) -> bool {
        self.storage.len() == self.capacity
    }

    /// Value `k` positions back from the newest (`0` is the newest)
    pub fn back(&self, k: usize) -> Option<T> {
        let len = self.storage.len();
        if k >= len {
            return None;
        }
        Some(self.storage[(self.head + len - 1 - k) % len])
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let len = self.storage.len();
        (0..len).map(move |i| self.storage[(self.head + i) % len])
    }
}
