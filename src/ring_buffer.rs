//! Bounded ring buffer for metric history.
//!
//! A fixed-capacity circular buffer for time-series samples: O(1) append,
//! silent eviction of the oldest sample once full, and no reallocation after
//! warmup. History readers get owned copies, never a live view.

use std::collections::VecDeque;

/// A fixed-capacity ring buffer for time-series data.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Internal storage; VecDeque gives O(1) push/pop at both ends.
    data: VecDeque<T>,
    /// Maximum capacity, never exceeded.
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Creates a new ring buffer with the specified capacity.
    ///
    /// # Panics
    ///
    /// Panics if capacity is 0.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be greater than 0");
        Self { data: VecDeque::with_capacity(capacity), capacity }
    }

    /// Pushes a value, discarding the oldest one if at capacity.
    pub fn push(&mut self, value: T) {
        if self.data.len() >= self.capacity {
            self.data.pop_front();
        }
        self.data.push_back(value);
    }

    /// Returns the most recent value, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&T> {
        self.data.back()
    }

    /// Returns the oldest value, if any.
    #[must_use]
    pub fn oldest(&self) -> Option<&T> {
        self.data.front()
    }

    /// Returns the current number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the buffer holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns true if the buffer is at capacity.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.data.len() >= self.capacity
    }

    /// Returns the maximum capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates over the values from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }
}

impl<T: Clone> RingBuffer<T> {
    /// Returns an owned copy of the contents, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.data.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_never_exceeds_capacity() {
        let mut buf = RingBuffer::<u64>::new(60);

        for i in 0..200 {
            buf.push(i);
        }

        assert_eq!(buf.len(), 60);
    }

    #[test]
    fn test_new_creates_empty_buffer() {
        let buf: RingBuffer<f64> = RingBuffer::new(10);

        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.capacity(), 10);
    }

    #[test]
    #[should_panic(expected = "capacity must be greater than 0")]
    fn test_zero_capacity_panics() {
        let _buf: RingBuffer<f64> = RingBuffer::new(0);
    }

    #[test]
    fn test_eviction_is_oldest_first() {
        let mut buf = RingBuffer::new(3);

        buf.push(10);
        buf.push(20);
        buf.push(30);
        assert_eq!(buf.oldest(), Some(&10));

        buf.push(40); // Evicts 10
        assert_eq!(buf.oldest(), Some(&20));
        assert_eq!(buf.latest(), Some(&40));
    }

    #[test]
    fn test_iter_order_after_wrap() {
        let mut buf = RingBuffer::new(5);

        for i in 1..=8 {
            buf.push(i);
        }

        let values: Vec<_> = buf.iter().copied().collect();
        assert_eq!(values, vec![4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_to_vec_is_a_copy() {
        let mut buf = RingBuffer::new(4);
        buf.push(1.0);
        buf.push(2.0);

        let copy = buf.to_vec();
        buf.push(3.0);

        assert_eq!(copy, vec![1.0, 2.0]);
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_capacity_one() {
        let mut buf = RingBuffer::new(1);

        buf.push(1);
        buf.push(2);

        assert_eq!(buf.len(), 1);
        assert_eq!(buf.latest(), Some(&2));
        assert!(buf.is_full());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// The buffer never exceeds its capacity.
        #[test]
        fn prop_buffer_never_exceeds_capacity(
            capacity in 1usize..500,
            pushes in 0usize..2000
        ) {
            let mut buf = RingBuffer::<u64>::new(capacity);

            for i in 0..pushes {
                buf.push(i as u64);
            }

            prop_assert!(buf.len() <= capacity);
            prop_assert_eq!(buf.len(), pushes.min(capacity));
        }

        /// latest() always returns the last pushed value.
        #[test]
        fn prop_latest_is_last_pushed(
            capacity in 1usize..100,
            values in prop::collection::vec(any::<i64>(), 1..300)
        ) {
            let mut buf = RingBuffer::new(capacity);

            for &v in &values {
                buf.push(v);
            }

            prop_assert_eq!(buf.latest(), values.last());
        }

        /// Iteration preserves insertion order, oldest to newest.
        #[test]
        fn prop_iter_preserves_order(
            capacity in 2usize..50,
            values in prop::collection::vec(any::<i32>(), 1..100)
        ) {
            let mut buf = RingBuffer::new(capacity);

            for &v in &values {
                buf.push(v);
            }

            let collected: Vec<_> = buf.iter().copied().collect();
            let skip = values.len().saturating_sub(capacity);
            let expected: Vec<_> = values.into_iter().skip(skip).collect();

            prop_assert_eq!(collected, expected);
        }
    }
}
