use std::collections::VecDeque;

/// Bounded FIFO buffer that evicts its oldest entry when full.
#[derive(Debug, Clone)]
pub struct FifoDropOldestQueue<T> {
    buf: VecDeque<T>,
    capacity: usize,
}

impl<T> FifoDropOldestQueue<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0);

        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Keeps only the most recent `capacity` items, preserving their order.
    pub fn from_vec(capacity: usize, items: Vec<T>) -> Self {
        let mut queue = Self::new(capacity);
        for item in items {
            queue.push_overwrite(item);
        }
        queue
    }

    /// Appends `value`, returning the evicted front entry if the buffer was full.
    pub fn push_overwrite(&mut self, value: T) -> Option<T> {
        let evicted = if self.buf.len() >= self.capacity {
            self.buf.pop_front()
        } else {
            None
        };
        self.buf.push_back(value);
        evicted
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buf.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.buf.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_when_full() {
        let mut queue = FifoDropOldestQueue::new(3);
        assert_eq!(queue.push_overwrite(1), None);
        assert_eq!(queue.push_overwrite(2), None);
        assert_eq!(queue.push_overwrite(3), None);
        assert_eq!(queue.push_overwrite(4), Some(1));
        assert_eq!(queue.into_vec(), vec![2, 3, 4]);
    }

    #[test]
    fn from_vec_keeps_the_tail() {
        let queue = FifoDropOldestQueue::from_vec(2, vec!["a", "b", "c", "d"]);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.iter().copied().collect::<Vec<_>>(), vec!["c", "d"]);
    }

    #[test]
    fn clear_frees_every_slot() {
        let mut queue = FifoDropOldestQueue::from_vec(2, vec![1, 2]);
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.push_overwrite(3), None);
        assert_eq!(queue.push_overwrite(4), None);
        assert_eq!(queue.into_vec(), vec![3, 4]);
    }

    #[test]
    #[should_panic]
    fn zero_capacity_panics() {
        let _ = FifoDropOldestQueue::<u8>::new(0);
    }
}
