use std::collections::VecDeque;

/// Fixed-capacity FIFO store of previously observed output vectors.
///
/// Items are kept oldest first. Reading never reorders anything; once the
/// buffer is full every new record evicts the oldest one.
#[derive(Debug, Clone)]
pub struct PatternBuffer {
    /// Maximum number of stored vectors
    capacity: usize,
    /// Stored vectors, oldest at the front
    items: VecDeque<Vec<f64>>,
}

impl PatternBuffer {
    /// Create an empty buffer. A zero capacity is rejected by
    /// `FlywheelConfig::validate` before a buffer is ever built.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: VecDeque::with_capacity(capacity.min(1024)),
        }
    }

    /// Append a vector at the tail, evicting from the head past capacity
    pub fn record(&mut self, vector: Vec<f64>) {
        self.items.push_back(vector);
        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
    }

    /// Current contents, oldest to newest
    pub fn snapshot(&self) -> Vec<Vec<f64>> {
        self.items.iter().cloned().collect()
    }

    /// Borrowed contents, oldest to newest, without copying any vector
    pub fn history(&mut self) -> &[Vec<f64>] {
        self.items.make_contiguous()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_new_buffer_is_empty() {
        let buffer = PatternBuffer::new(4);
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.capacity(), 4);
        assert!(buffer.snapshot().is_empty());
    }

    #[test]
    fn test_keeps_last_capacity_items_in_order() {
        let mut rng = rand::thread_rng();

        for capacity in 1..=8 {
            let mut buffer = PatternBuffer::new(capacity);
            let total = capacity + rng.gen_range(1..20);
            let recorded: Vec<Vec<f64>> = (0..total)
                .map(|_| vec![rng.gen::<f64>(), rng.gen::<f64>()])
                .collect();

            for vector in &recorded {
                buffer.record(vector.clone());
            }

            assert_eq!(buffer.len(), capacity);
            assert_eq!(buffer.snapshot(), recorded[total - capacity..].to_vec());
        }
    }

    #[test]
    fn test_history_matches_snapshot_after_wraparound() {
        let mut buffer = PatternBuffer::new(3);
        for i in 0..7 {
            buffer.record(vec![i as f64]);
        }

        let expected = buffer.snapshot();
        assert_eq!(buffer.history(), expected.as_slice());
        assert_eq!(buffer.history(), &[vec![4.0], vec![5.0], vec![6.0]]);

        buffer.record(vec![7.0]);
        assert_eq!(buffer.history(), &[vec![5.0], vec![6.0], vec![7.0]]);
    }

    #[test]
    fn test_snapshot_does_not_reorder() {
        let mut buffer = PatternBuffer::new(3);
        buffer.record(vec![1.0]);
        buffer.record(vec![2.0]);

        // Reading the oldest entry must not make it "recent"
        let _ = buffer.snapshot();
        buffer.record(vec![3.0]);
        buffer.record(vec![4.0]);

        assert_eq!(buffer.snapshot(), vec![vec![2.0], vec![3.0], vec![4.0]]);
    }
}
