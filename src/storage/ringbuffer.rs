/// Fixed-capacity buffer that always exposes its contents as one contiguous,
/// chronologically ordered slice.
///
/// Every element is written twice (at `i` and `i + capacity`), so the most
/// recent `len` elements are always `buffer[start..start + len]` without
/// copying or rotating. Appending is O(1); the oldest element is dropped
/// exactly when a write exceeds capacity.
pub struct SliceableRingBuffer<T: Clone> {
    buffer: Vec<T>,
    write_position: usize,
    capacity: usize,
    len: usize,
}

impl<T: Clone> SliceableRingBuffer<T> {
    pub fn new(capacity: usize, default_value: T) -> Self {
        let capacity = capacity.max(1);
        SliceableRingBuffer {
            buffer: vec![default_value; capacity * 2],
            write_position: 0,
            capacity,
            len: 0,
        }
    }

    pub fn write(&mut self, data: T) {
        let position = self.write_position;
        self.buffer[position] = data.clone();
        self.buffer[position + self.capacity] = data;

        self.write_position = (self.write_position + 1) % self.capacity;
        self.len = (self.len + 1).min(self.capacity);
    }

    /// All retained elements, oldest first.
    pub fn get_slice(&self) -> &[T] {
        self.get_slice_with_len(self.len)
    }

    /// The last `len` retained elements, oldest first. `len` is clamped to
    /// what has been written.
    pub fn get_slice_with_len(&self, len: usize) -> &[T] {
        let len = len.min(self.len);
        let start = (self.write_position + (self.capacity - len)) % self.capacity;
        &self.buffer[start..start + len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Forget all elements. Old values stay in memory but are never exposed again.
    pub fn clear(&mut self) {
        self.write_position = 0;
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::SliceableRingBuffer;

    #[test]
    fn it_initializes_empty() {
        let rb = SliceableRingBuffer::new(5, 0);
        assert!(rb.is_empty());
        assert_eq!(rb.get_slice(), &[] as &[i32]);
    }

    #[test]
    fn partially_filled() {
        let mut rb = SliceableRingBuffer::new(5, 0);
        for i in 1..=3 {
            rb.write(i);
        }
        assert_eq!(rb.len(), 3);
        assert_eq!(rb.get_slice(), &[1, 2, 3]);
    }

    #[test]
    fn writing_and_reading() {
        let mut rb = SliceableRingBuffer::new(5, 0);
        for i in 1..=5 {
            rb.write(i);
        }
        assert_eq!(rb.get_slice(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn overwriting_elements() {
        let mut rb = SliceableRingBuffer::new(5, 0);
        for i in 1..=13 {
            rb.write(i);
        }
        assert_eq!(rb.len(), 5);
        assert_eq!(rb.get_slice(), &[9, 10, 11, 12, 13]);
    }

    #[test]
    fn get_slice_with_len() {
        let mut rb = SliceableRingBuffer::new(5, 0);
        for i in 1..=13 {
            rb.write(i);
        }
        assert_eq!(rb.get_slice_with_len(3), &[11, 12, 13]);
        assert_eq!(rb.get_slice_with_len(20), &[9, 10, 11, 12, 13]);
    }

    #[test]
    fn clear_resets_contents() {
        let mut rb = SliceableRingBuffer::new(3, 0);
        for i in 1..=7 {
            rb.write(i);
        }
        rb.clear();
        assert!(rb.is_empty());
        rb.write(42);
        assert_eq!(rb.get_slice(), &[42]);
    }
}
