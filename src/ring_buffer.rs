use crate::Price;

/// Fixed-capacity window of the most recent prices.
#[derive(Clone, Debug)]
pub(crate) struct RingBuffer {
    buffer: Vec<Price>,
    /// Slot of the oldest value once the buffer is full.
    head: usize,
    len: usize,
}

impl RingBuffer {
    #[must_use]
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "ring buffer capacity must be non-zero");

        Self {
            buffer: vec![0.0; capacity],
            head: 0,
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Appends `value`, returning the evicted oldest value when full.
    #[inline]
    pub(crate) fn push(&mut self, value: Price) -> Option<Price> {
        if self.is_full() {
            let old = std::mem::replace(&mut self.buffer[self.head], value);
            self.head = (self.head + 1) % self.capacity();
            Some(old)
        } else {
            self.buffer[self.len] = value;
            self.len += 1;
            None
        }
    }

    /// Values from oldest to newest.
    pub(crate) fn iter(&self) -> impl Iterator<Item = Price> + '_ {
        let (newer, older) = self.buffer[..self.len].split_at(self.head);
        older.iter().chain(newer).copied()
    }

    /// Sum of the held values, added oldest first.
    #[inline]
    pub(crate) fn sum(&self) -> Price {
        self.iter().sum()
    }
}
