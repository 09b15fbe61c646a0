use std::iter::Chain;
use std::slice::Iter;

pub const DEFAULT_HISTORY_SIZE: usize = 100;

/// Fixed-capacity circular buffer for storing metric history (for sparklines)
///
/// The buffer is pre-filled with `T::default()`, so it always holds exactly
/// `capacity` points. The neutral prefix before warm-up is padding, not
/// real readings.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBuffer<T> {
    values: Vec<T>,
    cursor: usize,
}

impl<T: Copy + Default> HistoryBuffer<T> {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_SIZE)
    }

    /// A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: vec![T::default(); capacity.max(1)],
            cursor: 0,
        }
    }

    /// Overwrite the oldest slot. O(1), never fails.
    pub fn append(&mut self, value: T) {
        self.values[self.cursor] = value;
        self.cursor = (self.cursor + 1) % self.values.len();
    }

    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    /// Always equal to `capacity()`.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Most recently appended value (the neutral value before any append).
    pub fn latest(&self) -> T {
        let newest = (self.cursor + self.values.len() - 1) % self.values.len();
        self.values[newest]
    }

    /// Values oldest-first, without touching the buffer.
    pub fn iter(&self) -> Chain<Iter<'_, T>, Iter<'_, T>> {
        let (newer, older) = self.values.split_at(self.cursor);
        older.iter().chain(newer.iter())
    }

    /// Copy the series out in chronological order.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().copied().collect()
    }
}

impl<T: Copy + Default> Default for HistoryBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: Copy + Default> IntoIterator for &'a HistoryBuffer<T> {
    type Item = &'a T;
    type IntoIter = Chain<Iter<'a, T>, Iter<'a, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
