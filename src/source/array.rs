//! Eager array source

use std::collections::VecDeque;

use super::{SequenceSource, TransientEmpty};

/// Owns its items; later changes to the caller's collection are invisible.
#[derive(Debug, Clone)]
pub struct ArraySource<T> {
    items: VecDeque<T>,
}

impl<T> ArraySource<T> {
    /// Take ownership of `items`.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into(),
        }
    }

    /// Copy `items` so the caller keeps (and may mutate) the original.
    pub fn from_slice(items: &[T]) -> Self
    where
        T: Clone,
    {
        Self {
            items: items.iter().cloned().collect(),
        }
    }

    /// Items not yet handed out.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the source is exhausted.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> SequenceSource<T> for ArraySource<T> {
    fn produce_next(&mut self) -> Result<Option<T>, TransientEmpty> {
        Ok(self.items.pop_front())
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}
