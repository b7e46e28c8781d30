//! Lazy generator source

use std::iter::Fuse;

use super::{SequenceSource, TransientEmpty};

/// Pulls one value at a time from a wrapped iterator.
///
/// The iterator is fused, so a generator that resumes after returning
/// `None` still reads as exhausted.
#[derive(Debug)]
pub struct LazySource<I: Iterator> {
    iter: Fuse<I>,
}

impl<I: Iterator> LazySource<I> {
    /// Wrap anything iterable.
    pub fn new<S>(iter: S) -> Self
    where
        S: IntoIterator<IntoIter = I>,
    {
        Self {
            iter: iter.into_iter().fuse(),
        }
    }
}

impl<I: Iterator> SequenceSource<I::Item> for LazySource<I> {
    fn produce_next(&mut self) -> Result<Option<I::Item>, TransientEmpty> {
        Ok(self.iter.next())
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}
