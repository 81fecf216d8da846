use core::{fmt, iter::FusedIterator, ptr};

use super::OptArr;
use crate::collections::ReserveStrategy;

/// An iterator that moves slots out of an [`OptArr`].
///
/// Yielded slots are replaced by the empty sentinel, so the array backing the
/// iterator stays fully initialized and releases any un-yielded elements when
/// the iterator is dropped.
pub struct IntoIter<T, R: ReserveStrategy> {
    arr: OptArr<T, R>,
    front: usize,
}

impl<T, R: ReserveStrategy> IntoIter<T, R> {
    pub(super) fn new(arr: OptArr<T, R>) -> Self {
        Self { arr, front: 0 }
    }

    /// The remaining slots as a slice.
    pub fn as_slice(&self) -> &[Option<T>] {
        &self.arr.as_slice()[self.front..]
    }
}

impl<T: fmt::Debug, R: ReserveStrategy> fmt::Debug for IntoIter<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntoIter").field(&self.as_slice()).finish()
    }
}

impl<T, R: ReserveStrategy> Iterator for IntoIter<T, R> {
    type Item = Option<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.arr.len() {
            return None;
        }

        // SAFETY: the slot at `front` is a live logical slot, and the
        // sentinel takes its place.
        let slot = unsafe { ptr::replace(self.arr.as_mut_ptr().add(self.front), None) };
        self.front += 1;
        Some(slot)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.arr.len() - self.front;
        (remaining, Some(remaining))
    }

    fn count(self) -> usize {
        self.len()
    }
}

impl<T, R: ReserveStrategy> DoubleEndedIterator for IntoIter<T, R> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.arr.len() {
            return None;
        }
        self.arr.pop_back()
    }
}

impl<T, R: ReserveStrategy> ExactSizeIterator for IntoIter<T, R> {}
impl<T, R: ReserveStrategy> FusedIterator for IntoIter<T, R> {}
