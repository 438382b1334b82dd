//! Utility structs and methods
use std::cmp::Ordering::{Equal, Less};

/// Iterator of all one-way pairwise combinations of the inner slice
///
/// The pairs are yielded in the canonical order of a condensed
/// distance matrix: `(0,1), (0,2), …, (0,n−1), (1,2), …, (n−2,n−1)`.
///
/// # Examples
/// ```
/// use gsd::utils::Combinations;
///
/// let a = [1, 2, 3];
/// let mut c = Combinations::new(&a);
///
/// assert_eq!(c.next(), Some((&1, &2)));
/// assert_eq!(c.next(), Some((&1, &3)));
/// assert_eq!(c.next(), Some((&2, &3)));
/// assert!(c.next().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Combinations<'a, T> {
    inner: &'a [T],
    idx1: usize,
    idx2: usize,
}

impl<'a, T> Combinations<'a, T> {
    /// Creates a new Combinations iterator
    pub fn new(inner: &'a [T]) -> Self {
        Self {
            inner,
            idx1: 0,
            idx2: 1,
        }
    }

    fn remaining(&self) -> usize {
        let n = self.inner.len();
        if self.idx1 >= n {
            return 0;
        }
        // the rest of the current row, plus all pairs of the following items
        let current = n.saturating_sub(self.idx2);
        let following = n - self.idx1 - 1;
        current + following * following.saturating_sub(1) / 2
    }
}

impl<'a, T> Iterator for Combinations<'a, T> {
    type Item = (&'a T, &'a T);
    fn next(&mut self) -> Option<Self::Item> {
        match (
            self.idx1 < self.inner.len(),
            self.idx2.cmp(&self.inner.len()),
        ) {
            (true, Less) => {
                self.idx2 += 1;
                Some((&self.inner[self.idx1], &self.inner[self.idx2 - 1]))
            }
            (true, Equal) => {
                self.idx1 += 1;
                self.idx2 = self.idx1 + 1;
                self.next()
            }
            _ => None,
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl<T> ExactSizeIterator for Combinations<'_, T> {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn combinations() {
        let a = vec![1, 2, 3, 4];
        let mut c = Combinations::new(&a);
        assert_eq!(c.len(), 6);
        assert_eq!(c.next(), Some((&1, &2)));
        assert_eq!(c.next(), Some((&1, &3)));
        assert_eq!(c.next(), Some((&1, &4)));
        assert_eq!(c.len(), 3);
        assert_eq!(c.next(), Some((&2, &3)));
        assert_eq!(c.next(), Some((&2, &4)));
        assert_eq!(c.next(), Some((&3, &4)));
        assert_eq!(c.len(), 0);
        assert_eq!(c.next(), None);
    }

    #[test]
    fn combinations_empty() {
        let a: Vec<usize> = vec![];
        let mut c = Combinations::new(&a);
        assert_eq!(c.len(), 0);
        assert_eq!(c.next(), None);
    }

    #[test]
    fn combinations_single() {
        let a = vec![1];
        let mut c = Combinations::new(&a);
        assert_eq!(c.len(), 0);
        assert_eq!(c.next(), None);
    }

    #[test]
    fn combinations_two() {
        let a = vec![1, 2];
        let mut c = Combinations::new(&a);
        assert_eq!(c.next(), Some((&1, &2)));
        assert_eq!(c.next(), None);
    }
}
