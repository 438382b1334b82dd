use std::ops::Index;

use crate::distance::{condensed_index, n_comparisons};
use crate::matrix::Matrix;
use crate::{GsdError, GsdResult};

/// Pairwise distances of `n` items in condensed form
///
/// Only the upper triangle of the symmetric distance matrix is stored,
/// row by row: `(0,1), (0,2), …, (0,n−1), (1,2), …, (n−2,n−1)`.
/// This is the same layout as the standard condensed distance vectors
/// used by hierarchical clustering libraries.
///
/// Pairs that could not be compared hold [`crate::UNDEFINED_DISTANCE`] (NaN).
///
/// # Examples
///
/// ```
/// use gsd::Condensed;
///
/// let d = Condensed::new(3, vec![0.5, 0.5, 0.8]).unwrap();
/// assert_eq!(d.n_items(), 3);
/// assert_eq!(d.get(0, 2), 0.5);
/// assert_eq!(d.get(2, 1), 0.8);
/// assert_eq!(d.get(1, 1), 0.0);
///
/// let square = d.to_square();
/// assert_eq!(square.row(2), &[0.5, 0.8, 0.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Condensed {
    n: usize,
    values: Vec<f64>,
}

impl Condensed {
    /// Constructs a condensed matrix of `n` items
    ///
    /// # Errors
    ///
    /// [`GsdError::InvalidLength`] if `values` does not contain exactly `n·(n−1)/2` elements
    pub fn new(n: usize, values: Vec<f64>) -> GsdResult<Self> {
        let expected = n_comparisons(n);
        if values.len() != expected {
            return Err(GsdError::InvalidLength {
                expected,
                found: values.len(),
            });
        }
        Ok(Self { n, values })
    }

    /// Returns the number of compared items
    pub fn n_items(&self) -> usize {
        self.n
    }

    /// Returns the number of pairwise distances
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no pairwise distances
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the distances in condensed order
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Returns an Iterator of the distances in condensed order
    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.values.iter()
    }

    /// Returns an Iterator of `((i, j), distance)` in condensed order
    pub fn pairs(&self) -> impl Iterator<Item = ((usize, usize), f64)> + '_ {
        (0..self.n)
            .flat_map(move |i| (i + 1..self.n).map(move |j| (i, j)))
            .zip(self.values.iter().copied())
    }

    /// Returns the distance between item `i` and item `j`
    ///
    /// The order of `i` and `j` does not matter and the distance
    /// of an item to itself is `0`.
    ///
    /// # Panics
    ///
    /// If `i` or `j` is out of bounds
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.n && j < self.n, "index out of bounds");
        match i.cmp(&j) {
            std::cmp::Ordering::Equal => 0.0,
            std::cmp::Ordering::Less => self.values[condensed_index(self.n, i, j)],
            std::cmp::Ordering::Greater => self.values[condensed_index(self.n, j, i)],
        }
    }

    /// Returns the number of undefined (NaN) distances
    pub fn count_undefined(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }

    /// Expands the distances into a full, symmetric `n × n` matrix
    pub fn to_square(&self) -> Matrix<f64> {
        let mut data = Vec::with_capacity(self.n * self.n);
        for i in 0..self.n {
            for j in 0..self.n {
                data.push(self.get(i, j));
            }
        }
        Matrix::new(self.n, self.n, data)
    }

    /// Returns the underlying `Vec` of distances
    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }
}

impl Index<usize> for Condensed {
    type Output = f64;
    fn index(&self, index: usize) -> &Self::Output {
        &self.values[index]
    }
}

impl<'a> IntoIterator for &'a Condensed {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
