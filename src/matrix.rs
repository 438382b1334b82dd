//! A dense, row-major matrix for feature vectors
//!
//! Imagine the following binary feature matrix of three gene sets
//!
//! | Gene set | 8908 | 2998 | 2997 | 5507 | 2992 |
//! |:-------- | ----:| ----:| ----:| ----:| ----:|
//! | **SetA** |    1 |    1 |    1 |    0 |    0 |
//! | **SetB** |    1 |    1 |    0 |    1 |    0 |
//! | **SetC** |    0 |    1 |    1 |    0 |    1 |
//!
//! ```
//! use gsd::matrix::Matrix;
//! let data = vec![
//!     true, true, true, false, false,
//!     true, true, false, true, false,
//!     false, true, true, false, true,
//! ];
//! let m = Matrix::new(3, 5, data);
//!
//! assert_eq!(m.dim(), (3, 5));
//! assert_eq!(m.row(1), &[true, true, false, true, false]);
//! assert_eq!(m.rows().count(), 3);
//! ```
//!
//! A matrix can have rows but zero columns, e.g. when none of the gene sets
//! has any feature. Every row is then an empty slice.
use std::fmt::Debug;

/// Row-major matrix that owns its data
#[derive(Clone, PartialEq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T> Matrix<T> {
    /// Constructs a new matrix
    ///
    /// # Panics
    ///
    /// If `data` does not contain exactly `rows * cols` elements
    pub fn new(rows: usize, cols: usize, data: Vec<T>) -> Self {
        assert_eq!(rows * cols, data.len(), "matrix data does not match dimensions");
        Self { rows, cols, data }
    }

    /// Returns the number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the matrix has no cells
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the dimension of the matrix, (rows, columns)
    pub fn dim(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Returns the values of a single row
    ///
    /// # Panics
    ///
    /// If `idx` is out of bounds
    pub fn row(&self, idx: usize) -> &[T] {
        assert!(idx < self.rows, "row index out of bounds");
        &self.data[idx * self.cols..(idx + 1) * self.cols]
    }

    /// Returns an Iterator over all rows
    pub fn rows(&self) -> RowIterator<'_, T> {
        RowIterator {
            matrix: self,
            idx: 0,
        }
    }

    /// Returns all rows as a `Vec` of slices
    ///
    /// This is handy to compare rows with the pairwise engine
    pub fn row_slices(&self) -> Vec<&[T]> {
        self.rows().collect()
    }
}

impl<T: Debug> Debug for Matrix<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.rows() {
            let v: Vec<String> = row.iter().map(|v| format!("{v:?}")).collect();
            writeln!(f, "[{}]", v.join(", "))?;
        }
        Ok(())
    }
}

/// Iterates through the rows, returning a slice of each row
pub struct RowIterator<'a, T> {
    matrix: &'a Matrix<T>,
    idx: usize,
}

impl<'a, T> Iterator for RowIterator<'a, T> {
    type Item = &'a [T];
    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= self.matrix.rows {
            return None;
        }
        self.idx += 1;
        Some(self.matrix.row(self.idx - 1))
    }
}
