//! Owned dense square matrix, the shape every state file stores.

use std::ops::Index;

use crate::error::{NnsError, Result};

/// Dense square matrix, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    size: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> Matrix<T> {
    /// Create a `size` x `size` matrix filled with `T::default()`.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            data: vec![T::default(); size * size],
        }
    }

    /// Build from a flat row-major buffer of exactly `size * size` values.
    pub fn from_row_major(size: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != size * size {
            return Err(NnsError::ShapeMismatch(format!(
                "{} values cannot fill a {}x{} matrix",
                data.len(),
                size,
                size
            )));
        }
        Ok(Self { size, data })
    }

    /// Build from nested rows. Every row must have as many entries as there are rows.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let size = rows.len();
        let mut data = Vec::with_capacity(size * size);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(NnsError::ShapeMismatch(format!(
                    "row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    size
                )));
            }
            data.extend(row);
        }
        Ok(Self { size, data })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row < self.size && col < self.size {
            Some(self.data[row * self.size + col])
        } else {
            None
        }
    }

    /// Overwrite one entry. Returns `false` when out of bounds.
    pub fn set(&mut self, row: usize, col: usize, value: T) -> bool {
        if row < self.size && col < self.size {
            self.data[row * self.size + col] = value;
            true
        } else {
            false
        }
    }

    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.size..(row + 1) * self.size]
    }

    /// Flat row-major view of the whole matrix.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Restrict the matrix to the given indices, keeping their order.
    pub fn select(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * indices.len());
        for &i in indices {
            let row = self.row(i);
            data.extend(indices.iter().map(|&j| row[j]));
        }
        Self {
            size: indices.len(),
            data,
        }
    }

    /// First off-diagonal `(i, j)` where `same(m[i][j], m[j][i])` does not hold.
    pub fn find_asymmetry(&self, same: impl Fn(T, T) -> bool) -> Option<(usize, usize)> {
        for i in 0..self.size {
            for j in (i + 1)..self.size {
                if !same(self[(i, j)], self[(j, i)]) {
                    return Some((i, j));
                }
            }
        }
        None
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        assert!(
            row < self.size && col < self.size,
            "index ({row}, {col}) out of bounds for {0}x{0} matrix",
            self.size
        );
        &self.data[row * self.size + col]
    }
}
