use blockmul_number::Coefficient;
use itertools::Itertools;
use rand::Rng;
use rayon::prelude::*;

use crate::{Error, Result};

/// A dense matrix stored in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Coefficient> Matrix<T> {
    pub fn zero(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![T::ZERO; rows * cols],
        }
    }

    pub fn random<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Self {
        Self {
            rows,
            cols,
            data: (0..rows * cols).map(|_| T::random(rng)).collect(),
        }
    }

    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some(row) = rows.iter().position(|r| r.len() != cols) {
            return Err(Error::DimensionMismatch(format!(
                "row {row} has {} entries, the first row has {cols}",
                rows[row].len()
            )));
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data: rows.concat(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> T {
        assert!(row < self.rows && col < self.cols);
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) {
        assert!(row < self.rows && col < self.cols);
        self.data[row * self.cols + col] = value;
    }

    pub fn clear(&mut self) {
        self.data.fill(T::ZERO);
    }

    /// `self += other`
    pub fn add_assign(&mut self, other: &Self) -> Result<()> {
        self.check_same_shape(other)?;
        for (x, y) in self.data.iter_mut().zip(&other.data) {
            *x += *y;
        }
        Ok(())
    }

    /// `self += coeff * other`
    pub fn add_scaled(&mut self, other: &Self, coeff: T) -> Result<()> {
        if coeff.is_one() {
            return self.add_assign(other);
        }
        self.check_same_shape(other)?;
        for (x, y) in self.data.iter_mut().zip(&other.data) {
            *x += coeff * *y;
        }
        Ok(())
    }

    /// `self = c * x + d * y`
    pub fn set_to_combination(&mut self, x: &Self, c: T, y: &Self, d: T) -> Result<()> {
        self.check_same_shape(x)?;
        self.check_same_shape(y)?;
        for ((z, x), y) in self.data.iter_mut().zip(&x.data).zip(&y.data) {
            *z = c * *x + d * *y;
        }
        Ok(())
    }

    /// `self += lhs * rhs` by the schoolbook method, one output row per task.
    pub fn addmul_naive(&mut self, lhs: &Self, rhs: &Self) -> Result<()> {
        check_product_shape(self, lhs, rhs)?;
        let (k, n) = (lhs.cols, rhs.cols);
        if n == 0 {
            return Ok(());
        }
        self.data
            .par_chunks_mut(n)
            .zip(lhs.data.par_chunks(k.max(1)))
            .for_each(|(dst_row, lhs_row)| {
                for (a, rhs_row) in lhs_row.iter().zip(rhs.data.chunks(n)) {
                    if a.is_zero() {
                        continue;
                    }
                    for (c, b) in dst_row.iter_mut().zip(rhs_row) {
                        *c += *a * *b;
                    }
                }
            });
        Ok(())
    }

    /// Splits the matrix into an n×n grid of equally sized blocks, indexed
    /// `[block_row][block_col]`.
    pub fn split_blocks(&self, n: usize) -> Result<Vec<Vec<Self>>> {
        if n == 0 || self.rows % n != 0 || self.cols % n != 0 {
            return Err(Error::NotDivisible {
                rows: self.rows,
                cols: self.cols,
                n,
            });
        }
        let (block_rows, block_cols) = (self.rows / n, self.cols / n);
        Ok((0..n)
            .map(|bi| {
                (0..n)
                    .map(|bj| {
                        let data = (0..block_rows)
                            .flat_map(|r| {
                                let start = (bi * block_rows + r) * self.cols + bj * block_cols;
                                self.data[start..start + block_cols].iter().copied()
                            })
                            .collect();
                        Self {
                            rows: block_rows,
                            cols: block_cols,
                            data,
                        }
                    })
                    .collect()
            })
            .collect())
    }

    /// The inverse of [`Matrix::split_blocks`].
    pub fn assemble_blocks(blocks: &[Vec<Self>]) -> Result<Self> {
        let Some(first_row) = blocks.first() else {
            return Ok(Self::zero(0, 0));
        };
        let row_heights = blocks
            .iter()
            .map(|row| {
                row.iter().map(|b| b.rows).all_equal_value().map_err(|_| {
                    Error::DimensionMismatch("blocks of one row differ in height".into())
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let col_widths = first_row.iter().map(|b| b.cols).collect_vec();
        if blocks
            .iter()
            .any(|row| !row.iter().map(|b| b.cols).eq(col_widths.iter().copied()))
        {
            return Err(Error::DimensionMismatch(
                "blocks of one column differ in width".into(),
            ));
        }
        let cols = col_widths.iter().sum();
        let mut data = Vec::with_capacity(row_heights.iter().sum::<usize>() * cols);
        for (row, height) in blocks.iter().zip(&row_heights) {
            for r in 0..*height {
                for block in row {
                    data.extend_from_slice(&block.data[r * block.cols..(r + 1) * block.cols]);
                }
            }
        }
        Ok(Self {
            rows: row_heights.iter().sum(),
            cols,
            data,
        })
    }

    /// Extends the matrix with zero rows and columns to the given size.
    pub fn padded(&self, rows: usize, cols: usize) -> Self {
        assert!(rows >= self.rows && cols >= self.cols);
        self.resized(rows, cols)
    }

    /// The top left `rows`×`cols` corner of the matrix.
    pub fn truncated(&self, rows: usize, cols: usize) -> Self {
        assert!(rows <= self.rows && cols <= self.cols);
        self.resized(rows, cols)
    }

    fn resized(&self, rows: usize, cols: usize) -> Self {
        let mut result = Self::zero(rows, cols);
        let width = cols.min(self.cols);
        for r in 0..rows.min(self.rows) {
            result.data[r * cols..r * cols + width]
                .copy_from_slice(&self.data[r * self.cols..r * self.cols + width]);
        }
        result
    }

    fn check_same_shape(&self, other: &Self) -> Result<()> {
        if (self.rows, self.cols) != (other.rows, other.cols) {
            return Err(Error::DimensionMismatch(format!(
                "{}x{} and {}x{} matrices",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        Ok(())
    }
}

/// Checks that `dst += lhs * rhs` is well-formed.
pub(crate) fn check_product_shape<T>(
    dst: &Matrix<T>,
    lhs: &Matrix<T>,
    rhs: &Matrix<T>,
) -> Result<()> {
    check_product_dims((dst.rows, dst.cols), (lhs.rows, lhs.cols), (rhs.rows, rhs.cols))
}

/// [`check_product_shape`] on `(rows, cols)` pairs.
pub(crate) fn check_product_dims(
    dst: (usize, usize),
    lhs: (usize, usize),
    rhs: (usize, usize),
) -> Result<()> {
    if lhs.1 != rhs.0 || dst.0 != lhs.0 || dst.1 != rhs.1 {
        return Err(Error::DimensionMismatch(format!(
            "cannot add the product of {}x{} and {}x{} matrices to a {}x{} matrix",
            lhs.0, lhs.1, rhs.0, rhs.1, dst.0, dst.1
        )));
    }
    Ok(())
}
