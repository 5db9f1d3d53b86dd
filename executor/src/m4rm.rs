//! The Method of Four Russians over GF(2).
//!
//! The rows of the right operand are combined eight at a time into a table of
//! all 256 sums, built in Gray code order so that every entry costs a single
//! row addition. Each row of the left operand then selects one table row per
//! eight columns.

use blockmul_number::{Coefficient, Gf2};
use rayon::prelude::*;

use crate::{
    matrix::{check_product_dims, check_product_shape},
    Matrix, Result,
};

const WORD_BITS: usize = u64::BITS as usize;
const TABLE_BITS: usize = 8;
const TABLE_LEN: usize = 1 << TABLE_BITS;

const _: () = assert!(WORD_BITS % TABLE_BITS == 0);

const fn gray_encode(i: usize) -> usize {
    i ^ (i >> 1)
}

/// `GRAY_INDEX[g]` is the position of `g` in the Gray code sequence.
const GRAY_INDEX: [u8; TABLE_LEN] = {
    let mut index = [0; TABLE_LEN];
    let mut i = 0;
    while i < TABLE_LEN {
        index[gray_encode(i)] = i as u8;
        i += 1;
    }
    index
};

/// A GF(2) matrix with every row packed into 64-bit words. Column `c` is bit
/// `c % 64` of word `c / 64`; the bits past the last column are zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackedMatrix {
    rows: usize,
    cols: usize,
    words: usize,
    data: Vec<u64>,
}

impl PackedMatrix {
    pub fn zero(rows: usize, cols: usize) -> Self {
        let words = cols.div_ceil(WORD_BITS);
        Self {
            rows,
            cols,
            words,
            data: vec![0; rows * words],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Gf2 {
        assert!(row < self.rows && col < self.cols);
        let word = self.data[row * self.words + col / WORD_BITS];
        Gf2::new((word >> (col % WORD_BITS)) & 1 == 1)
    }

    pub fn set(&mut self, row: usize, col: usize, value: Gf2) {
        assert!(row < self.rows && col < self.cols);
        let word = &mut self.data[row * self.words + col / WORD_BITS];
        let mask = 1 << (col % WORD_BITS);
        if value.to_bool() {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    fn row(&self, row: usize) -> &[u64] {
        &self.data[row * self.words..(row + 1) * self.words]
    }

    /// The eight bits of `row` starting at column `col`, which is a multiple
    /// of eight.
    fn byte(&self, row: usize, col: usize) -> usize {
        let word = self.data[row * self.words + col / WORD_BITS];
        ((word >> (col % WORD_BITS)) & (TABLE_LEN as u64 - 1)) as usize
    }

    /// `self += lhs * rhs`
    pub fn addmul_m4rm(&mut self, lhs: &Self, rhs: &Self) -> Result<()> {
        check_product_dims((self.rows, self.cols), (lhs.rows, lhs.cols), (rhs.rows, rhs.cols))?;
        if self.words == 0 || lhs.cols == 0 {
            return Ok(());
        }
        let mut table = vec![0u64; TABLE_LEN * self.words];
        for start in (0..rhs.rows).step_by(TABLE_BITS) {
            let bits = (rhs.rows - start).min(TABLE_BITS);
            // Entry i holds the sum of the rows selected by the bits of gray_encode(i).
            for i in 1..1 << bits {
                let (done, rest) = table.split_at_mut(i * self.words);
                let prev = &done[(i - 1) * self.words..];
                let src = rhs.row(start + i.trailing_zeros() as usize);
                for ((entry, p), s) in rest[..self.words].iter_mut().zip(prev).zip(src) {
                    *entry = p ^ s;
                }
            }
            self.data
                .par_chunks_mut(self.words)
                .enumerate()
                .for_each(|(r, dst_row)| {
                    let entry = GRAY_INDEX[lhs.byte(r, start)] as usize;
                    let src = &table[entry * self.words..(entry + 1) * self.words];
                    for (d, s) in dst_row.iter_mut().zip(src) {
                        *d ^= s;
                    }
                });
        }
        Ok(())
    }
}

impl From<&Matrix<Gf2>> for PackedMatrix {
    fn from(matrix: &Matrix<Gf2>) -> Self {
        let mut packed = Self::zero(matrix.rows(), matrix.cols());
        for r in 0..matrix.rows() {
            for c in 0..matrix.cols() {
                if !matrix.get(r, c).is_zero() {
                    packed.set(r, c, Gf2::ONE);
                }
            }
        }
        packed
    }
}

impl From<&PackedMatrix> for Matrix<Gf2> {
    fn from(packed: &PackedMatrix) -> Self {
        let mut matrix = Matrix::zero(packed.rows, packed.cols);
        for r in 0..packed.rows {
            for c in 0..packed.cols {
                matrix.set(r, c, packed.get(r, c));
            }
        }
        matrix
    }
}

/// Computes `dst += lhs * rhs` by packing the operands and running
/// [`PackedMatrix::addmul_m4rm`].
pub fn addmul_m4rm(dst: &mut Matrix<Gf2>, lhs: &Matrix<Gf2>, rhs: &Matrix<Gf2>) -> Result<()> {
    check_product_shape(dst, lhs, rhs)?;
    let mut packed = PackedMatrix::from(&*dst);
    packed.addmul_m4rm(&PackedMatrix::from(lhs), &PackedMatrix::from(rhs))?;
    *dst = Matrix::from(&packed);
    Ok(())
}
