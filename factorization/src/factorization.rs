use blockmul_number::{sqrt_exact, Coefficient};

use crate::{dataset::RawFactor, Error, Result, Tensor3};

/// The nonzero entries `(row, col, coefficient)` of one rank slice of a factor.
pub type Terms<'a> = &'a [(usize, usize, i64)];

/// A rank-R decomposition of the n×n matrix multiplication tensor.
///
/// All three factors have shape (n, n, R):
/// - `u[[i, j, alpha]]` is the coefficient of block A[i][j] in the left operand of product `alpha`,
/// - `v[[j, k, alpha]]` is the coefficient of block B[j][k] in the right operand of product `alpha`,
/// - `w[[i, k, alpha]]` is the coefficient with which product `alpha` contributes to C[i][k].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Factorization<T> {
    n: usize,
    rank: usize,
    u: Tensor3<T>,
    v: Tensor3<T>,
    w: Tensor3<T>,
}

impl<T: Coefficient> Factorization<T> {
    pub fn new(u: Tensor3<T>, v: Tensor3<T>, w: Tensor3<T>) -> Result<Self> {
        let [n, n2, rank] = u.shape();
        if n != n2 {
            return Err(Error::ShapeMismatch(format!(
                "first factor has non-square block shape {n}x{n2}"
            )));
        }
        for (name, factor) in [("second", &v), ("third", &w)] {
            if factor.shape() != u.shape() {
                return Err(Error::ShapeMismatch(format!(
                    "{name} factor has shape {:?}, but the first factor has shape {:?}",
                    factor.shape(),
                    u.shape()
                )));
            }
        }
        Ok(Self { n, rank, u, v, w })
    }

    /// Builds a factorization from the flattened (n², R) factors an archive
    /// stores.
    ///
    /// The archives describe the symmetrized tensor, so the third factor is
    /// indexed by C transposed. It is transposed back here so that
    /// `w[[i, k, alpha]]` refers to C[i][k].
    pub fn from_raw(raw: &[RawFactor; 3]) -> Result<Self> {
        let [a, b, c] = raw;
        if a.rows != b.rows || b.rows != c.rows {
            return Err(Error::ShapeMismatch(format!(
                "factors have {}, {} and {} rows",
                a.rows, b.rows, c.rows
            )));
        }
        if a.cols != b.cols || b.cols != c.cols {
            return Err(Error::ShapeMismatch(format!(
                "factors have ranks {}, {} and {}",
                a.cols, b.cols, c.cols
            )));
        }
        let n = sqrt_exact(a.rows).ok_or_else(|| {
            Error::MalformedFactorization(format!(
                "factor row count {} is not a perfect square",
                a.rows
            ))
        })?;
        let rank = a.cols;
        let reshape = |factor: &RawFactor| {
            Tensor3::from_vec(
                [n, n, rank],
                factor
                    .data
                    .iter()
                    .map(|v| T::from_dataset_value(*v))
                    .collect(),
            )
        };
        let w = reshape(c)?.transpose_01();
        log::debug!("Reshaped factors to {n}x{n}x{rank}");
        Self::new(reshape(a)?, reshape(b)?, w)
    }

    /// Builds a factorization from the explicit terms of every rank-one
    /// product, given in the (A, B, C) block convention.
    pub fn from_terms(n: usize, products: &[(Terms, Terms, Terms)]) -> Result<Self> {
        let rank = products.len();
        let mut factors = [(); 3].map(|_| Tensor3::zeros([n, n, rank]));
        for (alpha, (u, v, w)) in products.iter().enumerate() {
            for (factor, terms) in factors.iter_mut().zip([u, v, w]) {
                for &(row, col, value) in terms.iter() {
                    if row >= n || col >= n {
                        return Err(Error::ShapeMismatch(format!(
                            "block ({row}, {col}) of product {alpha} is outside a {n}x{n} block matrix"
                        )));
                    }
                    factor[[row, col, alpha]] = T::from_dataset_value(value);
                }
            }
        }
        let [u, v, w] = factors;
        Self::new(u, v, w)
    }

    /// The schoolbook algorithm with one product per (i, j, k) triple.
    pub fn naive(n: usize) -> Self {
        let rank = n * n * n;
        let mut u = Tensor3::zeros([n, n, rank]);
        let mut v = Tensor3::zeros([n, n, rank]);
        let mut w = Tensor3::zeros([n, n, rank]);
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    let alpha = (i * n + j) * n + k;
                    u[[i, j, alpha]] = T::ONE;
                    v[[j, k, alpha]] = T::ONE;
                    w[[i, k, alpha]] = T::ONE;
                }
            }
        }
        Self { n, rank, u, v, w }
    }

    /// Strassen's seven-product algorithm for 2x2 block matrices.
    pub fn strassen() -> Self {
        Self::from_terms(
            2,
            &[
                (&[(0, 0, 1), (1, 1, 1)], &[(0, 0, 1), (1, 1, 1)], &[(0, 0, 1), (1, 1, 1)]),
                (&[(1, 0, 1), (1, 1, 1)], &[(0, 0, 1)], &[(1, 0, 1), (1, 1, -1)]),
                (&[(0, 0, 1)], &[(0, 1, 1), (1, 1, -1)], &[(0, 1, 1), (1, 1, 1)]),
                (&[(1, 1, 1)], &[(0, 0, -1), (1, 0, 1)], &[(0, 0, 1), (1, 0, 1)]),
                (&[(0, 0, 1), (0, 1, 1)], &[(1, 1, 1)], &[(0, 0, -1), (0, 1, 1)]),
                (&[(0, 0, -1), (1, 0, 1)], &[(0, 0, 1), (0, 1, 1)], &[(1, 1, 1)]),
                (&[(0, 1, 1), (1, 1, -1)], &[(1, 0, 1), (1, 1, 1)], &[(0, 0, 1)]),
            ],
        )
        .expect("Strassen's algorithm is a valid 2x2 factorization")
    }

    /// Number of blocks per side of the matrices this factorization multiplies.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of block multiplications.
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn u(&self) -> &Tensor3<T> {
        &self.u
    }

    pub fn v(&self) -> &Tensor3<T> {
        &self.v
    }

    pub fn w(&self) -> &Tensor3<T> {
        &self.w
    }

    /// Checks the Brent equations: the factorization is a valid matrix
    /// multiplication algorithm iff for all i, j, k, l, m, p
    /// `sum_alpha u[i,j] v[k,l] w[m,p] == [j == k][i == m][l == p]`.
    pub fn satisfies_brent_equations(&self) -> bool {
        let n = self.n;
        let indices = || (0..n).flat_map(move |a| (0..n).map(move |b| (a, b)));
        indices().all(|(i, j)| {
            indices().all(|(k, l)| {
                indices().all(|(m, p)| {
                    let sum = (0..self.rank).fold(T::ZERO, |acc, alpha| {
                        acc + self.u[[i, j, alpha]] * self.v[[k, l, alpha]] * self.w[[m, p, alpha]]
                    });
                    let expected = if j == k && i == m && l == p {
                        T::ONE
                    } else {
                        T::ZERO
                    };
                    sum == expected
                })
            })
        })
    }
}
