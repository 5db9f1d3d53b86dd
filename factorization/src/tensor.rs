use std::ops::{Index, IndexMut};

use blockmul_number::Coefficient;

use crate::{Error, Result};

/// A dense three-dimensional array of fixed shape, stored in row-major order.
/// Every access is bounds-checked against the shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tensor3<T> {
    shape: [usize; 3],
    data: Vec<T>,
}

impl<T: Coefficient> Tensor3<T> {
    pub fn zeros(shape: [usize; 3]) -> Self {
        Self {
            shape,
            data: vec![T::ZERO; shape.iter().product()],
        }
    }

    pub fn from_vec(shape: [usize; 3], data: Vec<T>) -> Result<Self> {
        let expected = shape.iter().product::<usize>();
        if data.len() != expected {
            return Err(Error::ShapeMismatch(format!(
                "{} values do not fill a tensor of shape {shape:?} ({expected} values)",
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn get(&self, index: [usize; 3]) -> Option<T> {
        self.offset(index).map(|o| self.data[o])
    }

    /// Swaps the first two axes.
    pub fn transpose_01(&self) -> Self {
        let [d0, d1, d2] = self.shape;
        let mut result = Self::zeros([d1, d0, d2]);
        for i in 0..d0 {
            for j in 0..d1 {
                for k in 0..d2 {
                    result[[j, i, k]] = self[[i, j, k]];
                }
            }
        }
        result
    }

    /// Iterates over the nonzero entries `(i, j, value)` of the slice at
    /// position `k` of the last axis, `i` outer and `j` inner.
    pub fn nonzero_in_slice(&self, k: usize) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        let [d0, d1, d2] = self.shape;
        assert!(k < d2, "slice {k} out of bounds for tensor of shape {:?}", self.shape);
        (0..d0)
            .flat_map(move |i| (0..d1).map(move |j| (i, j)))
            .map(move |(i, j)| (i, j, self.data[(i * d1 + j) * d2 + k]))
            .filter(|(_, _, value)| !value.is_zero())
    }

    fn offset(&self, [i, j, k]: [usize; 3]) -> Option<usize> {
        let [d0, d1, d2] = self.shape;
        (i < d0 && j < d1 && k < d2).then(|| (i * d1 + j) * d2 + k)
    }
}

impl<T: Coefficient> Index<[usize; 3]> for Tensor3<T> {
    type Output = T;

    fn index(&self, index: [usize; 3]) -> &T {
        match self.offset(index) {
            Some(o) => &self.data[o],
            None => panic!(
                "index {index:?} out of bounds for tensor of shape {:?}",
                self.shape
            ),
        }
    }
}

impl<T: Coefficient> IndexMut<[usize; 3]> for Tensor3<T> {
    fn index_mut(&mut self, index: [usize; 3]) -> &mut T {
        match self.offset(index) {
            Some(o) => &mut self.data[o],
            None => panic!(
                "index {index:?} out of bounds for tensor of shape {:?}",
                self.shape
            ),
        }
    }
}

#[cfg(test)]
mod test {
    use blockmul_number::Gf2;
    use pretty_assertions::assert_eq;

    use super::*;

    fn counting(shape: [usize; 3]) -> Tensor3<i64> {
        let len = shape.iter().product::<usize>() as i64;
        Tensor3::from_vec(shape, (0..len).collect()).unwrap()
    }

    #[test]
    fn row_major_layout() {
        let t = counting([2, 3, 4]);
        assert_eq!(t[[0, 0, 0]], 0);
        assert_eq!(t[[0, 0, 3]], 3);
        assert_eq!(t[[0, 1, 0]], 4);
        assert_eq!(t[[1, 0, 0]], 12);
        assert_eq!(t.get([1, 2, 3]), Some(23));
        assert_eq!(t.get([2, 0, 0]), None);
        assert_eq!(t.get([0, 3, 0]), None);
        assert_eq!(t.get([0, 0, 4]), None);
    }

    #[test]
    fn wrong_length() {
        assert!(matches!(
            Tensor3::<i64>::from_vec([2, 2, 2], vec![0; 7]),
            Err(Error::ShapeMismatch(_))
        ));
    }

    #[test]
    #[should_panic = "out of bounds"]
    fn index_out_of_bounds() {
        let t = counting([2, 2, 2]);
        let _ = t[[2, 0, 0]];
    }

    #[test]
    fn transpose() {
        let t = counting([2, 3, 2]);
        let tt = t.transpose_01();
        assert_eq!(tt.shape(), [3, 2, 2]);
        for i in 0..2 {
            for j in 0..3 {
                for k in 0..2 {
                    assert_eq!(t[[i, j, k]], tt[[j, i, k]]);
                }
            }
        }
        assert_eq!(tt.transpose_01(), t);
    }

    #[test]
    fn nonzero_scan_is_row_major() {
        let mut t = Tensor3::<Gf2>::zeros([2, 2, 2]);
        t[[1, 0, 1]] = Gf2::ONE;
        t[[0, 1, 1]] = Gf2::ONE;
        t[[1, 1, 1]] = Gf2::ONE;
        t[[0, 0, 0]] = Gf2::ONE;
        let scan = t
            .nonzero_in_slice(1)
            .map(|(i, j, _)| (i, j))
            .collect::<Vec<_>>();
        assert_eq!(scan, vec![(0, 1), (1, 0), (1, 1)]);
        assert_eq!(t.nonzero_in_slice(0).count(), 1);
    }
}
