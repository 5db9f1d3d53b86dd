use std::{fmt, str::FromStr};

use itertools::Itertools;

use crate::Error;

/// The dimension triple `m,k,n` an archive entry is stored under: the
/// factorization multiplies an m×k by a k×n matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeKey {
    pub m: usize,
    pub k: usize,
    pub n: usize,
}

impl ShapeKey {
    pub fn square(n: usize) -> Self {
        Self { m: n, k: n, n }
    }

    /// Returns the block count per side if all three dimensions agree.
    pub fn square_dim(&self) -> Option<usize> {
        (self.m == self.k && self.k == self.n).then_some(self.n)
    }
}

impl FromStr for ShapeKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let dims = s
            .split(',')
            .map(|d| d.trim().parse::<usize>().ok().filter(|d| *d > 0))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| Error::InvalidKey(s.to_string()))?;
        let Some((m, k, n)) = dims.into_iter().collect_tuple() else {
            return Err(Error::InvalidKey(s.to_string()));
        };
        Ok(Self { m, k, n })
    }
}

impl fmt::Display for ShapeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.m, self.k, self.n)
    }
}
