use std::{fmt, hash::Hash, ops::*};

use rand::Rng;
use serde::Serialize;

/// The coefficient domains blockmul knows how to load and execute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KnownDomain {
    /// The two-element field, as used by `factorizations_f2.npz`.
    Gf2,
    /// The integers, as used by `factorizations_r.npz`.
    Integer,
}

impl fmt::Display for KnownDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnownDomain::Gf2 => write!(f, "GF(2)"),
            KnownDomain::Integer => write!(f, "Z"),
        }
    }
}

/// An element of the ring the factor coefficients and the matrix entries live in.
pub trait Coefficient:
    Copy
    + Eq
    + Hash
    + Default
    + fmt::Debug
    + fmt::Display
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + Serialize
    + Send
    + Sync
    + 'static
{
    const ZERO: Self;
    const ONE: Self;

    fn known_domain() -> KnownDomain;

    /// Maps an integer entry of a stored factorization into the domain.
    fn from_dataset_value(value: i64) -> Self;

    fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    fn is_one(&self) -> bool {
        *self == Self::ONE
    }

    /// Samples an element, used to build random test matrices.
    fn random<R: Rng>(rng: &mut R) -> Self;
}
