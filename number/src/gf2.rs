use std::{fmt, ops::*};

use rand::Rng;
use serde::{Serialize, Serializer};

use crate::traits::{Coefficient, KnownDomain};

/// An element of GF(2). Addition is xor, multiplication is and.
#[derive(Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord, Hash)]
pub struct Gf2(bool);

impl Gf2 {
    pub const fn new(bit: bool) -> Self {
        Self(bit)
    }

    pub fn to_bool(self) -> bool {
        self.0
    }
}

impl From<bool> for Gf2 {
    fn from(bit: bool) -> Self {
        Self(bit)
    }
}

impl Add for Gf2 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 ^ other.0)
    }
}

impl AddAssign for Gf2 {
    fn add_assign(&mut self, other: Self) {
        self.0 ^= other.0;
    }
}

impl Sub for Gf2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0 ^ other.0)
    }
}

impl Mul for Gf2 {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }
}

impl Neg for Gf2 {
    type Output = Self;

    fn neg(self) -> Self {
        self
    }
}

impl fmt::Display for Gf2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(self.0))
    }
}

impl fmt::Debug for Gf2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for Gf2 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(self.0))
    }
}

impl Coefficient for Gf2 {
    const ZERO: Self = Gf2(false);
    const ONE: Self = Gf2(true);

    fn known_domain() -> KnownDomain {
        KnownDomain::Gf2
    }

    fn from_dataset_value(value: i64) -> Self {
        Self(value.rem_euclid(2) == 1)
    }

    fn random<R: Rng>(rng: &mut R) -> Self {
        Self(rng.gen())
    }
}
