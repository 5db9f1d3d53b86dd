use rand::Rng;

use crate::traits::{Coefficient, KnownDomain};

impl Coefficient for i64 {
    const ZERO: Self = 0;
    const ONE: Self = 1;

    fn known_domain() -> KnownDomain {
        KnownDomain::Integer
    }

    fn from_dataset_value(value: i64) -> Self {
        value
    }

    /// Entries stay small so that products of large random matrices do not overflow.
    fn random<R: Rng>(rng: &mut R) -> Self {
        rng.gen_range(-3..=3)
    }
}
