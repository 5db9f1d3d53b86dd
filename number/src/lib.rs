//! Coefficient domains used across blockmul

mod gf2;
mod integer;
mod traits;

use num_integer::Roots;

pub use gf2::Gf2;
pub use traits::{Coefficient, KnownDomain};

/// Returns `Some(r)` if `n == r * r` and `None` otherwise.
pub fn sqrt_exact(n: usize) -> Option<usize> {
    let r = n.sqrt();
    (r * r == n).then_some(r)
}
