//! Rank decompositions of the matrix multiplication tensor and the keyed
//! archives (`.npz` or JSON) they are distributed in.

mod dataset;
mod error;
mod factorization;
mod key;
mod tensor;

pub use dataset::{Dataset, RawFactor, DEFAULT_DATASET};
pub use error::{Error, Result};
pub use factorization::{Factorization, Terms};
pub use key::ShapeKey;
pub use tensor::Tensor3;
