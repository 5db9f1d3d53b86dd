//! Execution of generated block programs on dense matrices.

#![deny(clippy::print_stdout)]

mod algo;
mod error;
mod interpreter;
mod m4rm;
mod matrix;
mod verify;

pub use algo::{addmul, addmul_recurse, addmul_with_base, plan, AddMulAlgo, Element};
pub use error::{Error, Result};
pub use interpreter::Interpreter;
pub use m4rm::{addmul_m4rm, PackedMatrix};
pub use matrix::Matrix;
pub use verify::verify;
