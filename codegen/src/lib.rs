//! Turns a rank-R factorization of the n×n matrix multiplication tensor into
//! a straight-line program over n×n block matrices that uses R block
//! multiplications.

mod generator;
mod instruction;
mod program;
mod render;

pub use generator::generate;
pub use instruction::{Instruction, Operand, Scratch, Term};
pub use program::Program;
pub use render::{DecompFunction, Listing, Renderer, RustStatements};
