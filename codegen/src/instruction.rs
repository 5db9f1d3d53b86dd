use std::fmt::{self, Display, Formatter};

use blockmul_number::Coefficient;
use serde::Serialize;

/// One of the three temporaries every program reuses across all products.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scratch {
    /// Holds the linear combination of blocks of A (M×K sized).
    Mk,
    /// Holds the linear combination of blocks of B (K×N sized).
    Kn,
    /// Holds the product of the two (M×N sized).
    Mn,
}

impl Scratch {
    pub const ALL: [Scratch; 3] = [Scratch::Mk, Scratch::Kn, Scratch::Mn];

    pub fn name(self) -> &'static str {
        match self {
            Scratch::Mk => "tmp_mk",
            Scratch::Kn => "tmp_kn",
            Scratch::Mn => "tmp_mn",
        }
    }
}

impl Display for Scratch {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An input block matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Operand {
    A,
    B,
}

/// A block of an input matrix, scaled by a coefficient.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Term<T> {
    pub operand: Operand,
    pub row: usize,
    pub col: usize,
    pub coeff: T,
}

impl<T: Coefficient> Display for Term<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Term {
            operand, row, col, ..
        } = self;
        write!(f, "{}{operand:?}[{row}][{col}]", coeff_prefix(self.coeff))
    }
}

/// A block operation. Programs are sequences of these; the order encodes the
/// data dependencies between the scratch blocks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction<T> {
    /// Sets a scratch block to zero.
    Clear { scratch: Scratch },
    /// Overwrites a scratch block with the sum of two terms.
    AssignSum {
        dst: Scratch,
        lhs: Term<T>,
        rhs: Term<T>,
    },
    /// Adds a term to a scratch block.
    Accumulate { dst: Scratch, term: Term<T> },
    /// `dst += lhs * rhs`, the only block multiplication.
    MultiplyAccumulate {
        dst: Scratch,
        lhs: Scratch,
        rhs: Scratch,
    },
    /// `C[row][col] += coeff * src`.
    AccumulateIntoOutput {
        row: usize,
        col: usize,
        src: Scratch,
        coeff: T,
    },
}

impl<T: Coefficient> Display for Instruction<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Clear { scratch } => write!(f, "{scratch} = 0"),
            Instruction::AssignSum { dst, lhs, rhs } => write!(f, "{dst} = {lhs} + {rhs}"),
            Instruction::Accumulate { dst, term } => write!(f, "{dst} += {term}"),
            Instruction::MultiplyAccumulate { dst, lhs, rhs } => {
                write!(f, "{dst} += {lhs} * {rhs}")
            }
            Instruction::AccumulateIntoOutput {
                row,
                col,
                src,
                coeff,
            } => write!(f, "C[{row}][{col}] += {}{src}", coeff_prefix(*coeff)),
        }
    }
}

fn coeff_prefix<T: Coefficient>(coeff: T) -> String {
    if coeff.is_one() {
        String::new()
    } else {
        format!("{coeff}*")
    }
}
