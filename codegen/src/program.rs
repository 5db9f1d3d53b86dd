use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{self, Display, Formatter},
};

use blockmul_number::Coefficient;
use itertools::Itertools;
use serde::Serialize;

use crate::{Instruction, Scratch};

/// A straight-line program multiplying n×n block matrices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Program<T> {
    n: usize,
    rank: usize,
    instructions: Vec<Instruction<T>>,
}

impl<T: Coefficient> Program<T> {
    pub fn new(n: usize, rank: usize, instructions: Vec<Instruction<T>>) -> Self {
        Self {
            n,
            rank,
            instructions,
        }
    }

    /// Number of blocks per side.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Rank of the factorization the program was generated from.
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn instructions(&self) -> &[Instruction<T>] {
        &self.instructions
    }

    pub fn multiplication_count(&self) -> usize {
        self.instructions
            .iter()
            .filter(|i| matches!(i, Instruction::MultiplyAccumulate { .. }))
            .count()
    }

    /// The output blocks the program writes to.
    pub fn written_outputs(&self) -> BTreeSet<(usize, usize)> {
        self.instructions
            .iter()
            .filter_map(|i| match i {
                Instruction::AccumulateIntoOutput { row, col, .. } => Some((*row, *col)),
                _ => None,
            })
            .collect()
    }

    /// Checks that every scratch block is in a defined state when it is read:
    /// operands are freshly assigned or cleared before they are accumulated
    /// into again, products are accumulated into a zero block, and only
    /// products are distributed to the output.
    pub fn validate(&self) -> Result<(), String> {
        #[derive(Clone, Copy, PartialEq, Eq, Debug)]
        enum State {
            Zero,
            Partial,
            Product,
            Consumed,
        }
        let mut states = Scratch::ALL
            .into_iter()
            .map(|s| (s, State::Zero))
            .collect::<BTreeMap<_, _>>();

        for (index, instruction) in self.instructions.iter().enumerate() {
            let error = |msg: String| Err(format!("instruction {index} ({instruction}): {msg}"));
            match instruction {
                Instruction::Clear { scratch } => {
                    states.insert(*scratch, State::Zero);
                }
                Instruction::AssignSum { dst, lhs, rhs } => {
                    if [lhs, rhs].iter().any(|t| !self.in_bounds(t.row, t.col)) {
                        return error("block out of bounds".to_string());
                    }
                    states.insert(*dst, State::Partial);
                }
                Instruction::Accumulate { dst, term } => {
                    if !self.in_bounds(term.row, term.col) {
                        return error("block out of bounds".to_string());
                    }
                    if !matches!(states[dst], State::Zero | State::Partial) {
                        return error(format!("{dst} holds a stale {:?} value", states[dst]));
                    }
                    states.insert(*dst, State::Partial);
                }
                Instruction::MultiplyAccumulate { dst, lhs, rhs } => {
                    if states[dst] != State::Zero {
                        return error(format!("{dst} is not cleared before the product"));
                    }
                    for operand in [lhs, rhs] {
                        if !matches!(states[operand], State::Zero | State::Partial) {
                            return error(format!(
                                "{operand} holds a stale {:?} value",
                                states[operand]
                            ));
                        }
                    }
                    states.insert(*lhs, State::Consumed);
                    states.insert(*rhs, State::Consumed);
                    states.insert(*dst, State::Product);
                }
                Instruction::AccumulateIntoOutput { row, col, src, .. } => {
                    if !self.in_bounds(*row, *col) {
                        return error("block out of bounds".to_string());
                    }
                    if states[src] != State::Product {
                        return error(format!("{src} does not hold a product"));
                    }
                }
            }
        }
        Ok(())
    }

    fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.n && col < self.n
    }
}

impl<T: Coefficient> Display for Program<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.instructions.iter().format("\n"))
    }
}
