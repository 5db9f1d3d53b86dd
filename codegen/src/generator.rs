use blockmul_factorization::{Factorization, Tensor3};
use blockmul_number::Coefficient;

use crate::{Instruction, Operand, Program, Scratch, Term};

/// Generates the block program of a factorization.
///
/// For every product `alpha` the program forms the linear combination of
/// blocks of A in `tmp_mk` and of blocks of B in `tmp_kn`, multiplies them
/// into a cleared `tmp_mn` and adds `tmp_mn` to every output block the third
/// factor selects. Blocks are always visited row by row.
pub fn generate<T: Coefficient>(factorization: &Factorization<T>) -> Program<T> {
    let n = factorization.n();
    let rank = factorization.rank();
    log::info!("Generating program for {n}x{n} block matrices with {rank} block products");

    let mut instructions = vec![];
    for alpha in 0..rank {
        let start = instructions.len();
        accumulate_operand(&mut instructions, Scratch::Mk, Operand::A, factorization.u(), alpha);
        accumulate_operand(&mut instructions, Scratch::Kn, Operand::B, factorization.v(), alpha);
        if alpha != 0 {
            instructions.push(Instruction::Clear {
                scratch: Scratch::Mn,
            });
        }
        instructions.push(Instruction::MultiplyAccumulate {
            dst: Scratch::Mn,
            lhs: Scratch::Mk,
            rhs: Scratch::Kn,
        });
        instructions.extend(factorization.w().nonzero_in_slice(alpha).map(
            |(row, col, coeff)| Instruction::AccumulateIntoOutput {
                row,
                col,
                src: Scratch::Mn,
                coeff,
            },
        ));
        log::debug!("Product {alpha}: {} instructions", instructions.len() - start);
    }
    log::info!("Generated {} instructions", instructions.len());
    Program::new(n, rank, instructions)
}

/// Emits the instructions that leave the combination of `operand` blocks
/// selected by `factor[.., .., alpha]` in `dst`.
fn accumulate_operand<T: Coefficient>(
    instructions: &mut Vec<Instruction<T>>,
    dst: Scratch,
    operand: Operand,
    factor: &Tensor3<T>,
    alpha: usize,
) {
    let mut terms = factor
        .nonzero_in_slice(alpha)
        .map(|(row, col, coeff)| Term {
            operand,
            row,
            col,
            coeff,
        });
    match (terms.next(), terms.next()) {
        (Some(lhs), Some(rhs)) => instructions.push(Instruction::AssignSum { dst, lhs, rhs }),
        (first, _) => {
            // Without an assignment, the previous product's value is still there.
            if alpha != 0 {
                instructions.push(Instruction::Clear { scratch: dst });
            }
            instructions.extend(first.map(|term| Instruction::Accumulate { dst, term }));
        }
    }
    instructions.extend(terms.map(|term| Instruction::Accumulate { dst, term }));
}
