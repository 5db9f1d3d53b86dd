use blockmul_codegen::{Instruction, Operand, Program, Scratch, Term};
use blockmul_number::Coefficient;

use crate::{
    algo::{addmul_recurse, AddMulAlgo, Element},
    matrix::check_product_shape,
    Error, Matrix, Result,
};

/// Executes a block program on concrete matrices.
pub struct Interpreter<'a, T> {
    program: &'a Program<T>,
}

/// The three temporaries, allocated once per execution.
struct Scratches<T> {
    mk: Matrix<T>,
    kn: Matrix<T>,
    mn: Matrix<T>,
}

impl<T: Coefficient> Scratches<T> {
    fn get(&self, scratch: Scratch) -> &Matrix<T> {
        match scratch {
            Scratch::Mk => &self.mk,
            Scratch::Kn => &self.kn,
            Scratch::Mn => &self.mn,
        }
    }

    fn get_mut(&mut self, scratch: Scratch) -> &mut Matrix<T> {
        match scratch {
            Scratch::Mk => &mut self.mk,
            Scratch::Kn => &mut self.kn,
            Scratch::Mn => &mut self.mn,
        }
    }
}

impl<'a, T: Element> Interpreter<'a, T> {
    pub fn new(program: &'a Program<T>) -> Self {
        Self { program }
    }

    /// Computes `c += a * b`, where every product of blocks is delegated to
    /// `algos`.
    pub fn execute(
        &self,
        c: &mut Matrix<T>,
        a: &Matrix<T>,
        b: &Matrix<T>,
        algos: &[AddMulAlgo<T>],
    ) -> Result<()> {
        check_product_shape(c, a, b)?;
        let n = self.program.n();
        let a_blks = a.split_blocks(n)?;
        let b_blks = b.split_blocks(n)?;
        let mut c_blks = c.split_blocks(n)?;
        let (m, k) = (a.rows() / n, a.cols() / n);
        let mut scratches = Scratches {
            mk: Matrix::zero(m, k),
            kn: Matrix::zero(k, b.cols() / n),
            mn: Matrix::zero(m, b.cols() / n),
        };
        let block = |term: &Term<T>| {
            let blocks = match term.operand {
                Operand::A => &a_blks,
                Operand::B => &b_blks,
            };
            blocks
                .get(term.row)
                .and_then(|row| row.get(term.col))
                .ok_or_else(|| Error::InvalidProgram(format!("block {term} is out of bounds")))
        };

        for instruction in self.program.instructions() {
            log::trace!("{instruction}");
            match instruction {
                Instruction::Clear { scratch } => scratches.get_mut(*scratch).clear(),
                Instruction::AssignSum { dst, lhs, rhs } => {
                    let (x, y) = (block(lhs)?, block(rhs)?);
                    scratches
                        .get_mut(*dst)
                        .set_to_combination(x, lhs.coeff, y, rhs.coeff)?
                }
                Instruction::Accumulate { dst, term } => {
                    scratches.get_mut(*dst).add_scaled(block(term)?, term.coeff)?
                }
                Instruction::MultiplyAccumulate { dst, lhs, rhs } => {
                    if dst == lhs || dst == rhs {
                        return Err(Error::InvalidProgram(format!(
                            "{instruction} overwrites one of its operands"
                        )));
                    }
                    // Moved out so the operands can be borrowed alongside it.
                    let mut product =
                        std::mem::replace(scratches.get_mut(*dst), Matrix::zero(0, 0));
                    addmul_recurse(&mut product, scratches.get(*lhs), scratches.get(*rhs), algos)?;
                    *scratches.get_mut(*dst) = product;
                }
                Instruction::AccumulateIntoOutput {
                    row,
                    col,
                    src,
                    coeff,
                } => {
                    let out = c_blks
                        .get_mut(*row)
                        .and_then(|r| r.get_mut(*col))
                        .ok_or_else(|| {
                            Error::InvalidProgram(format!(
                                "output block C[{row}][{col}] is out of bounds"
                            ))
                        })?;
                    out.add_scaled(scratches.get(*src), *coeff)?
                }
            }
        }

        *c = Matrix::assemble_blocks(&c_blks)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use blockmul_codegen::generate;
    use blockmul_factorization::Factorization;
    use blockmul_number::Gf2;
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};
    use test_log::test;

    use super::*;

    #[test]
    fn naive_program_matches_direct_product() {
        let mut rng = StdRng::seed_from_u64(1);
        let program = generate(&Factorization::<i64>::naive(3));
        let a = Matrix::random(6, 9, &mut rng);
        let b = Matrix::random(9, 3, &mut rng);
        let mut expected = Matrix::random(6, 3, &mut rng);
        let mut actual = expected.clone();
        expected.addmul_naive(&a, &b).unwrap();
        Interpreter::new(&program)
            .execute(&mut actual, &a, &b, &[AddMulAlgo::Naive])
            .unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn indivisible_matrices_are_rejected() {
        let program = generate(&Factorization::<Gf2>::strassen());
        let mut c = Matrix::zero(3, 3);
        let err = Interpreter::new(&program)
            .execute(&mut c, &Matrix::zero(3, 3), &Matrix::zero(3, 3), &[AddMulAlgo::Naive])
            .unwrap_err();
        assert!(matches!(err, Error::NotDivisible { n: 2, .. }), "{err}");
    }

    #[test]
    fn aliased_product_is_rejected() {
        let program = Program::<Gf2>::new(
            1,
            1,
            vec![Instruction::MultiplyAccumulate {
                dst: Scratch::Mk,
                lhs: Scratch::Mk,
                rhs: Scratch::Kn,
            }],
        );
        let mut c = Matrix::zero(1, 1);
        let err = Interpreter::new(&program)
            .execute(&mut c, &Matrix::zero(1, 1), &Matrix::zero(1, 1), &[AddMulAlgo::Naive])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidProgram(_)), "{err}");
    }
}
