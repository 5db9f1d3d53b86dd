use blockmul_number::Coefficient;
use itertools::Itertools;

use crate::{Instruction, Operand, Program, Term};

/// Renders a program as text.
pub trait Renderer<T: Coefficient> {
    fn render(&self, program: &Program<T>) -> String;
}

/// One line per instruction, in the notation of [`Instruction`]'s `Display`.
pub struct Listing;

impl<T: Coefficient> Renderer<T> for Listing {
    fn render(&self, program: &Program<T>) -> String {
        format!("{program}\n")
    }
}

/// Rust statements against the block matrix API: blocks are `a_blks[i][j]`,
/// `b_blks[j][k]` and `c_blks[i][k]`, the scratch blocks are `tmp_mk`,
/// `tmp_kn` and `tmp_mn`, and products recurse through
/// `addmul_recurse(&mut dst, &lhs, &rhs, &algos)`.
pub struct RustStatements;

impl<T: Coefficient> Renderer<T> for RustStatements {
    fn render(&self, program: &Program<T>) -> String {
        program
            .instructions()
            .iter()
            .map(|i| format!("{}\n", format_statement(i)))
            .collect()
    }
}

/// The statements wrapped into a `decomp_fn!` invocation that defines the
/// function `name`.
pub struct DecompFunction {
    pub name: String,
}

impl<T: Coefficient> Renderer<T> for DecompFunction {
    fn render(&self, program: &Program<T>) -> String {
        let n = program.n();
        let body = program
            .instructions()
            .iter()
            .map(|i| format!("    {}", format_statement(i)))
            .format("\n");
        format!(
            r#"// Rank-{rank} algorithm for {n}x{n} block matrices.
use crate::decomp_macro::decomp_fn;

decomp_fn!({name}, {n}, |a_blks, b_blks, c_blks, tmp_mk, tmp_mn, tmp_kn, algos| {{
{body}
}});
"#,
            rank = program.rank(),
            name = self.name,
        )
    }
}

fn format_statement<T: Coefficient>(instruction: &Instruction<T>) -> String {
    match instruction {
        Instruction::Clear { scratch } => format!("{scratch}.clear();"),
        Instruction::AssignSum { dst, lhs, rhs } => {
            if lhs.coeff.is_one() && rhs.coeff.is_one() {
                format!(
                    "{dst}.set_to_sum_unchecked(&{}, &{});",
                    format_block(lhs),
                    format_block(rhs)
                )
            } else {
                format!(
                    "{dst}.set_to_combination_unchecked(&{}, {}, &{}, {});",
                    format_block(lhs),
                    lhs.coeff,
                    format_block(rhs),
                    rhs.coeff
                )
            }
        }
        Instruction::Accumulate { dst, term } => {
            format_add(dst.name(), &format_block(term), term.coeff)
        }
        Instruction::MultiplyAccumulate { dst, lhs, rhs } => {
            format!("addmul_recurse(&mut {dst}, &{lhs}, &{rhs}, &algos);")
        }
        Instruction::AccumulateIntoOutput {
            row,
            col,
            src,
            coeff,
        } => format_add(&format!("c_blks[{row}][{col}]"), src.name(), *coeff),
    }
}

fn format_add<T: Coefficient>(dst: &str, src: &str, coeff: T) -> String {
    if coeff.is_one() {
        format!("{dst}.add_unchecked(&{src});")
    } else {
        format!("{dst}.add_scaled_unchecked(&{src}, {coeff});")
    }
}

fn format_block<T>(term: &Term<T>) -> String {
    let matrix = match term.operand {
        Operand::A => "a_blks",
        Operand::B => "b_blks",
    };
    format!("{matrix}[{}][{}]", term.row, term.col)
}
