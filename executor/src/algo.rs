use std::sync::Arc;

use blockmul_codegen::Program;
use blockmul_number::{Coefficient, Gf2};

use crate::{m4rm, matrix::check_product_shape, Error, Interpreter, Matrix, Result};

/// One level of a recursive multiplication.
#[derive(Clone, Debug)]
pub enum AddMulAlgo<T> {
    /// The schoolbook product. Needs no further algorithm to recurse into.
    Naive,
    /// The Method of Four Russians on bit-packed rows. Only available over
    /// GF(2), needs no further algorithm to recurse into.
    M4rm,
    /// Splits the operands into blocks and multiplies them with a program,
    /// recursing into the rest of the stack for every block product.
    Decomposition(Arc<Program<T>>),
}

impl<T: Element> AddMulAlgo<T> {
    /// Whether the algorithm needs no other algorithm to recurse into.
    pub fn is_independent(&self) -> bool {
        matches!(self, AddMulAlgo::Naive | AddMulAlgo::M4rm)
    }

    /// Number of blocks per side the algorithm splits its operands into.
    pub fn block_factor(&self) -> usize {
        match self {
            AddMulAlgo::Naive | AddMulAlgo::M4rm => 1,
            AddMulAlgo::Decomposition(program) => program.n(),
        }
    }
}

/// A coefficient the executor multiplies matrices of.
pub trait Element: Coefficient {
    /// The algorithm [`plan`] ends the stack in by default.
    fn base_case() -> AddMulAlgo<Self> {
        AddMulAlgo::Naive
    }

    /// `dst += lhs * rhs` by [`AddMulAlgo::M4rm`].
    fn addmul_m4rm(
        _dst: &mut Matrix<Self>,
        _lhs: &Matrix<Self>,
        _rhs: &Matrix<Self>,
    ) -> Result<()> {
        Err(Error::Unsupported {
            algorithm: "M4RM",
            domain: Self::known_domain(),
        })
    }
}

impl Element for i64 {}

impl Element for Gf2 {
    fn base_case() -> AddMulAlgo<Self> {
        AddMulAlgo::M4rm
    }

    fn addmul_m4rm(dst: &mut Matrix<Self>, lhs: &Matrix<Self>, rhs: &Matrix<Self>) -> Result<()> {
        m4rm::addmul_m4rm(dst, lhs, rhs)
    }
}

/// Computes `dst += lhs * rhs` with the first algorithm of `algos`, which
/// recurses with the remaining ones.
pub fn addmul_recurse<T: Element>(
    dst: &mut Matrix<T>,
    lhs: &Matrix<T>,
    rhs: &Matrix<T>,
    algos: &[AddMulAlgo<T>],
) -> Result<()> {
    if !algos.last().is_some_and(AddMulAlgo::is_independent) {
        return Err(Error::NoBaseCase);
    }
    match &algos[0] {
        AddMulAlgo::Naive => dst.addmul_naive(lhs, rhs),
        AddMulAlgo::M4rm => T::addmul_m4rm(dst, lhs, rhs),
        AddMulAlgo::Decomposition(program) => {
            Interpreter::new(program).execute(dst, lhs, rhs, &algos[1..])
        }
    }
}

/// Builds the algorithm stack for a product whose smallest dimension is
/// `min_dim`: the programs are applied in turn, starting over at the first
/// one, as long as the blocks they produce keep at least `cutoff` rows and
/// columns. The stack always ends in `base`.
pub fn plan<T: Element>(
    min_dim: usize,
    programs: &[Arc<Program<T>>],
    cutoff: usize,
    base: AddMulAlgo<T>,
) -> Vec<AddMulAlgo<T>> {
    let mut algos = vec![];
    let mut factor = 1;
    let splitting = programs.iter().filter(|p| p.n() > 1).collect::<Vec<_>>();
    for program in splitting.iter().cycle() {
        if min_dim / (factor * program.n()) < cutoff.max(1) {
            break;
        }
        factor *= program.n();
        algos.push(AddMulAlgo::Decomposition(Arc::clone(program)));
    }
    algos.push(base);
    algos
}

/// Computes `dst += lhs * rhs` for matrices of any shape, recursing through
/// `programs` while the blocks are larger than `cutoff` and finishing with
/// [`Element::base_case`].
pub fn addmul<T: Element>(
    dst: &mut Matrix<T>,
    lhs: &Matrix<T>,
    rhs: &Matrix<T>,
    programs: &[Arc<Program<T>>],
    cutoff: usize,
) -> Result<()> {
    addmul_with_base(dst, lhs, rhs, programs, cutoff, T::base_case())
}

/// [`addmul`] with the stack ending in `base`. The operands are padded with
/// zeros to a multiple of the block factor of the whole stack.
pub fn addmul_with_base<T: Element>(
    dst: &mut Matrix<T>,
    lhs: &Matrix<T>,
    rhs: &Matrix<T>,
    programs: &[Arc<Program<T>>],
    cutoff: usize,
    base: AddMulAlgo<T>,
) -> Result<()> {
    check_product_shape(dst, lhs, rhs)?;
    for program in programs {
        program.validate().map_err(Error::InvalidProgram)?;
    }
    let (m, k, n) = (lhs.rows(), lhs.cols(), rhs.cols());
    let algos = plan(m.min(k).min(n), programs, cutoff, base);
    let factor = algos.iter().map(AddMulAlgo::block_factor).product::<usize>();
    log::debug!(
        "Multiplying {m}x{k} by {k}x{n} with {} recursion levels, block factor {factor}",
        algos.len() - 1
    );
    if factor == 1 {
        return addmul_recurse(dst, lhs, rhs, &algos);
    }

    let round_up = |d: usize| d.div_ceil(factor) * factor;
    let (pm, pk, pn) = (round_up(m), round_up(k), round_up(n));
    let mut padded_dst = dst.padded(pm, pn);
    addmul_recurse(
        &mut padded_dst,
        &lhs.padded(pm, pk),
        &rhs.padded(pk, pn),
        &algos,
    )?;
    *dst = padded_dst.truncated(m, n);
    Ok(())
}

#[cfg(test)]
mod test {
    use blockmul_codegen::generate;
    use blockmul_factorization::Factorization;
    use blockmul_number::KnownDomain;
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};
    use test_log::test;

    use super::*;

    fn strassen<T: Element>() -> Arc<Program<T>> {
        Arc::new(generate(&Factorization::strassen()))
    }

    #[test]
    fn stack_without_base_case() {
        let mut c = Matrix::<Gf2>::zero(2, 2);
        let a = Matrix::zero(2, 2);
        let algos = [AddMulAlgo::Decomposition(strassen())];
        assert_eq!(
            addmul_recurse(&mut c, &a, &a, &algos).unwrap_err(),
            Error::NoBaseCase
        );
        assert_eq!(
            addmul_recurse(&mut c, &a, &a, &[]).unwrap_err(),
            Error::NoBaseCase
        );
    }

    #[test]
    fn planning() {
        let s = strassen::<i64>();
        let three = Arc::new(generate(&Factorization::<i64>::naive(3)));
        let factors = |algos: Vec<AddMulAlgo<i64>>| {
            algos.iter().map(AddMulAlgo::block_factor).collect::<Vec<_>>()
        };
        let naive = || AddMulAlgo::Naive;
        assert_eq!(factors(plan(100, &[s.clone()], 16, naive())), vec![2, 2, 1]);
        assert_eq!(factors(plan(15, &[s.clone()], 16, naive())), vec![1]);
        assert_eq!(factors(plan(100, &[s.clone(), three], 5, naive())), vec![2, 3, 2, 1]);
        assert_eq!(factors(plan(100, &[], 5, naive())), vec![1]);
        let one = Arc::new(generate(&Factorization::<i64>::naive(1)));
        assert_eq!(factors(plan(100, &[one], 0, naive())), vec![1]);
    }

    #[test]
    fn base_case_per_domain() {
        assert!(matches!(i64::base_case(), AddMulAlgo::Naive));
        assert!(matches!(Gf2::base_case(), AddMulAlgo::M4rm));
        let algos = plan(64, &[strassen::<Gf2>()], 16, Gf2::base_case());
        assert!(matches!(algos.last(), Some(AddMulAlgo::M4rm)));
        assert!(algos.last().unwrap().is_independent());
    }

    #[test]
    fn m4rm_is_unsupported_over_integers() {
        let mut c = Matrix::<i64>::zero(2, 2);
        let a = Matrix::zero(2, 2);
        assert_eq!(
            addmul_recurse(&mut c, &a, &a, &[AddMulAlgo::M4rm]).unwrap_err(),
            Error::Unsupported {
                algorithm: "M4RM",
                domain: KnownDomain::Integer
            }
        );
    }

    #[test]
    fn recursive_strassen_with_padding() {
        let mut rng = StdRng::seed_from_u64(7);
        for (m, k, n) in [(13, 7, 9), (16, 16, 16), (5, 21, 3)] {
            let a = Matrix::<i64>::random(m, k, &mut rng);
            let b = Matrix::random(k, n, &mut rng);
            let mut expected = Matrix::random(m, n, &mut rng);
            let mut actual = expected.clone();
            expected.addmul_naive(&a, &b).unwrap();
            addmul(&mut actual, &a, &b, &[strassen()], 2).unwrap();
            assert_eq!(actual, expected, "{m}x{k}x{n}");
        }
    }

    #[test]
    fn recursive_strassen_over_gf2() {
        let mut rng = StdRng::seed_from_u64(8);
        let a = Matrix::<Gf2>::random(33, 33, &mut rng);
        let b = Matrix::random(33, 33, &mut rng);
        let mut expected = Matrix::zero(33, 33);
        let mut actual = expected.clone();
        expected.addmul_naive(&a, &b).unwrap();
        addmul(&mut actual, &a, &b, &[strassen()], 4).unwrap();
        assert_eq!(actual, expected);

        let mut schoolbook = Matrix::zero(33, 33);
        addmul_with_base(&mut schoolbook, &a, &b, &[strassen()], 4, AddMulAlgo::Naive).unwrap();
        assert_eq!(schoolbook, expected);
    }
}
