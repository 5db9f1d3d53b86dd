use blockmul_codegen::Program;
use rand::Rng;

use crate::{Element, Error, Interpreter, Matrix, Result};

/// Runs `program` on `trials` random inputs made of `block_dim`×`block_dim`
/// blocks and compares the results with the direct product. Block products
/// use [`Element::base_case`].
pub fn verify<T: Element, R: Rng>(
    program: &Program<T>,
    block_dim: usize,
    trials: usize,
    rng: &mut R,
) -> Result<()> {
    program.validate().map_err(Error::InvalidProgram)?;
    let size = program.n() * block_dim;
    let interpreter = Interpreter::new(program);
    for trial in 0..trials {
        let a = Matrix::random(size, size, rng);
        let b = Matrix::random(size, size, rng);
        let mut expected = Matrix::random(size, size, rng);
        let mut actual = expected.clone();
        expected.addmul_naive(&a, &b)?;
        interpreter.execute(&mut actual, &a, &b, &[T::base_case()])?;
        if actual != expected {
            return Err(Error::VerificationFailed { trial });
        }
        log::debug!("Trial {trial} passed");
    }
    log::info!(
        "Program for {0}x{0} blocks over {1} agrees with direct multiplication in {trials} trials",
        program.n(),
        T::known_domain()
    );
    Ok(())
}
