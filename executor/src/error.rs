use blockmul_number::KnownDomain;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
    #[error("a {rows}x{cols} matrix cannot be split into {n}x{n} blocks")]
    NotDivisible { rows: usize, cols: usize, n: usize },
    #[error("the algorithm stack does not end in an algorithm that needs no recursion")]
    NoBaseCase,
    #[error("{algorithm} is not available over {domain}")]
    Unsupported {
        algorithm: &'static str,
        domain: KnownDomain,
    },
    #[error("invalid program: {0}")]
    InvalidProgram(String),
    #[error("the program's result differs from direct multiplication in trial {trial}")]
    VerificationFailed { trial: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
