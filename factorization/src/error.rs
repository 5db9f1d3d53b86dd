use std::{io, path::PathBuf};

/// Where the GF(2) factorizations can be downloaded from.
pub const DATASET_URL: &str = "https://github.com/google-deepmind/alphatensor/blob/1949163da3bef7e3eb268a3ac015fd1c2dbfc767/algorithms/factorizations_f2.npz";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("factorization archive {} not found, get it from {DATASET_URL} first", .path.display())]
    MissingAsset { path: PathBuf },
    #[error("no factorization for shape {key} in the archive (available: {})", .available.join(" "))]
    UnknownKey { key: String, available: Vec<String> },
    #[error("invalid shape key {0:?}, expected three comma-separated dimensions such as 2,2,2")]
    InvalidKey(String),
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("malformed factorization: {0}")]
    MalformedFactorization(String),
    #[error("failed to read archive: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse JSON archive: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
