use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use blockmul_number::Coefficient;
use itertools::Itertools;
use npyz::{npz::NpzArchive, DType, NpyFile, Order};

use crate::{Error, Factorization, Result, ShapeKey};

/// The GF(2) archive published by AlphaTensor, read when no path is given.
pub const DEFAULT_DATASET: &str = "factorizations_f2.npz";

/// One factor as stored in an archive: `rows` = n² rows of `cols` = R
/// coefficients, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawFactor {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<i64>,
}

/// A keyed archive of factorizations.
///
/// `.npz` archives map each key to a (3, n², R) integer array, as published
/// by AlphaTensor. JSON archives map each key to a list of the three factors,
/// each a list of n² rows of R integers.
pub struct Dataset {
    path: PathBuf,
    source: Source,
}

enum Source {
    Npz(NpzArchive<BufReader<File>>),
    Json(BTreeMap<String, [Vec<Vec<i64>>; 3]>),
}

impl Dataset {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(Error::MissingAsset { path });
        }
        let source = if path.extension().is_some_and(|e| e == "json") {
            Source::Json(serde_json::from_reader(BufReader::new(File::open(&path)?))?)
        } else {
            Source::Npz(NpzArchive::open(&path)?)
        };
        log::info!("Opened factorization archive {}", path.display());
        Ok(Self { path, source })
    }

    /// All keys of the archive, sorted.
    pub fn keys(&self) -> Vec<String> {
        match &self.source {
            Source::Npz(archive) => archive.array_names().map(String::from).sorted().collect(),
            Source::Json(entries) => entries.keys().cloned().collect(),
        }
    }

    /// Reads the three stored factors of `key` without interpreting them.
    pub fn raw_factors(&mut self, key: &ShapeKey) -> Result<[RawFactor; 3]> {
        let name = key.to_string();
        let factors = match &mut self.source {
            Source::Npz(archive) => {
                let npy = archive.by_name(&name).map_err(|e| {
                    Error::MalformedFactorization(format!("cannot read array {name}: {e}"))
                })?;
                npy.map(|npy| read_npy_factors(&name, npy)).transpose()?
            }
            Source::Json(entries) => entries
                .get(&name)
                .map(|factors| read_json_factors(&name, factors))
                .transpose()?,
        };
        factors.ok_or_else(|| Error::UnknownKey {
            key: name,
            available: self.keys(),
        })
    }

    /// Loads the factorization stored under `key`.
    pub fn load<T: Coefficient>(&mut self, key: &ShapeKey) -> Result<Factorization<T>> {
        let raw = self.raw_factors(key)?;
        let factorization = Factorization::from_raw(&raw)?;
        if let Some(n) = key.square_dim() {
            if factorization.n() != n {
                return Err(Error::ShapeMismatch(format!(
                    "entry {key} holds factors for {0}x{0} block matrices",
                    factorization.n()
                )));
            }
        }
        log::info!(
            "Loaded factorization {key} from {} over {}: n = {}, rank = {}",
            self.path.display(),
            T::known_domain(),
            factorization.n(),
            factorization.rank()
        );
        Ok(factorization)
    }
}

fn read_json_factors(name: &str, factors: &[Vec<Vec<i64>>; 3]) -> Result<[RawFactor; 3]> {
    let read = |rows: &Vec<Vec<i64>>| {
        let cols = rows.first().map_or(0, Vec::len);
        if let Some(row) = rows.iter().position(|r| r.len() != cols) {
            return Err(Error::MalformedFactorization(format!(
                "row {row} of entry {name} has {} instead of {cols} columns",
                rows[row].len()
            )));
        }
        Ok(RawFactor {
            rows: rows.len(),
            cols,
            data: rows.concat(),
        })
    };
    let [a, b, c] = factors;
    Ok([read(a)?, read(b)?, read(c)?])
}

fn read_npy_factors<R: Read>(name: &str, npy: NpyFile<R>) -> Result<[RawFactor; 3]> {
    let shape = npy
        .shape()
        .iter()
        .map(|d| usize::try_from(*d))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| Error::MalformedFactorization(format!("array {name} is too large")))?;
    let Some((3, rows, cols)) = shape.iter().copied().collect_tuple() else {
        return Err(Error::MalformedFactorization(format!(
            "array {name} has shape {shape:?}, expected (3, n², R)"
        )));
    };
    let fortran_order = matches!(npy.order(), Order::Fortran);
    let values = read_integers(name, npy)?;
    let at = |f: usize, r: usize, c: usize| {
        if fortran_order {
            values[f + 3 * (r + rows * c)]
        } else {
            values[(f * rows + r) * cols + c]
        }
    };
    Ok([0, 1, 2].map(|f| RawFactor {
        rows,
        cols,
        data: (0..rows)
            .flat_map(|r| (0..cols).map(move |c| (r, c)))
            .map(|(r, c)| at(f, r, c))
            .collect(),
    }))
}

/// Reads the array data as integers, whatever integral dtype it is stored with.
fn read_integers<R: Read>(name: &str, npy: NpyFile<R>) -> Result<Vec<i64>> {
    fn widen<T: Into<i64>>(values: Vec<T>) -> Vec<i64> {
        values.into_iter().map(Into::into).collect()
    }
    let DType::Plain(type_str) = npy.dtype() else {
        return Err(Error::MalformedFactorization(format!(
            "array {name} has a structured dtype"
        )));
    };
    // The first character is the byte order, which npyz handles for us.
    let type_str = type_str.to_string();
    Ok(match &type_str[1..] {
        "i1" => widen(npy.into_vec::<i8>()?),
        "i2" => widen(npy.into_vec::<i16>()?),
        "i4" => widen(npy.into_vec::<i32>()?),
        "i8" => npy.into_vec::<i64>()?,
        "u1" => widen(npy.into_vec::<u8>()?),
        "u2" => widen(npy.into_vec::<u16>()?),
        "u4" => widen(npy.into_vec::<u32>()?),
        "b1" => widen(npy.into_vec::<bool>()?),
        "f4" => integral(name, npy.into_vec::<f32>()?.into_iter().map(f64::from))?,
        "f8" => integral(name, npy.into_vec::<f64>()?)?,
        other => {
            return Err(Error::MalformedFactorization(format!(
                "array {name} has unsupported dtype {other}"
            )))
        }
    })
}

fn integral(name: &str, values: impl IntoIterator<Item = f64>) -> Result<Vec<i64>> {
    values
        .into_iter()
        .map(|v| {
            (v.fract() == 0.0).then_some(v as i64).ok_or_else(|| {
                Error::MalformedFactorization(format!(
                    "array {name} contains non-integral value {v}"
                ))
            })
        })
        .collect()
}
