//! The blockmul CLI tool

mod util;

use std::{
    fs,
    hint::black_box,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use blockmul_codegen::{generate, DecompFunction, Listing, Program, Renderer, RustStatements};
use blockmul_executor::{addmul_with_base, AddMulAlgo, Element, Matrix};
use blockmul_factorization::{Dataset, Factorization, ShapeKey, DEFAULT_DATASET};
use blockmul_number::Coefficient;
use clap::{CommandFactory, Parser, Subcommand};
use env_logger::{fmt::Color, Builder, Target};
use itertools::Itertools;
use log::{Level, LevelFilter};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use strum::{Display, EnumString, EnumVariantNames};

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, EnumVariantNames, Display)]
pub enum DomainArgument {
    /// GF(2), the domain of `factorizations_f2.npz`.
    #[strum(serialize = "f2")]
    F2,
    /// The integers, the domain of `factorizations_r.npz`.
    #[strum(serialize = "r")]
    R,
}

impl DomainArgument {
    fn default_dataset(self) -> &'static str {
        match self {
            DomainArgument::F2 => DEFAULT_DATASET,
            DomainArgument::R => "factorizations_r.npz",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, EnumVariantNames, Display)]
pub enum FormatArgument {
    #[strum(serialize = "rust")]
    Rust,
    #[strum(serialize = "listing")]
    Listing,
    #[strum(serialize = "json")]
    Json,
}

#[derive(Parser)]
#[command(name = "blockmul", author, version, about, long_about = None)]
struct Cli {
    #[arg(long, hide = true)]
    markdown_help: bool,

    /// Set log filter value [ off, error, warn, info, debug, trace ]
    #[arg(long)]
    #[arg(default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generates the block operations of the factorization stored under a key
    /// such as "4,4,4".
    Generate {
        /// Key of the factorization in the archive.
        key: String,

        /// Factorization archive (.npz or .json). Defaults to the archive of the domain.
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Coefficient domain of the factorization.
        #[arg(long)]
        #[arg(default_value_t = DomainArgument::F2)]
        #[arg(value_parser = clap_enum_variants!(DomainArgument))]
        domain: DomainArgument,

        /// Output format.
        #[arg(long)]
        #[arg(default_value_t = FormatArgument::Rust)]
        #[arg(value_parser = clap_enum_variants!(FormatArgument))]
        format: FormatArgument,

        /// Wrap the Rust statements into a `decomp_fn!` item defining this function.
        #[arg(long)]
        wrap: Option<String>,

        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Lists the keys of a factorization archive.
    Keys {
        /// Factorization archive (.npz or .json).
        #[arg(long)]
        #[arg(default_value = DEFAULT_DATASET)]
        dataset: PathBuf,
    },
    /// Checks the generated program against direct multiplication on random matrices.
    Verify {
        /// Key of the factorization in the archive.
        key: String,

        /// Factorization archive (.npz or .json). Defaults to the archive of the domain.
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Coefficient domain of the factorization.
        #[arg(long)]
        #[arg(default_value_t = DomainArgument::F2)]
        #[arg(value_parser = clap_enum_variants!(DomainArgument))]
        domain: DomainArgument,

        /// Number of rows and columns of every block.
        #[arg(long)]
        #[arg(default_value_t = 4)]
        block_dim: usize,

        /// Number of random inputs to check.
        #[arg(long)]
        #[arg(default_value_t = 10)]
        trials: usize,

        /// Seed of the random inputs. Random if not given.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Times recursive multiplication of square matrices and writes the
    /// timings as JSON.
    Bench {
        /// Smallest matrix size.
        #[arg(long)]
        #[arg(default_value_t = 16)]
        from: usize,

        /// Matrix sizes stay below this.
        #[arg(long)]
        #[arg(default_value_t = 2048)]
        to: usize,

        /// Distance between consecutive matrix sizes.
        #[arg(long)]
        #[arg(default_value_t = 64)]
        step: usize,

        /// Number of multiplications per matrix size.
        #[arg(long)]
        #[arg(default_value_t = 10)]
        nsamples: usize,

        /// Blocks with fewer rows or columns are multiplied by the base case
        /// (M4RM over GF(2), schoolbook over the integers).
        #[arg(long)]
        #[arg(default_value_t = 64)]
        cutoff: usize,

        /// Coefficient domain of the matrices.
        #[arg(long)]
        #[arg(default_value_t = DomainArgument::F2)]
        #[arg(value_parser = clap_enum_variants!(DomainArgument))]
        domain: DomainArgument,

        /// Factorization archive for `--key`. Defaults to the archive of the domain.
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Also benchmark the factorizations stored under these keys.
        #[arg(long)]
        key: Vec<String>,

        /// Output file, written with the extension "json".
        #[arg(long)]
        out_fn: PathBuf,
    },
}

fn main() -> Result<(), io::Error> {
    let args = Cli::parse();

    let mut builder = Builder::new();
    builder
        .filter_level(args.log_level)
        .parse_default_env()
        .target(Target::Stderr)
        .format(|buf, record| {
            let mut style = buf.style();
            match record.level() {
                Level::Error => {
                    style.set_color(Color::Red);
                }
                Level::Warn => {
                    style.set_color(Color::Yellow);
                }
                _ => {}
            }
            writeln!(buf, "{}", style.value(record.args()))
        })
        .init();

    if args.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        Ok(())
    } else if let Some(command) = args.command {
        run_command(command);
        Ok(())
    } else {
        Cli::command().print_help()
    }
}

#[allow(clippy::print_stderr)]
fn run_command(command: Commands) {
    let result = match command {
        Commands::Generate {
            key,
            dataset,
            domain,
            format,
            wrap,
            output,
        } => {
            let dataset = dataset.unwrap_or_else(|| domain.default_dataset().into());
            call_with_domain!(render_program::<domain>(&key, &dataset, format, wrap))
                .and_then(|text| write_output(&text, output.as_deref()))
        }
        Commands::Keys { dataset } => {
            list_keys(&dataset).and_then(|keys| write_output(&keys.iter().join("\n"), None))
        }
        Commands::Verify {
            key,
            dataset,
            domain,
            block_dim,
            trials,
            seed,
        } => {
            let dataset = dataset.unwrap_or_else(|| domain.default_dataset().into());
            call_with_domain!(verify_key::<domain>(&key, &dataset, block_dim, trials, seed))
        }
        Commands::Bench {
            from,
            to,
            step,
            nsamples,
            cutoff,
            domain,
            dataset,
            key,
            out_fn,
        } => {
            let dataset = dataset.unwrap_or_else(|| domain.default_dataset().into());
            let sizes = BenchSizes {
                from,
                to,
                step,
                nsamples,
            };
            call_with_domain!(run_bench::<domain>(&sizes, cutoff, &dataset, &key, &out_fn))
        }
    };
    if let Err(error) = result {
        eprintln!("{error}");
        std::process::exit(1);
    }
}

fn write_output(text: &str, output: Option<&Path>) -> Result<(), String> {
    let text = if text.ends_with('\n') || text.is_empty() {
        text.to_string()
    } else {
        format!("{text}\n")
    };
    match output {
        Some(path) => {
            fs::write(path, text).map_err(|e| format!("cannot write {}: {e}", path.display()))?;
            log::info!("Wrote {}", path.display());
            Ok(())
        }
        None => io::stdout()
            .write_all(text.as_bytes())
            .map_err(|e| e.to_string()),
    }
}

fn load<T: Coefficient>(key: &str, dataset: &Path) -> Result<Factorization<T>, String> {
    let key = key.parse::<ShapeKey>().map_err(|e| e.to_string())?;
    Dataset::open(dataset)
        .and_then(|mut dataset| dataset.load(&key))
        .map_err(|e| e.to_string())
}

fn render_program<T: Coefficient>(
    key: &str,
    dataset: &Path,
    format: FormatArgument,
    wrap: Option<String>,
) -> Result<String, String> {
    let program = generate(&load::<T>(key, dataset)?);
    match (format, wrap) {
        (FormatArgument::Rust, None) => Ok(RustStatements.render(&program)),
        (FormatArgument::Rust, Some(name)) => Ok(DecompFunction { name }.render(&program)),
        (_, Some(_)) => Err("--wrap can only be used with --format rust".to_string()),
        (FormatArgument::Listing, None) => Ok(Listing.render(&program)),
        (FormatArgument::Json, None) => serde_json::to_string_pretty(&program)
            .map(|json| format!("{json}\n"))
            .map_err(|e| e.to_string()),
    }
}

fn list_keys(dataset: &Path) -> Result<Vec<String>, String> {
    Dataset::open(dataset)
        .map(|dataset| dataset.keys())
        .map_err(|e| e.to_string())
}

fn verify_key<T: Element>(
    key: &str,
    dataset: &Path,
    block_dim: usize,
    trials: usize,
    seed: Option<u64>,
) -> Result<(), String> {
    let program = generate(&load::<T>(key, dataset)?);
    let seed = seed.unwrap_or_else(rand::random);
    log::info!("Verifying with seed {seed}");
    let mut rng = StdRng::seed_from_u64(seed);
    blockmul_executor::verify(&program, block_dim, trials, &mut rng).map_err(|e| e.to_string())?;
    log::info!("Factorization {key} is correct on {trials} random inputs");
    Ok(())
}

struct BenchSizes {
    from: usize,
    to: usize,
    step: usize,
    nsamples: usize,
}

#[derive(Serialize, Debug)]
struct BenchRecord {
    method_name: String,
    mat_sz: usize,
    /// Nanoseconds per multiplication.
    cycles: f64,
}

fn run_bench<T: Element>(
    sizes: &BenchSizes,
    cutoff: usize,
    dataset: &Path,
    keys: &[String],
    out_fn: &Path,
) -> Result<(), String> {
    let records = bench::<T>(sizes, cutoff, dataset, keys)?;
    let path = out_fn.with_extension("json");
    let file =
        fs::File::create(&path).map_err(|e| format!("cannot create {}: {e}", path.display()))?;
    serde_json::to_writer(io::BufWriter::new(file), &records).map_err(|e| e.to_string())?;
    log::info!("Wrote {} timings to {}", records.len(), path.display());
    Ok(())
}

fn bench<T: Element>(
    sizes: &BenchSizes,
    cutoff: usize,
    dataset: &Path,
    keys: &[String],
) -> Result<Vec<BenchRecord>, String> {
    if sizes.step == 0 || sizes.nsamples == 0 {
        return Err("--step and --nsamples must be positive".to_string());
    }
    let mut methods: Vec<(String, Vec<Arc<Program<T>>>, AddMulAlgo<T>)> =
        vec![("naive".to_string(), vec![], AddMulAlgo::Naive)];
    if let AddMulAlgo::M4rm = T::base_case() {
        methods.push(("m4rm".to_string(), vec![], AddMulAlgo::M4rm));
    }
    methods.push((
        "strassen".to_string(),
        vec![Arc::new(generate(&Factorization::strassen()))],
        T::base_case(),
    ));
    for key in keys {
        let program = generate(&load::<T>(key, dataset)?);
        methods.push((
            format!("decomp{}", key.replace(',', "x")),
            vec![Arc::new(program)],
            T::base_case(),
        ));
    }

    let mut rng = StdRng::from_entropy();
    let mut records = vec![];
    for (name, programs, base) in &methods {
        log::info!("Benchmarking {name}");
        for mat_sz in (sizes.from..sizes.to).step_by(sizes.step) {
            let a = Matrix::<T>::random(mat_sz, mat_sz, &mut rng);
            let b = Matrix::random(mat_sz, mat_sz, &mut rng);
            let start = Instant::now();
            for _ in 0..sizes.nsamples {
                let mut product = Matrix::zero(mat_sz, mat_sz);
                addmul_with_base(
                    black_box(&mut product),
                    black_box(&a),
                    black_box(&b),
                    programs,
                    cutoff,
                    base.clone(),
                )
                .map_err(|e| e.to_string())?;
            }
            let cycles = start.elapsed().as_nanos() as f64 / sizes.nsamples as f64;
            log::debug!("mat_sz: {mat_sz}, {cycles:.0} ns");
            records.push(BenchRecord {
                method_name: name.clone(),
                mat_sz,
                cycles,
            });
        }
    }
    Ok(records)
}
