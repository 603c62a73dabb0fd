// src/bin/tdigest_cli.rs
use clap::{Parser, Subcommand, ValueEnum};
use fen_tdigest::{TDigest, DEFAULT_COMPRESSION};
use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Output {
    Tsv,
    Csv,
}

impl Output {
    fn separator(self) -> char {
        match self {
            Output::Tsv => '\t',
            Output::Csv => ',',
        }
    }
}

#[derive(Parser)]
#[command(name = "tdigest", author, version, about)]
struct Args {
    /// Compression parameter (accuracy/size trade-off)
    #[arg(short = 'c', long, global = true, default_value_t = DEFAULT_COMPRESSION)]
    compression: f64,

    /// Seed the digest's generator for reproducible output
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Read samples from this file instead of stdin (space/comma/newline separated)
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Load a previously saved digest instead of reading samples
    #[arg(long, global = true, conflicts_with = "input")]
    from_digest: Option<PathBuf>,

    /// Save the digest in binary form after building it
    #[arg(long, global = true)]
    to_digest: Option<PathBuf>,

    /// Row format (tsv|csv)
    #[arg(short, long, global = true, value_enum, default_value_t = Output::Tsv)]
    output: Output,

    /// Debug-level logging on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the estimated value at each quantile
    Quantile {
        /// q in [0,1]; repeat or comma-separate for several
        #[arg(short, long, required = true, num_args = 1.., value_delimiter = ',')]
        q: Vec<f64>,
    },
    /// Print the estimated CDF at each probe
    Cdf {
        /// Probe values; repeat or comma-separate for several
        #[arg(
            short,
            long,
            required = true,
            num_args = 1..,
            value_delimiter = ',',
            allow_negative_numbers = true
        )]
        x: Vec<f64>,
    },
    /// Print compression, total weight and centroid count
    Stats,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn parse_numbers(s: &str) -> Result<Vec<f64>, Box<dyn Error>> {
    let mut out = Vec::new();
    for tok in s
        .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|t| !t.is_empty())
    {
        let v = tok
            .parse::<f64>()
            .map_err(|e| format!("invalid number {tok:?}: {e}"))?;
        out.push(v);
    }
    Ok(out)
}

fn read_samples(input: Option<&PathBuf>) -> Result<Vec<f64>, Box<dyn Error>> {
    let text = match input {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?,
        None => {
            let mut s = String::new();
            io::stdin().read_to_string(&mut s)?;
            s
        }
    };
    parse_numbers(&text)
}

fn load_digest(args: &Args) -> Result<TDigest, Box<dyn Error>> {
    if let Some(path) = &args.from_digest {
        let bytes =
            fs::read(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        let digest = TDigest::from_bytes(&bytes)?;
        info!(
            path = %path.display(),
            centroids = digest.centroid_count(),
            "loaded digest"
        );
        return Ok(digest);
    }

    let mut builder = TDigest::builder().compression(args.compression);
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    let mut digest = builder.build()?;
    let samples = read_samples(args.input.as_ref())?;
    for v in &samples {
        digest.insert(*v)?;
    }
    debug!(
        samples = samples.len(),
        centroids = digest.centroid_count(),
        "built digest"
    );
    Ok(digest)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let digest = load_digest(args)?;
    if let Some(path) = &args.to_digest {
        fs::write(path, digest.to_bytes())
            .map_err(|e| format!("cannot write {}: {e}", path.display()))?;
        info!(path = %path.display(), bytes = digest.encoded_len(), "saved digest");
    }

    let sep = args.output.separator();
    match &args.cmd {
        Cmd::Quantile { q } => {
            for &q in q {
                let v = digest.try_quantile(q)?;
                println!("{q}{sep}{v}");
            }
        }
        Cmd::Cdf { x } => {
            for (x, p) in x.iter().zip(digest.cdf_many(x)) {
                println!("{x}{sep}{p}");
            }
        }
        Cmd::Stats => {
            println!("compression{sep}{}", digest.compression());
            println!("total_weight{sep}{}", digest.total_weight());
            println!("centroids{sep}{}", digest.centroid_count());
        }
    }
    Ok(())
}
