//! Coeff Lift CLI
//!
//! Recovers unknown secret-key coefficients of Falcon/NTRU keys from partial
//! knowledge of `f` and `g = h ⋆ f`.
//!
//! # Usage
//! ```bash
//! # Solve a single linear system mod q
//! coeff-lift solve --system system.json
//!
//! # Recover one key from guess files
//! coeff-lift recover --h-csv h.csv --row 3 --f-guess f_3_guess.json --g-guess g_3_guess.json
//!
//! # Batch experiments
//! coeff-lift batch --config batch.json
//!
//! # Synthetic scaling benchmark
//! coeff-lift bench --max-n 1024 --export results/bench.csv
//! ```

mod benchmark;

use clap::{Parser, Subcommand, ValueEnum};
use coeff_lift_core::experiment::{load_guess, load_h_rows, run_single};
use coeff_lift_core::{
    run_batch, Backend, BatchConfig, CpuBackend, GaussianSolver, LinearSystem, Matrix, RayonBackend,
    SolverConfig, DEFAULT_MODULUS,
};
use eyre::{eyre, Result, WrapErr};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "coeff-lift")]
#[command(about = "Secret-key coefficient recovery by Gaussian elimination mod q")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve A·x ≡ b (mod q) from a JSON file {"a": [[..]], "b": [..], "q": ..}
    Solve {
        /// Path to the system JSON
        #[arg(long)]
        system: PathBuf,

        /// Backend to use
        #[arg(long, value_enum, default_value = "rayon")]
        backend: BackendChoice,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Recover the secret f of a single key
    Recover {
        /// CSV file with one public key h per line
        #[arg(long)]
        h_csv: PathBuf,

        /// Line of the CSV to use (0-based)
        #[arg(long)]
        row: usize,

        /// JSON map of guessed f coefficients
        #[arg(long)]
        f_guess: PathBuf,

        /// JSON map of guessed g coefficients
        #[arg(long)]
        g_guess: PathBuf,

        /// Ring degree
        #[arg(long, default_value = "512")]
        n: usize,

        /// Modulus q
        #[arg(long, default_value_t = DEFAULT_MODULUS)]
        modulus: u32,

        /// Backend to use
        #[arg(long, value_enum, default_value = "rayon")]
        backend: BackendChoice,
    },

    /// Run a batch of recovery experiments
    Batch {
        /// Batch configuration JSON (overrides the flags below)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory holding f_{idx}_guess.json
        #[arg(long)]
        f_dir: Option<PathBuf>,

        /// Directory holding g_{idx}_guess.json
        #[arg(long)]
        g_dir: Option<PathBuf>,

        /// CSV file with one public key h per line
        #[arg(long)]
        h_csv: Option<PathBuf>,

        /// Output CSV
        #[arg(long)]
        out_csv: Option<PathBuf>,

        /// Key indices (comma-separated)
        #[arg(long, value_delimiter = ',')]
        indices: Vec<usize>,

        /// Repeat the index list this many times
        #[arg(long, default_value = "1")]
        repeat: usize,

        /// Ring degree
        #[arg(long, default_value = "512")]
        n: usize,

        /// Rows above which elimination runs in parallel
        #[arg(long)]
        threshold: Option<usize>,
    },

    /// Benchmark recovery on synthetic keys of increasing degree
    Bench {
        /// Largest ring degree
        #[arg(long, default_value = "512")]
        max_n: usize,

        /// Fraction of f coefficients known
        #[arg(long, default_value = "0.5")]
        known_ratio: f64,

        /// Backend to use
        #[arg(long, value_enum, default_value = "rayon")]
        backend: BackendChoice,

        /// RNG seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Export results to CSV
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum BackendChoice {
    /// Sequential elimination
    Cpu,
    /// Row elimination on the rayon pool
    Rayon,
}

impl BackendChoice {
    pub fn label(self) -> &'static str {
        match self {
            BackendChoice::Cpu => "CPU (sequential)",
            BackendChoice::Rayon => "CPU (rayon)",
        }
    }
}

#[derive(Deserialize)]
struct SystemFile {
    a: Vec<Vec<i64>>,
    b: Vec<i64>,
    q: u32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Solve {
            system,
            backend,
            json,
        } => match backend {
            BackendChoice::Cpu => run_solve(&GaussianSolver::new(CpuBackend::new()), system, json),
            BackendChoice::Rayon => run_solve(&GaussianSolver::new(RayonBackend::new()), system, json),
        },
        Commands::Recover {
            h_csv,
            row,
            f_guess,
            g_guess,
            n,
            modulus,
            backend,
        } => {
            let args = RecoverArgs {
                h_csv,
                row,
                f_guess,
                g_guess,
                n,
                modulus,
            };
            match backend {
                BackendChoice::Cpu => run_recover(&GaussianSolver::new(CpuBackend::new()), args),
                BackendChoice::Rayon => run_recover(&GaussianSolver::new(RayonBackend::new()), args),
            }
        }
        Commands::Batch {
            config,
            f_dir,
            g_dir,
            h_csv,
            out_csv,
            indices,
            repeat,
            n,
            threshold,
        } => {
            let config = match config {
                Some(path) => BatchConfig::load(&path)
                    .wrap_err_with(|| format!("failed to load batch config {}", path.display()))?,
                None => {
                    let mut solver = SolverConfig::default();
                    if let Some(t) = threshold {
                        solver.parallel_threshold = t;
                    }
                    BatchConfig {
                        f_dir: f_dir.ok_or_else(|| eyre!("--f-dir is required without --config"))?,
                        g_dir: g_dir.ok_or_else(|| eyre!("--g-dir is required without --config"))?,
                        h_csv: h_csv.ok_or_else(|| eyre!("--h-csv is required without --config"))?,
                        out_csv: out_csv.ok_or_else(|| eyre!("--out-csv is required without --config"))?,
                        indices,
                        n,
                        solver,
                    }
                }
            };
            run_batch_command(config, repeat)
        }
        Commands::Bench {
            max_n,
            known_ratio,
            backend,
            seed,
            export,
        } => {
            if !(0.0..=1.0).contains(&known_ratio) {
                return Err(eyre!("--known-ratio must be in [0, 1], got {}", known_ratio));
            }
            benchmark::run_scaling_benchmark(max_n, known_ratio, backend, seed, export)
        }
    }
}

fn run_solve<B: Backend>(solver: &GaussianSolver<B>, path: PathBuf, json: bool) -> Result<()> {
    let text = std::fs::read_to_string(&path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    let file: SystemFile =
        serde_json::from_str(&text).wrap_err_with(|| format!("invalid system JSON in {}", path.display()))?;

    let a = Matrix::from_rows(&file.a)?;
    let system = LinearSystem::from_signed(&a, &file.b, file.q)?;
    let (result, timings) = solver.solve_timed(&system);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Backend:   {}", solver.backend().name());
    println!("Dimension: {}", timings.dimension);
    println!("Modulus:   {}", file.q);
    println!("Status:    {} ({})", result.status, result.status.code());
    println!("Message:   {}", result.message);
    if let Some(x) = &result.x {
        println!("Solution:  {:?}", x);
        println!("Verified:  {}", if timings.verified { "✓" } else { "✗" });
    }
    println!("Time:      {:.3} ms", timings.total_time * 1000.0);
    Ok(())
}

struct RecoverArgs {
    h_csv: PathBuf,
    row: usize,
    f_guess: PathBuf,
    g_guess: PathBuf,
    n: usize,
    modulus: u32,
}

fn run_recover<B: Backend>(solver: &GaussianSolver<B>, args: RecoverArgs) -> Result<()> {
    let mut rows = load_h_rows(&args.h_csv, &[args.row])?;
    let h = rows
        .remove(&args.row)
        .ok_or_else(|| eyre!("row {} not found in {}", args.row, args.h_csv.display()))?;
    let f_guess = load_guess(&args.f_guess)?;
    let g_guess = load_guess(&args.g_guess)?;

    let outcome = run_single(solver, args.row, &h, &f_guess, &g_guess, args.n, args.modulus);

    println!("┌──────────────────────────────────────────────────────────────┐");
    println!("│ Key {:<57}│", args.row);
    println!("├──────────────────────────────────────────────────────────────┤");
    println!("│ Known f:          {:<43}│", outcome.selection.0.to_string());
    println!("│ Known g:          {:<43}│", outcome.selection.1.to_string());
    println!("│ Status:           {:<43}│", outcome.status.to_string());
    println!("│ Message:          {:<43}│", outcome.message);
    println!("│ Solve time:       {:>10.3} ms{:<30}│", outcome.solve_time * 1000.0, "");
    println!("└──────────────────────────────────────────────────────────────┘");

    if let Some(f) = &outcome.recovered {
        println!("{}", outcome.csv_row());
        info!(row = args.row, coefficients = f.len(), "recovered f");
    }
    Ok(())
}

fn run_batch_command(mut config: BatchConfig, repeat: usize) -> Result<()> {
    if repeat > 1 {
        config.indices = config.indices.repeat(repeat);
    }

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                Coeff Lift - Batch Experiments                ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("h CSV:       {}", config.h_csv.display());
    println!("Experiments: {}", config.indices.len());
    println!("Degree:      {}", config.n);
    println!("Modulus:     {}", config.solver.modulus);
    println!();

    let report = run_batch(&config).wrap_err("batch run failed")?;

    println!("┌──────────────┬──────────────┬──────────────┬─────────────────┐");
    println!("│  Experiments │   Recovered  │    Failed    │  Mean solve(ms) │");
    println!("├──────────────┼──────────────┼──────────────┼─────────────────┤");
    println!(
        "│ {:>12} │ {:>12} │ {:>12} │ {:>15.3} │",
        report.total(),
        report.successes(),
        report.failures(),
        report.mean_solve_time() * 1000.0
    );
    println!("└──────────────┴──────────────┴──────────────┴─────────────────┘");
    println!("\nResults written to: {}", config.out_csv.display());
    Ok(())
}
