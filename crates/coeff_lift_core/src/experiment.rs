//! Batch key-recovery experiments
//!
//! Each experiment takes one public key `h` from a CSV file and the guessed
//! coefficients of `f` and `g` from `f_{idx}_guess.json` / `g_{idx}_guess.json`
//! (JSON objects mapping positions to values), solves for the unknown part
//! of `f` and writes one CSV row: the full recovered `f`, or `FAIL`.

use crate::backend::Backend;
use crate::circulant::solve_unknown_f_with;
use crate::config::BatchConfig;
use crate::error::{ExperimentError, SolveError};
use crate::poly::{balance_known, half_degree, select_known_positions, Selection};
use crate::result::SolveStatus;
use crate::solve::GaussianSolver;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

pub type Result<T> = std::result::Result<T, ExperimentError>;

/// Outcome of a single recovery attempt
#[derive(Debug, Clone)]
pub struct ExperimentOutcome {
    pub index: usize,
    pub status: SolveStatus,
    pub message: String,
    /// Selection result for `f` and `g`
    pub selection: (Selection, Selection),
    /// Seconds spent building and solving the system
    pub solve_time: f64,
    /// Full `f` on success
    pub recovered: Option<Vec<i64>>,
}

impl ExperimentOutcome {
    pub fn is_success(&self) -> bool {
        self.recovered.is_some()
    }

    /// CSV line: comma-joined coefficients, or `FAIL`
    pub fn csv_row(&self) -> String {
        match &self.recovered {
            Some(f) => f.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(","),
            None => "FAIL".to_string(),
        }
    }
}

/// Summary of a batch run
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: Vec<ExperimentOutcome>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn successes(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failures(&self) -> usize {
        self.total() - self.successes()
    }

    /// Mean solve time in seconds over all experiments, 0 for an empty batch
    pub fn mean_solve_time(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        self.outcomes.iter().map(|o| o.solve_time).sum::<f64>() / self.total() as f64
    }
}

/// Path of the guess file for key `index`, e.g. `dir/f_7_guess.json`
pub fn guess_path(dir: &Path, prefix: &str, index: usize) -> PathBuf {
    dir.join(format!("{}_{}_guess.json", prefix, index))
}

/// Read the requested rows (0-based line numbers) of an `h` CSV file
///
/// Lines not requested are skipped without parsing.
pub fn load_h_rows<P: AsRef<Path>>(path: P, indices: &[usize]) -> Result<BTreeMap<usize, Vec<i64>>> {
    let path = path.as_ref();
    let wanted: BTreeSet<usize> = indices.iter().copied().collect();
    let file = File::open(path).map_err(|e| ExperimentError::io(path, e))?;

    let mut rows = BTreeMap::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        if rows.len() == wanted.len() {
            break;
        }
        let line = line.map_err(|e| ExperimentError::io(path, e))?;
        if !wanted.contains(&i) {
            continue;
        }
        let row = parse_csv_row(&line).map_err(|reason| ExperimentError::Parse {
            path: path.display().to_string(),
            line: i + 1,
            reason,
        })?;
        rows.insert(i, row);
    }

    if let Some(&index) = wanted.iter().find(|&&i| !rows.contains_key(&i)) {
        return Err(ExperimentError::MissingRow { index });
    }
    Ok(rows)
}

/// Parse one comma-separated row of coefficients
///
/// A single trailing comma is accepted; any other empty field is an error.
fn parse_csv_row(line: &str) -> std::result::Result<Vec<i64>, String> {
    let line = line.trim_end();
    let line = line.strip_suffix(',').unwrap_or(line);
    if line.trim().is_empty() {
        return Ok(Vec::new());
    }
    line.split(',')
        .map(str::trim)
        .enumerate()
        .map(|(column, field)| {
            if field.is_empty() {
                return Err(format!("empty field at column {}", column + 1));
            }
            field
                .parse::<i64>()
                .map_err(|e| format!("bad coefficient {:?}: {}", field, e))
        })
        .collect()
}

/// Load a guess map `{"position": value, ...}`
pub fn load_guess<P: AsRef<Path>>(path: P) -> Result<BTreeMap<usize, i64>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| ExperimentError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| ExperimentError::json(path, e))
}

/// Recover `f` for one key from its guess maps
///
/// Insufficient knowledge is logged but the solve is still attempted;
/// the solver then reports why the system cannot be used.
pub fn run_single<B: Backend>(
    solver: &GaussianSolver<B>,
    index: usize,
    h: &[i64],
    f_guess: &BTreeMap<usize, i64>,
    g_guess: &BTreeMap<usize, i64>,
    n: usize,
    q: u32,
) -> ExperimentOutcome {
    let half = half_degree(n);
    let (mut f, f_sel) = select_known_positions(f_guess, half, n);
    let (mut g, g_sel) = select_known_positions(g_guess, half, n);
    balance_known(&mut f, &mut g, n);

    let start = Instant::now();
    let result = solve_unknown_f_with(solver, h, &g, &f, q);
    let solve_time = start.elapsed().as_secs_f64();

    let (status, message, recovered) = match result.and_then(|x| f.fill_unknown(&x)) {
        Ok(full) => (SolveStatus::Ok, "ok".to_string(), Some(full.coeffs().to_vec())),
        Err(e) => (e.status(), e.to_string(), None),
    };

    ExperimentOutcome {
        index,
        status,
        message,
        selection: (f_sel, g_sel),
        solve_time,
        recovered,
    }
}

/// Write one line per outcome
pub fn write_results<P: AsRef<Path>>(path: P, outcomes: &[ExperimentOutcome]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| ExperimentError::io(path, e))?;
    let mut out = BufWriter::new(file);
    for outcome in outcomes {
        writeln!(out, "{}", outcome.csv_row()).map_err(|e| ExperimentError::io(path, e))?;
    }
    out.flush().map_err(|e| ExperimentError::io(path, e))
}

/// Run every experiment named by `config.indices` and write the output CSV
///
/// I/O and parse failures abort the batch; solver failures become `FAIL`
/// rows.
pub fn run_batch(config: &BatchConfig) -> Result<BatchReport> {
    let q = config.solver.modulus;
    if q < 2 {
        return Err(SolveError::InvalidModulus(q).into());
    }
    let solver = GaussianSolver::new(config.solver.backend());
    let h_rows = load_h_rows(&config.h_csv, &config.indices)?;

    let mut report = BatchReport::default();
    for &index in &config.indices {
        let f_guess = load_guess(guess_path(&config.f_dir, "f", index))?;
        let g_guess = load_guess(guess_path(&config.g_dir, "g", index))?;
        let h = h_rows.get(&index).ok_or(ExperimentError::MissingRow { index })?;

        let outcome = run_single(&solver, index, h, &f_guess, &g_guess, config.n, q);
        if outcome.is_success() {
            info!(index, solve_time = outcome.solve_time, "experiment succeeded");
        } else {
            info!(index, status = %outcome.status, message = %outcome.message, "experiment failed");
        }
        report.outcomes.push(outcome);
    }

    write_results(&config.out_csv, &report.outcomes)?;
    info!(
        experiments = report.total(),
        successes = report.successes(),
        mean_solve_time = report.mean_solve_time(),
        "batch finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;

    #[test]
    fn test_parse_csv_row() {
        assert_eq!(parse_csv_row("1, -2,3").unwrap(), vec![1, -2, 3]);
        assert_eq!(parse_csv_row("4,5,").unwrap(), vec![4, 5]);
        assert_eq!(parse_csv_row("7,8\r").unwrap(), vec![7, 8]);
        assert!(parse_csv_row("").unwrap().is_empty());
        assert!(parse_csv_row("1,x").is_err());
    }

    #[test]
    fn test_parse_csv_row_rejects_interior_empty_field() {
        assert_eq!(parse_csv_row("1,,2").unwrap_err(), "empty field at column 2");
        assert_eq!(parse_csv_row(",3").unwrap_err(), "empty field at column 1");
        assert!(parse_csv_row("4,5,,").is_err());
    }

    #[test]
    fn test_guess_path() {
        let p = guess_path(Path::new("data"), "g", 12);
        assert_eq!(p, Path::new("data").join("g_12_guess.json"));
    }

    #[test]
    fn test_guess_map_json() {
        let map: BTreeMap<usize, i64> = serde_json::from_str(r#"{"0": 3, "17": -1}"#).unwrap();
        assert_eq!(map.get(&0), Some(&3));
        assert_eq!(map.get(&17), Some(&-1));
    }

    #[test]
    fn test_run_single_recovers() {
        let q = 17;
        let h = vec![5, 7, 2, 1, 4, 0, 3, 6];
        let secret = vec![1, -1, 0, 2, 1, 0, -2, 1];
        let g_full = crate::poly::negacyclic_mul(&h, &secret, q).unwrap();

        let f_guess: BTreeMap<usize, i64> = (0..8).step_by(2).map(|i| (i, secret[i])).collect();
        let g_guess: BTreeMap<usize, i64> = (0..4).map(|i| (i, g_full[i])).collect();

        let outcome = run_single(&GaussianSolver::new(CpuBackend), 0, &h, &f_guess, &g_guess, 8, q);
        assert_eq!(outcome.status, SolveStatus::Ok);
        assert_eq!(outcome.selection, (Selection::Enough, Selection::Enough));
        assert_eq!(outcome.recovered.as_deref(), Some(secret.as_slice()));
        assert_eq!(outcome.csv_row(), "1,-1,0,2,1,0,-2,1");
    }

    #[test]
    fn test_run_single_insufficient_knowledge_fails() {
        let h = vec![5, 7, 2, 1];
        let f_guess: BTreeMap<usize, i64> = [(0, 1)].into_iter().collect();
        let g_guess: BTreeMap<usize, i64> = BTreeMap::new();

        let outcome = run_single(&GaussianSolver::new(CpuBackend), 3, &h, &f_guess, &g_guess, 4, 17);
        assert!(!outcome.is_success());
        assert_eq!(outcome.status, SolveStatus::NoKnownG);
        assert_eq!(outcome.message, "no known g");
        assert_eq!(outcome.selection.1, Selection::Insufficient { count: 0, required: 2 });
        assert_eq!(outcome.csv_row(), "FAIL");
    }

    #[test]
    fn test_report_statistics() {
        let outcome = |ok: bool, t: f64| ExperimentOutcome {
            index: 0,
            status: if ok { SolveStatus::Ok } else { SolveStatus::NoPivot },
            message: String::new(),
            selection: (Selection::Enough, Selection::Enough),
            solve_time: t,
            recovered: ok.then(|| vec![0]),
        };
        let report = BatchReport {
            outcomes: vec![outcome(true, 1.0), outcome(false, 3.0)],
        };
        assert_eq!(report.successes(), 1);
        assert_eq!(report.failures(), 1);
        assert!((report.mean_solve_time() - 2.0).abs() < 1e-12);
        assert_eq!(BatchReport::default().mean_solve_time(), 0.0);
    }
}
