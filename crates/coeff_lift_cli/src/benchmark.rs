//! Scaling benchmarks
//!
//! Recovers synthetic keys across a range of ring degrees.

use crate::BackendChoice;
use coeff_lift_core::{
    recover_f_timed, Backend, CpuBackend, GaussianSolver, RayonBackend, SyntheticInstance, DEFAULT_MODULUS,
};
use eyre::{Result, WrapErr};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Secret coefficients are drawn from `[-SECRET_BOUND, SECRET_BOUND]`
const SECRET_BOUND: i64 = 4;

/// Run scaling benchmark
pub fn run_scaling_benchmark(
    max_n: usize,
    known_ratio: f64,
    backend: BackendChoice,
    seed: u64,
    export: Option<PathBuf>,
) -> Result<()> {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                Coeff Lift - Scaling Benchmark                ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!("Backend:     {}", backend.label());
    println!("Threads:     {}", rayon_threads(backend));
    println!("Known ratio: {:.2}", known_ratio);
    println!("Max degree:  {}", max_n);
    println!("Seed:        {}", seed);
    println!();

    // Degree progression
    let sizes: Vec<usize> = [8, 16, 32, 64, 128, 256, 512, 1024]
        .into_iter()
        .filter(|&n| n <= max_n)
        .collect();

    let mut rng = StdRng::seed_from_u64(seed);
    let mut results = Vec::new();

    println!("┌─────────┬─────────┬────────────┬────────────┬────────────┬──────────┬──────────────────┐");
    println!("│ Degree  │ Unknown │  Total(ms) │  Build(ms) │  Solve(ms) │ Verified │       Hash       │");
    println!("├─────────┼─────────┼────────────┼────────────┼────────────┼──────────┼──────────────────┤");

    for &n in &sizes {
        let unknowns = n - (n as f64 * known_ratio).round() as usize;
        let instance = SyntheticInstance::generate(n, unknowns, SECRET_BOUND, DEFAULT_MODULUS, &mut rng)?;
        let result = match backend {
            BackendChoice::Cpu => run_single_benchmark(&GaussianSolver::new(CpuBackend::new()), &instance),
            BackendChoice::Rayon => run_single_benchmark(&GaussianSolver::new(RayonBackend::new()), &instance),
        };
        println!(
            "│ {:>7} │ {:>7} │ {:>10.3} │ {:>10.3} │ {:>10.3} │ {:>8} │ {:>16} │",
            n,
            unknowns,
            result.total_ms,
            result.build_ms,
            result.solve_ms,
            if result.verified { "✓" } else { "✗" },
            &result.result_hash[..16.min(result.result_hash.len())]
        );
        results.push(result);
    }

    println!("└─────────┴─────────┴────────────┴────────────┴────────────┴──────────┴──────────────────┘");

    // Export if requested
    if let Some(path) = export {
        export_benchmark_results(&path, &results)
            .wrap_err_with(|| format!("failed to export results to {}", path.display()))?;
        println!("\nResults exported to: {}", path.display());
    }
    Ok(())
}

fn rayon_threads(backend: BackendChoice) -> usize {
    match backend {
        BackendChoice::Cpu => 1,
        BackendChoice::Rayon => RayonBackend::new().num_threads(),
    }
}

#[derive(Debug, Clone)]
struct BenchResult {
    n: usize,
    dimension: usize,
    total_ms: f64,
    build_ms: f64,
    solve_ms: f64,
    verified: bool,
    /// SHA-256 over the recovered coefficients, or `FAIL: <status>`
    result_hash: String,
}

fn run_single_benchmark<B: Backend>(solver: &GaussianSolver<B>, instance: &SyntheticInstance) -> BenchResult {
    let (result, timings) = recover_f_timed(solver, &instance.h, &instance.g, &instance.f, instance.q);

    let (verified, result_hash) = match result {
        Ok(full) => (
            timings.verified && full.coeffs() == instance.secret_f.as_slice(),
            compute_result_hash(full.coeffs()),
        ),
        Err(e) => {
            warn!(n = instance.n(), error = %e, "synthetic recovery failed");
            (false, format!("FAIL: {}", e.status()))
        }
    };

    BenchResult {
        n: instance.n(),
        dimension: timings.dimension,
        total_ms: timings.total_time * 1000.0,
        build_ms: timings.build_time * 1000.0,
        solve_ms: timings.solve_time * 1000.0,
        verified,
        result_hash,
    }
}

/// Compute SHA256 hash of the recovered coefficients for deterministic verification
fn compute_result_hash(coeffs: &[i64]) -> String {
    let mut hasher = Sha256::new();
    for c in coeffs {
        hasher.update(c.to_le_bytes());
    }
    format!("{:x}", hasher.finalize())
}

fn export_benchmark_results(path: &Path, results: &[BenchResult]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "n,dimension,total_ms,build_ms,solve_ms,verified,hash")?;
    for r in results {
        writeln!(
            file,
            "{},{},{:.6},{:.6},{:.6},{},{}",
            r.n, r.dimension, r.total_ms, r.build_ms, r.solve_ms, r.verified, r.result_hash
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_hash_is_stable() {
        let a = compute_result_hash(&[1, -2, 3]);
        assert_eq!(a, compute_result_hash(&[1, -2, 3]));
        assert_ne!(a, compute_result_hash(&[1, -2, 4]));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_single_benchmark_recovers() {
        let mut rng = StdRng::seed_from_u64(5);
        let instance = SyntheticInstance::generate(32, 16, SECRET_BOUND, DEFAULT_MODULUS, &mut rng).unwrap();
        let result = run_single_benchmark(&GaussianSolver::new(CpuBackend::new()), &instance);
        assert!(result.verified);
        assert_eq!(result.dimension, 16);
        assert_eq!(result.result_hash, compute_result_hash(&instance.secret_f));
    }
}
