//! Batch runner over a temporary data directory

use coeff_lift_core::experiment::{guess_path, load_h_rows};
use coeff_lift_core::{run_batch, BatchConfig, ExperimentError, SolverConfig, SyntheticInstance};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

fn known_map(coeffs: &[i64], indices: Vec<usize>) -> BTreeMap<usize, i64> {
    indices.into_iter().map(|i| (i, coeffs[i])).collect()
}

fn write_json(path: &Path, map: &BTreeMap<usize, i64>) {
    fs::write(path, serde_json::to_string(map).unwrap()).unwrap();
}

fn csv_line(values: &[i64]) -> String {
    values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",")
}

#[test]
fn test_batch_recovers_and_marks_failures() {
    let dir = tempfile::tempdir().unwrap();
    let n = 16;
    let mut rng = StdRng::seed_from_u64(11);
    let keys: Vec<SyntheticInstance> = (0..2)
        .map(|_| SyntheticInstance::generate(n, n / 2, 3, 12289, &mut rng).unwrap())
        .collect();

    let h_csv = dir.path().join("h.csv");
    let h_text: Vec<String> = keys.iter().map(|k| csv_line(&k.h)).collect();
    fs::write(&h_csv, h_text.join("\n")).unwrap();

    // key 0 is fully specified, key 1 has no known g
    write_json(&guess_path(dir.path(), "f", 0), &known_map(keys[0].f.coeffs(), keys[0].f.known_indices()));
    write_json(&guess_path(dir.path(), "g", 0), &known_map(keys[0].g.coeffs(), keys[0].g.known_indices()));
    write_json(&guess_path(dir.path(), "f", 1), &known_map(keys[1].f.coeffs(), keys[1].f.known_indices()));
    write_json(&guess_path(dir.path(), "g", 1), &BTreeMap::new());

    let config = BatchConfig {
        f_dir: dir.path().to_path_buf(),
        g_dir: dir.path().to_path_buf(),
        h_csv,
        out_csv: dir.path().join("out.csv"),
        indices: vec![0, 1, 0],
        n,
        solver: SolverConfig::default(),
    };
    let report = run_batch(&config).unwrap();

    assert_eq!(report.total(), 3);
    assert_eq!(report.successes(), 2);
    assert_eq!(report.failures(), 1);
    assert!(report.mean_solve_time() >= 0.0);

    let out = fs::read_to_string(&config.out_csv).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    let expected = csv_line(&keys[0].secret_f);
    assert_eq!(lines, vec![expected.as_str(), "FAIL", expected.as_str()]);
}

#[test]
fn test_load_h_rows_missing_row() {
    let dir = tempfile::tempdir().unwrap();
    let h_csv = dir.path().join("h.csv");
    fs::write(&h_csv, "1,2,3\n4,5,6\n").unwrap();

    let rows = load_h_rows(&h_csv, &[1]).unwrap();
    assert_eq!(rows[&1], vec![4, 5, 6]);

    assert!(matches!(
        load_h_rows(&h_csv, &[0, 5]),
        Err(ExperimentError::MissingRow { index: 5 })
    ));
}

#[test]
fn test_load_h_rows_reports_line() {
    let dir = tempfile::tempdir().unwrap();
    let h_csv = dir.path().join("h.csv");
    fs::write(&h_csv, "1,2,3\n4,oops,6\n").unwrap();

    match load_h_rows(&h_csv, &[1]) {
        Err(ExperimentError::Parse { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_load_h_rows_rejects_empty_field() {
    let dir = tempfile::tempdir().unwrap();
    let h_csv = dir.path().join("h.csv");
    fs::write(&h_csv, "1,2,3,\n4,,6\n").unwrap();

    assert_eq!(load_h_rows(&h_csv, &[0]).unwrap()[&0], vec![1, 2, 3]);
    match load_h_rows(&h_csv, &[1]) {
        Err(ExperimentError::Parse { line, reason, .. }) => {
            assert_eq!(line, 2);
            assert_eq!(reason, "empty field at column 2");
        }
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_batch_missing_guess_file() {
    let dir = tempfile::tempdir().unwrap();
    let h_csv = dir.path().join("h.csv");
    fs::write(&h_csv, "1,2,3,4\n").unwrap();

    let config = BatchConfig {
        f_dir: dir.path().to_path_buf(),
        g_dir: dir.path().to_path_buf(),
        h_csv,
        out_csv: dir.path().join("out.csv"),
        indices: vec![0],
        n: 4,
        solver: SolverConfig::default(),
    };
    assert!(matches!(run_batch(&config), Err(ExperimentError::Io { .. })));
}

#[test]
fn test_batch_config_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("batch.json");
    fs::write(
        &path,
        r#"{"f_dir": "f", "g_dir": "g", "h_csv": "h.csv", "out_csv": "o.csv", "indices": [0], "n": 512}"#,
    )
    .unwrap();
    let cfg = BatchConfig::load(&path).unwrap();
    assert_eq!(cfg.n, 512);
    assert_eq!(cfg.solver, SolverConfig::default());

    fs::write(&path, "{not json").unwrap();
    assert!(matches!(BatchConfig::load(&path), Err(ExperimentError::Json { .. })));
}
