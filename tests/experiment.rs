use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::Path;
use std::process::Command;
use tandem::experiment::config::ExperimentConfig;
use tandem::experiment::{self, report};
use tandem::jda::JdaConfig;
use tempfile::tempdir;

// Four classes in one table: 1 vs 2 is the source task, 3 vs 4 the target task.
// The target classes sit on the same axis as the source ones but shifted.
fn write_table(path: &Path, per_class: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut text = String::from("label,f0,f1,f2,f3\n");
    for (label, sign, shift) in [(1, 1.0, 0.0), (2, -1.0, 0.0), (3, 1.0, 1.0), (4, -1.0, 1.0)] {
        for _ in 0..per_class {
            write!(text, "{label}").unwrap();
            for _ in 0..4 {
                let noise: f64 = rng.sample(StandardNormal);
                write!(text, ",{}", 3.0 * sign + shift + 0.5 * noise).unwrap();
            }
            text.push('\n');
        }
    }
    fs::write(path, text).unwrap();
}

fn small_config() -> ExperimentConfig {
    ExperimentConfig {
        kfold: 3,
        repeats: 2,
        max_iter: 2,
        jda: JdaConfig {
            k: 3,
            lambda: 1.0,
            ..JdaConfig::default()
        },
        ..ExperimentConfig::for_classes(1, 2, 3, 4)
    }
}

#[test]
fn cross_validated_jda_on_shifted_domains() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("table.csv");
    write_table(&data, 12, 99);
    let config = small_config();

    let (source, target) = experiment::load_domains(&data, &config).unwrap();
    assert_eq!(source.len(), 24);
    assert_eq!(target.len(), 24);

    let mut folds_seen = 0;
    let result = experiment::run_experiment(&source, &target, &config, |_, _| folds_seen += 1)
        .unwrap();
    assert_eq!(folds_seen, 6);
    assert_eq!(result.accuracy.len(), 2);
    assert_eq!(result.decisions[0].len(), 24);
    assert!(result.decisions.iter().flatten().all(|v| v.is_finite()));
    for (pred, dec) in result.predictions.iter().zip(result.decisions.iter()) {
        for (p, d) in pred.iter().zip(dec.iter()) {
            assert_eq!(*p == 1, *d > 0.0);
        }
    }
    let (acc_mean, _) = result.accuracy_summary();
    let (auc_mean, _) = result.auc_summary();
    assert!(acc_mean >= 0.8, "accuracy {acc_mean}");
    assert!(auc_mean >= 0.8, "auc {auc_mean}");

    let (dec_path, acc_path) = report::write_report(dir.path(), &config, &result).unwrap();
    assert!(dec_path.ends_with("jda_3fold_dec_3vs4with1vs2.csv"));
    let acc_text = fs::read_to_string(acc_path).unwrap();
    assert_eq!(acc_text.lines().count(), 1 + 2 * (2 + 2));
}

#[test]
fn cli_runs_jda_and_tca() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("table.csv");
    write_table(&data, 9, 7);
    let config_path = dir.path().join("experiment.toml");
    fs::write(
        &config_path,
        "source_positive = 1\nsource_negative = 2\ntarget_positive = 3\ntarget_negative = 4\n\
         kfold = 3\nmax_iter = 1\n\n[jda]\nk = 2\nlmbda = 1.0\nker = \"linear\"\ngamma = 1.0\n",
    )
    .unwrap();
    let out = dir.path().join("results");

    let exe = env!("CARGO_BIN_EXE_tandem");
    let status = Command::new(exe)
        .args([
            "jda",
            data.to_str().unwrap(),
            "--config",
            config_path.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
        ])
        .status()
        .expect("run tandem cli");
    assert!(status.success(), "CLI exited with status {status:?}");
    assert!(out.join("jda_3fold_dec_3vs4with1vs2.csv").exists());
    assert!(out.join("jda_3fold_acc_3vs4with1vs2.csv").exists());

    let status = Command::new(exe)
        .args([
            "tca",
            data.to_str().unwrap(),
            data.to_str().unwrap(),
            "--components",
            "2",
            "--out",
            out.to_str().unwrap(),
        ])
        .status()
        .expect("run tandem cli");
    assert!(status.success(), "CLI exited with status {status:?}");
    let source = fs::read_to_string(out.join("tca_source_embedding.csv")).unwrap();
    assert_eq!(source.lines().count(), 1 + 36);
    assert_eq!(source.lines().next(), Some("c0,c1"));
}

#[test]
fn cli_reports_bad_configuration() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("table.csv");
    write_table(&data, 4, 1);
    let config_path = dir.path().join("bad.toml");
    fs::write(&config_path, "source_positive = 1\nunknown = 3\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_tandem"))
        .args([
            "jda",
            data.to_str().unwrap(),
            "--config",
            config_path.to_str().unwrap(),
        ])
        .output()
        .expect("run tandem cli");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}
