// ========================================================================================
//
//                                  Tandem command line
//
// ========================================================================================
//
// Two entry points: `jda` runs the cross-validated pseudo-label refinement experiment
// over one labelled table, and `tca` embeds a source and a target table into a shared
// subspace and writes both embeddings.

#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tandem::estimator::Transformer;
use tandem::experiment::config::ExperimentConfig;
use tandem::experiment::{self, ExperimentError, data, report};
use tandem::kernel::{Kernel, KernelKind};
use tandem::tca::{Tca, TcaConfig};

// ========================================================================================
//                         Command-line interface definition
// ========================================================================================

#[derive(Parser)]
#[command(
    name = "tandem",
    version,
    about = "Unsupervised domain adaptation with TCA and JDA"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Cross-validated JDA with iterative pseudo-label refinement
    #[command(about = "Run the JDA experiment (outputs: dec and acc CSV tables)")]
    Jda(JdaArgs),

    /// Fit TCA on a source and a target table
    #[command(about = "Embed two domains with TCA (outputs: source/target embedding CSVs)")]
    Tca(TcaArgs),
}

#[derive(Args)]
struct JdaArgs {
    /// CSV table with a `label` column and numeric feature columns
    data: PathBuf,

    /// TOML experiment configuration
    #[arg(long, value_name = "FILE")]
    config: PathBuf,

    /// Directory for the result tables
    #[arg(long, default_value = ".")]
    out: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum KernelCli {
    Linear,
    Rbf,
    Poly,
}

impl From<KernelCli> for KernelKind {
    fn from(kind: KernelCli) -> Self {
        match kind {
            KernelCli::Linear => KernelKind::Linear,
            KernelCli::Rbf => KernelKind::Rbf,
            KernelCli::Poly => KernelKind::Poly,
        }
    }
}

#[derive(Args)]
struct TcaArgs {
    /// Source-domain CSV (a `label` column is required and otherwise ignored)
    source: PathBuf,

    /// Target-domain CSV, same feature columns as the source
    target: PathBuf,

    /// Embedding dimension
    #[arg(long, default_value = "2")]
    components: usize,

    #[arg(long, value_enum, default_value_t = KernelCli::Linear)]
    kernel: KernelCli,

    /// RBF bandwidth, or polynomial degree for `poly`
    #[arg(long, default_value = "1.0")]
    gamma: f64,

    /// Regularisation weight
    #[arg(long, default_value = "1.0")]
    lambda: f64,

    /// Directory for the embedding tables
    #[arg(long, default_value = ".")]
    out: PathBuf,
}

// ========================================================================================
//                                   Subcommands
// ========================================================================================

fn run_jda(args: JdaArgs) -> Result<(), ExperimentError> {
    let config = ExperimentConfig::load(&args.config)?;
    let (source, target) = experiment::load_domains(&args.data, &config)?;

    let progress = ProgressBar::new((config.repeats * config.kfold) as u64);
    if let Ok(style) =
        ProgressStyle::with_template("> [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} folds {msg}")
    {
        progress.set_style(style.progress_chars("=> "));
    }
    let results = experiment::run_experiment(&source, &target, &config, |repeat, _| {
        progress.set_message(format!("(repeat {})", repeat + 1));
        progress.inc(1);
    })?;
    progress.finish_and_clear();

    ensure_dir(&args.out)?;
    let (dec_path, acc_path) = report::write_report(&args.out, &config, &results)?;
    let (acc_mean, acc_std) = results.accuracy_summary();
    let (auc_mean, auc_std) = results.auc_summary();
    println!("mean accuracy: {acc_mean:.4} (std {acc_std:.4})");
    println!("mean auc: {auc_mean:.4} (std {auc_std:.4})");
    println!("Decision scores: {}", dec_path.display());
    println!("Metrics: {}", acc_path.display());
    Ok(())
}

fn run_tca(args: TcaArgs) -> Result<(), ExperimentError> {
    let (xs, _) = data::load_labeled_csv(&args.source)?;
    let (xt, _) = data::load_labeled_csv(&args.target)?;
    let config = TcaConfig {
        n_components: args.components,
        kernel: Kernel::from_kind(args.kernel.into(), args.gamma),
        lambda: args.lambda,
    };
    let mut tca = Tca::new(config);
    let (zs, zt) = tca.fit_transform(xs.view(), xt.view())?;

    ensure_dir(&args.out)?;
    let source_path = args.out.join("tca_source_embedding.csv");
    let target_path = args.out.join("tca_target_embedding.csv");
    report::write_matrix_csv(&source_path, zs.view())?;
    report::write_matrix_csv(&target_path, zt.view())?;
    println!(
        "Wrote {} ({}x{}) and {} ({}x{}).",
        source_path.display(),
        zs.nrows(),
        zs.ncols(),
        target_path.display(),
        zt.nrows(),
        zt.ncols()
    );
    Ok(())
}

fn ensure_dir(dir: &Path) -> Result<(), ExperimentError> {
    fs::create_dir_all(dir)?;
    Ok(())
}

// ========================================================================================
//                                   Entry point
// ========================================================================================

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let Cli { command } = Cli::parse();

    let result = match command {
        Some(Commands::Jda(args)) => run_jda(args),
        Some(Commands::Tca(args)) => run_tca(args),
        None => {
            if let Err(e) = Cli::command().print_help() {
                eprintln!("Error: {e}");
                process::exit(1);
            }
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
