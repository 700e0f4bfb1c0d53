// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Standalone Naive Bayes runner
//!
//! Cross-validates a model on an already processed matrix and writes the
//! per-fold loss report.

use anyhow::{Context, Result};
use clap::Parser;
use nbayes_eval::cross_validation;
use nbayes_eval::datasets::Dataset;
use nbayes_eval::model::{MajorityBaseline, NaiveBayes};
use nbayes_eval::schema::Schema;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "nb-learn")]
#[command(about = "Cross-validate a model on a processed data file")]
#[command(version)]
struct Args {
    /// Processed matrix (comma-separated integers, class id last)
    input: PathBuf,

    /// Dataset schema the matrix was produced for
    #[arg(short, long)]
    dataset: String,

    /// Bin count the matrix was discretized with (binned datasets only)
    #[arg(short, long)]
    bins: Option<usize>,

    /// Number of cross-validation folds
    #[arg(short = 'k', long, default_value_t = 10)]
    folds: usize,

    /// Model to run (NaiveBayes, Majority)
    #[arg(short, long, default_value = "NaiveBayes")]
    model: String,

    /// Where to write the loss report (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut schema = Schema::by_id(&args.dataset)?;
    if let Some(bins) = args.bins {
        schema = schema.with_num_bins(bins)?;
    }
    let dataset = Dataset::load_processed(&args.input, schema)?;
    let schema = &dataset.schema;
    tracing::info!("Loaded {} rows of '{}' from {}", dataset.num_rows(), schema.id, args.input.display());

    let result = if args.model.eq_ignore_ascii_case("naivebayes") {
        cross_validation::run(&dataset.rows, schema, args.folds, || NaiveBayes::new(schema))?
    } else if args.model.eq_ignore_ascii_case("majority") {
        cross_validation::run(&dataset.rows, schema, args.folds, || MajorityBaseline::new(schema))?
    } else {
        anyhow::bail!("unknown model '{}' (expected NaiveBayes or Majority)", args.model);
    };

    tracing::info!(
        "{}: zero-one {:.4} +/- {:.4}, F1 loss {:.4} +/- {:.4}",
        result.model_name,
        result.mean_zero_one(),
        result.std_zero_one(),
        result.mean_f1(),
        result.std_f1()
    );

    let report = result.to_loss_report();
    match args.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, report).with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Loss report saved to: {}", path.display());
        }
        None => print!("{}", report),
    }

    Ok(())
}
