// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Reproducible evaluation pipeline for Naive Bayes
//!
//! Orchestrates:
//! - Raw dataset loading and discretization
//! - Seeded shuffling and noisy-copy generation
//! - Cross-validation of Naive Bayes (and the majority baseline) on clean and noisy data
//! - Processed-matrix, bin and loss-report outputs
//! - Results serialization and markdown reporting

use crate::cross_validation::{self, CrossValidationResult, DEFAULT_FOLDS};
use crate::datasets::{write_matrix, Dataset};
use crate::model::{Classifier, MajorityBaseline, NaiveBayes};
use crate::noise::{inject_noise, NoisyDataset, DEFAULT_NOISE_FRACTION};
use crate::schema::Schema;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const SYNTHETIC_ROWS: usize = 300;
const SYNTHETIC_ATTRIBUTES: usize = 8;
const SYNTHETIC_VALUES: usize = 4;
const SYNTHETIC_CLASSES: usize = 3;

/// Configuration for the evaluation pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Dataset to evaluate on (a built-in schema id, or "synthetic")
    pub dataset_id: String,
    /// Path to the raw data file
    pub raw_path: Option<String>,
    /// Number of cross-validation folds
    pub folds: usize,
    /// Fraction of attribute columns shuffled in the noisy copy
    pub noise_fraction: f64,
    /// Override of the schema's bin count for continuous attributes
    pub num_bins: Option<usize>,
    /// Shuffle rows before noise injection and cross-validation
    pub shuffle: bool,
    /// Output directory for results
    pub output_dir: String,
    /// Also cross-validate the majority-class baseline
    pub run_baseline: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            dataset_id: "synthetic".to_string(),
            raw_path: None,
            folds: DEFAULT_FOLDS,
            noise_fraction: DEFAULT_NOISE_FRACTION,
            num_bins: None,
            shuffle: true,
            output_dir: "results".to_string(),
            run_baseline: true,
        }
    }
}

/// Which copy of the dataset a run was evaluated on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataVariant {
    Clean,
    Noisy,
}

impl DataVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataVariant::Clean => "clean",
            DataVariant::Noisy => "noisy",
        }
    }
}

/// Cross-validation of one model on one copy of the dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRun {
    pub model_name: String,
    pub model_description: String,
    pub variant: DataVariant,
    pub mean_zero_one: f64,
    pub std_zero_one: f64,
    pub mean_f1: f64,
    pub std_f1: f64,
    pub cross_validation: CrossValidationResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub id: String,
    pub name: String,
    pub rows: usize,
    pub attributes: usize,
    pub classes: usize,
    pub binned: bool,
    pub class_distribution: BTreeMap<String, usize>,
}

/// Complete evaluation results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResults {
    pub config: EvaluationConfig,
    pub dataset_info: DatasetInfo,
    pub runs: Vec<ModelRun>,
    /// Attribute columns shuffled in the noisy copy
    pub noise_columns: Vec<usize>,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl EvaluationResults {
    pub fn run(&self, model_name: &str, variant: DataVariant) -> Option<&ModelRun> {
        self.runs
            .iter()
            .find(|r| r.model_name == model_name && r.variant == variant)
    }
}

/// Main evaluation pipeline
pub struct EvaluationPipeline {
    config: EvaluationConfig,
    rng: ChaCha8Rng,
    dataset: Option<Dataset>,
    noisy: Option<NoisyDataset>,
}

impl EvaluationPipeline {
    pub fn new(config: EvaluationConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            dataset: None,
            noisy: None,
        }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    fn synthetic(&self) -> Dataset {
        Dataset::synthetic(
            SYNTHETIC_ROWS,
            SYNTHETIC_ATTRIBUTES,
            SYNTHETIC_VALUES,
            SYNTHETIC_CLASSES,
            self.config.seed,
        )
    }

    fn schema(&self) -> Result<Schema> {
        let schema = Schema::by_id(&self.config.dataset_id)?;
        match self.config.num_bins {
            Some(n) => Ok(schema.with_num_bins(n)?),
            None => Ok(schema),
        }
    }

    /// Load dataset based on configuration
    pub fn load_dataset(&mut self) -> Result<()> {
        let dataset = if self.config.dataset_id == "synthetic" {
            tracing::info!("Loading synthetic dataset with seed {}", self.config.seed);
            self.synthetic()
        } else if let Some(ref path) = self.config.raw_path {
            let schema = self.schema()?;
            let path = Path::new(path);
            tracing::info!("Loading {} dataset from {}", schema.name, path.display());
            Dataset::load(path, schema, &mut self.rng)?
        } else {
            tracing::warn!(
                "No raw path provided for '{}', using synthetic dataset",
                self.config.dataset_id
            );
            self.synthetic()
        };

        tracing::info!(
            "Dataset loaded: {} rows, {} attributes, {} classes",
            dataset.num_rows(),
            dataset.schema.num_attributes(),
            dataset.schema.num_classes()
        );

        self.dataset = Some(dataset);
        self.noisy = None;
        Ok(())
    }

    /// Shuffle the loaded dataset and build its noisy copy
    fn prepare(&mut self) -> Result<()> {
        if self.dataset.is_none() {
            self.load_dataset()?;
        }
        let dataset = self
            .dataset
            .as_mut()
            .context("dataset not loaded")?;

        if self.config.shuffle {
            dataset.shuffle(&mut self.rng);
        }
        let noisy = inject_noise(&dataset.rows, self.config.noise_fraction, &mut self.rng)?;
        tracing::info!("Noisy copy shuffles attribute columns {:?}", noisy.noisy_columns);
        self.noisy = Some(noisy);
        Ok(())
    }

    fn evaluate<M, F>(&self, rows: &[Vec<usize>], schema: &Schema, variant: DataVariant, factory: F) -> Result<ModelRun>
    where
        M: Classifier,
        F: Fn() -> M,
    {
        let description = factory().description().to_string();
        let result = cross_validation::run(rows, schema, self.config.folds, factory)
            .with_context(|| format!("Cross-validation failed on {} data", variant.as_str()))?;

        let run = ModelRun {
            model_name: result.model_name.clone(),
            model_description: description,
            variant,
            mean_zero_one: result.mean_zero_one(),
            std_zero_one: result.std_zero_one(),
            mean_f1: result.mean_f1(),
            std_f1: result.std_f1(),
            cross_validation: result,
        };
        tracing::info!(
            "  {} ({}) - zero-one: {:.4} +/- {:.4}, F1 loss: {:.4} +/- {:.4}",
            run.model_name,
            variant.as_str(),
            run.mean_zero_one,
            run.std_zero_one,
            run.mean_f1,
            run.std_f1
        );
        Ok(run)
    }

    /// Run the full evaluation pipeline
    pub fn run(&mut self) -> Result<EvaluationResults> {
        self.prepare()?;
        let dataset = self.dataset.as_ref().context("dataset not loaded")?;
        let noisy = self.noisy.as_ref().context("noisy copy not built")?;
        let schema = &dataset.schema;

        let class_distribution = dataset
            .class_distribution()
            .into_iter()
            .enumerate()
            .map(|(c, n)| (schema.class_name(c).unwrap_or_default().to_string(), n))
            .collect();
        let dataset_info = DatasetInfo {
            id: schema.id.clone(),
            name: schema.name.clone(),
            rows: dataset.num_rows(),
            attributes: schema.num_attributes(),
            classes: schema.num_classes(),
            binned: schema.is_binned(),
            class_distribution,
        };

        let mut runs = Vec::new();
        for (variant, rows) in [(DataVariant::Clean, &dataset.rows), (DataVariant::Noisy, &noisy.rows)] {
            tracing::info!("Evaluating on {} data ({} folds)", variant.as_str(), self.config.folds);
            runs.push(self.evaluate(rows, schema, variant, || NaiveBayes::new(schema))?);
            if self.config.run_baseline {
                runs.push(self.evaluate(rows, schema, variant, || MajorityBaseline::new(schema))?);
            }
        }

        Ok(EvaluationResults {
            config: self.config.clone(),
            dataset_info,
            runs,
            noise_columns: noisy.noisy_columns.clone(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// Write processed matrices, bin documentation and Naive Bayes loss reports.
    ///
    /// Must be called after `run`, on the same pipeline.
    pub fn write_outputs(&self, results: &EvaluationResults, output_dir: &Path) -> Result<Vec<PathBuf>> {
        let dataset = self.dataset.as_ref().context("dataset not loaded")?;
        let noisy = self.noisy.as_ref().context("pipeline has not been run")?;
        let id = &dataset.schema.id;
        let mut written = Vec::new();

        let processed = output_dir.join("processed");
        let clean_path = processed.join(format!("{}_clean.data", id));
        write_matrix(&clean_path, &dataset.rows)?;
        written.push(clean_path);
        let noisy_path = processed.join(format!("{}_noisy.data", id));
        write_matrix(&noisy_path, &noisy.rows)?;
        written.push(noisy_path);

        if let Some(ref doc) = dataset.bin_documentation {
            let bins_dir = output_dir.join("bins");
            std::fs::create_dir_all(&bins_dir)?;
            let bins_path = bins_dir.join(format!("{}_bins.txt", id));
            std::fs::write(&bins_path, doc).with_context(|| format!("Failed to write {}", bins_path.display()))?;
            written.push(bins_path);
        }

        let loss_dir = output_dir.join("loss");
        std::fs::create_dir_all(&loss_dir)?;
        for variant in [DataVariant::Clean, DataVariant::Noisy] {
            let run = results
                .run("NaiveBayes", variant)
                .with_context(|| format!("no Naive Bayes run on {} data", variant.as_str()))?;
            let loss_path = loss_dir.join(format!("{}_loss_{}.txt", id, variant.as_str()));
            std::fs::write(&loss_path, run.cross_validation.to_loss_report())
                .with_context(|| format!("Failed to write {}", loss_path.display()))?;
            written.push(loss_path);
        }

        for path in &written {
            tracing::debug!("Wrote {}", path.display());
        }
        Ok(written)
    }

    /// Save results to JSON file
    pub fn save_results(results: &EvaluationResults, output_path: &Path) -> Result<()> {
        std::fs::create_dir_all(output_path.parent().unwrap_or(Path::new(".")))?;
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(output_path, json)?;
        tracing::info!("Results saved to {}", output_path.display());
        Ok(())
    }

    /// Generate a markdown report
    pub fn generate_report(results: &EvaluationResults) -> String {
        let mut report = String::new();
        let info = &results.dataset_info;

        report.push_str("# Naive Bayes Evaluation Report\n\n");
        report.push_str(&format!("**Generated:** {}\n\n", results.timestamp.format("%Y-%m-%d %H:%M:%S UTC")));
        report.push_str(&format!("**Version:** {}\n\n", results.version));

        report.push_str("## Dataset\n\n");
        report.push_str(&format!("- **ID:** {}\n", info.id));
        report.push_str(&format!("- **Name:** {}\n", info.name));
        report.push_str(&format!("- **Rows:** {}\n", info.rows));
        report.push_str(&format!("- **Attributes:** {} ({})\n", info.attributes, if info.binned { "binned" } else { "discrete" }));
        report.push_str(&format!("- **Classes:** {}\n", info.classes));
        report.push_str("- **Class Distribution:**\n");
        for (name, count) in &info.class_distribution {
            let share = if info.rows > 0 { *count as f64 / info.rows as f64 * 100.0 } else { 0.0 };
            report.push_str(&format!("  - {}: {} ({:.1}%)\n", name, count, share));
        }
        report.push_str(&format!(
            "- **Noisy Columns:** {}\n\n",
            results
                .noise_columns
                .iter()
                .map(|j| (j + 1).to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));

        report.push_str("## Summary\n\n");
        report.push_str(&format!("{}-fold cross-validation, mean +/- sample standard deviation.\n\n", results.config.folds));
        report.push_str("| Model | Data | Zero-One Loss | F1 Loss |\n");
        report.push_str("|-------|------|---------------|---------|\n");
        for run in &results.runs {
            report.push_str(&format!(
                "| {} | {} | {:.4} +/- {:.4} | {:.4} +/- {:.4} |\n",
                run.model_name,
                run.variant.as_str(),
                run.mean_zero_one,
                run.std_zero_one,
                run.mean_f1,
                run.std_f1
            ));
        }

        report.push_str("\n## Per-Fold Losses\n\n");
        for run in &results.runs {
            report.push_str(&format!("### {} ({})\n\n", run.model_name, run.variant.as_str()));
            report.push_str(&format!("*{}*\n\n", run.model_description));
            report.push_str("| Fold | Train | Test | Zero-One | F1 Loss |\n");
            report.push_str("|------|-------|------|----------|---------|\n");
            for fold in &run.cross_validation.folds {
                report.push_str(&format!(
                    "| {} | {} | {} | {:.4} | {:.4} |\n",
                    fold.fold + 1,
                    fold.train_size,
                    fold.test_size,
                    fold.zero_one,
                    fold.f1
                ));
            }
            report.push('\n');
        }

        report.push_str("## Configuration\n\n");
        report.push_str(&format!("```json\n{}\n```\n", serde_json::to_string_pretty(&results.config).unwrap_or_default()));

        report
    }
}
