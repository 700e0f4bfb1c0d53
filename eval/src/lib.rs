// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Naive Bayes training and evaluation over discrete tabular datasets
//!
//! This crate provides:
//! - Per-dataset schemas (cancer, glass, votes, iris, soybean)
//! - Raw data ingestion and equal-frequency discretization
//! - Attribute noise injection
//! - A Laplace-smoothed Naive Bayes classifier and a majority baseline
//! - Zero-one and macro-F1 losses, confusion matrices
//! - k-fold cross-validation and a reproducible evaluation pipeline with seeded randomness

pub mod cross_validation;
pub mod datasets;
pub mod discretize;
pub mod error;
pub mod example;
pub mod metrics;
pub mod model;
pub mod noise;
pub mod pipeline;
pub mod schema;

pub use cross_validation::{cross_validate, format_loss_report, CrossValidationResult, FoldLoss, KFold};
pub use datasets::{read_matrix, write_matrix, Dataset, RawTable};
pub use discretize::{apply_bins, build_bins, discretize, BinMap, Discretizer};
pub use error::{NbError, Result};
pub use example::LabeledExample;
pub use metrics::{f1_score_loss, zero_one_loss, ClassificationReport, ConfusionMatrix};
pub use model::{train_and_classify, Classifier, MajorityBaseline, NaiveBayes};
pub use noise::{add_noise, inject_noise, NoisyDataset};
pub use pipeline::{EvaluationConfig, EvaluationPipeline, EvaluationResults};
pub use schema::{Schema, ValueDomain};
