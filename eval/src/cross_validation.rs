// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! K-fold cross-validation
//!
//! The dataset is split into `k` contiguous folds whose sizes differ by at
//! most one (the first `N mod k` folds take an extra row). Each fold is held
//! out once: a fresh model is trained on the other folds and scored on it.

use crate::error::{NbError, Result};
use crate::example::{labeled_examples, unlabeled_examples};
use crate::metrics::{f1_score_loss, zero_one_loss};
use crate::model::{Classifier, NaiveBayes};
use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Default number of folds
pub const DEFAULT_FOLDS: usize = 10;

/// K-Fold splitter over contiguous row ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KFold {
    n_splits: usize,
}

impl Default for KFold {
    fn default() -> Self {
        Self::new(DEFAULT_FOLDS)
    }
}

impl KFold {
    pub fn new(n_splits: usize) -> Self {
        Self { n_splits }
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Row range of every fold, in order
    pub fn fold_ranges(&self, n_samples: usize) -> Result<Vec<Range<usize>>> {
        if self.n_splits < 2 {
            return Err(NbError::InvalidParameter(format!(
                "need at least 2 folds, got {}",
                self.n_splits
            )));
        }
        if self.n_splits > n_samples {
            return Err(NbError::InvalidParameter(format!(
                "cannot split {} rows into {} folds",
                n_samples, self.n_splits
            )));
        }

        let per_fold = n_samples / self.n_splits;
        let left_over = n_samples % self.n_splits;
        let mut start = 0;
        Ok((0..self.n_splits)
            .map(|i| {
                let len = per_fold + usize::from(i < left_over);
                let range = start..start + len;
                start += len;
                range
            })
            .collect())
    }

    /// (train indices, test indices) for every fold
    pub fn split(&self, n_samples: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        Ok(self
            .fold_ranges(n_samples)?
            .into_iter()
            .map(|test| {
                let train = (0..test.start).chain(test.end..n_samples).collect();
                (train, test.collect())
            })
            .collect())
    }
}

/// Losses of one held-out fold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldLoss {
    pub fold: usize,
    pub zero_one: f64,
    pub f1: f64,
    pub train_size: usize,
    pub test_size: usize,
}

/// Per-fold losses of one model over one dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationResult {
    pub model_name: String,
    pub folds: Vec<FoldLoss>,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        return 0.0;
    }
    sum / count as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values.iter().copied());
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

impl CrossValidationResult {
    pub fn mean_zero_one(&self) -> f64 {
        mean(self.folds.iter().map(|f| f.zero_one))
    }

    pub fn mean_f1(&self) -> f64 {
        mean(self.folds.iter().map(|f| f.f1))
    }

    pub fn std_zero_one(&self) -> f64 {
        std_dev(&self.folds.iter().map(|f| f.zero_one).collect::<Vec<_>>())
    }

    pub fn std_f1(&self) -> f64 {
        std_dev(&self.folds.iter().map(|f| f.f1).collect::<Vec<_>>())
    }

    /// `(zero_one_loss, f1_loss)` per fold, in fold order
    pub fn losses(&self) -> Vec<(f64, f64)> {
        self.folds.iter().map(|f| (f.zero_one, f.f1)).collect()
    }

    /// Loss report text: one `<zero_one>,<f1>` line per fold
    pub fn to_loss_report(&self) -> String {
        format_loss_report(&self.losses())
    }
}

/// Render `(zero_one, f1)` pairs as the loss report consumed by external tooling
pub fn format_loss_report(losses: &[(f64, f64)]) -> String {
    losses
        .iter()
        .map(|(zero_one, f1)| format!("{:?},{:?}\n", zero_one, f1))
        .collect()
}

fn select(rows: &[Vec<usize>], indices: &[usize]) -> Vec<Vec<usize>> {
    indices.iter().map(|&i| rows[i].clone()).collect()
}

/// Cross-validate models built by `model_factory` over `rows`.
///
/// Every fold trains its own model instance; nothing is shared between folds.
pub fn run<M, F>(rows: &[Vec<usize>], schema: &Schema, k: usize, model_factory: F) -> Result<CrossValidationResult>
where
    M: Classifier,
    F: Fn() -> M,
{
    schema.validate_rows(rows)?;
    let splits = KFold::new(k).split(rows.len())?;

    let mut model_name = String::new();
    let mut folds = Vec::with_capacity(splits.len());
    for (fold, (train_idx, test_idx)) in splits.iter().enumerate() {
        let training = labeled_examples(&select(rows, train_idx), schema)?;
        let mut testing = unlabeled_examples(&select(rows, test_idx), schema)?;

        let mut model = model_factory();
        model.train(&training)?;
        model.classify(&mut testing)?;
        if model_name.is_empty() {
            model_name = model.name().to_string();
        }

        let loss = FoldLoss {
            fold,
            zero_one: zero_one_loss(&testing)?,
            f1: f1_score_loss(&testing)?,
            train_size: training.len(),
            test_size: testing.len(),
        };
        tracing::debug!(
            "{} fold {}: zero-one={:.4} f1={:.4} (train={}, test={})",
            model_name,
            fold,
            loss.zero_one,
            loss.f1,
            loss.train_size,
            loss.test_size
        );
        folds.push(loss);
    }

    Ok(CrossValidationResult { model_name, folds })
}

/// Naive Bayes cross-validation: `(zero_one_loss, f1_loss)` per fold
pub fn cross_validate(rows: &[Vec<usize>], schema: &Schema, k: usize) -> Result<Vec<(f64, f64)>> {
    run(rows, schema, k, || NaiveBayes::new(schema)).map(|result| result.losses())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MajorityBaseline;
    use proptest::prelude::*;

    fn toy_schema() -> Schema {
        Schema::discrete("toy", vec!["no".into(), "yes".into()], 2, 0, 2)
    }

    fn toy_rows() -> Vec<Vec<usize>> {
        vec![
            vec![0, 0, 0],
            vec![2, 2, 1],
            vec![0, 1, 0],
            vec![2, 1, 1],
            vec![1, 0, 0],
            vec![2, 2, 1],
            vec![0, 0, 0],
            vec![1, 2, 1],
            vec![0, 1, 0],
            vec![2, 2, 1],
        ]
    }

    #[test]
    fn test_fold_sizes_follow_array_split() {
        let ranges = KFold::new(3).fold_ranges(10).unwrap();
        assert_eq!(ranges, vec![0..4, 4..7, 7..10]);
    }

    #[test]
    fn test_invalid_fold_counts() {
        assert!(matches!(KFold::new(1).split(10), Err(NbError::InvalidParameter(_))));
        assert!(matches!(KFold::new(11).split(10), Err(NbError::InvalidParameter(_))));
    }

    #[test]
    fn test_two_fold_toy_dataset() {
        let losses = cross_validate(&toy_rows(), &toy_schema(), 2).unwrap();
        assert_eq!(losses.len(), 2);
        for (zero_one, f1) in losses {
            assert!((0.0..=1.0).contains(&zero_one));
            assert!((0.0..=1.0).contains(&f1));
        }
    }

    #[test]
    fn test_separable_data_scores_perfectly() {
        let result = run(&toy_rows(), &toy_schema(), 5, || NaiveBayes::new(&toy_schema())).unwrap();
        assert_eq!(result.model_name, "NaiveBayes");
        assert_eq!(result.folds.len(), 5);
        assert!(result.mean_zero_one() < 0.5);
        assert!(result.folds.iter().all(|f| f.train_size + f.test_size == 10));
    }

    #[test]
    fn test_baseline_through_same_loop() {
        let schema = toy_schema();
        let result = run(&toy_rows(), &schema, 2, || MajorityBaseline::new(&schema)).unwrap();
        assert_eq!(result.model_name, "Majority");
        assert_eq!(result.folds.len(), 2);
    }

    #[test]
    fn test_rows_validated_before_training() {
        let mut rows = toy_rows();
        rows[3] = vec![2, 1];
        assert!(matches!(cross_validate(&rows, &toy_schema(), 2), Err(NbError::MalformedInput(_))));
    }

    #[test]
    fn test_loss_report_format() {
        let report = format_loss_report(&[(0.1, 0.25), (0.0, 1.0)]);
        assert_eq!(report, "0.1,0.25\n0.0,1.0\n");
    }

    #[test]
    fn test_summary_statistics() {
        let result = CrossValidationResult {
            model_name: "m".to_string(),
            folds: vec![
                FoldLoss { fold: 0, zero_one: 0.2, f1: 0.4, train_size: 1, test_size: 1 },
                FoldLoss { fold: 1, zero_one: 0.4, f1: 0.4, train_size: 1, test_size: 1 },
            ],
        };
        assert!((result.mean_zero_one() - 0.3).abs() < 1e-9);
        assert!(result.std_f1().abs() < 1e-9);
        assert!((result.std_zero_one() - 0.02f64.sqrt()).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_test_folds_partition_rows(n in 2usize..300, k in 2usize..20) {
            prop_assume!(k <= n);
            let splits = KFold::new(k).split(n).unwrap();
            prop_assert_eq!(splits.len(), k);

            let mut seen = vec![0usize; n];
            for (train, test) in &splits {
                prop_assert_eq!(train.len() + test.len(), n);
                for &i in test {
                    seen[i] += 1;
                }
            }
            prop_assert!(seen.iter().all(|&count| count == 1));

            let sizes: Vec<usize> = splits.iter().map(|(_, t)| t.len()).collect();
            let max = *sizes.iter().max().unwrap();
            let min = *sizes.iter().min().unwrap();
            prop_assert!(max - min <= 1);
        }
    }
}
