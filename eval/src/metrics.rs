// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Evaluation metrics for multi-class classification
//!
//! Implements:
//! - Confusion Matrix (rows = true class, columns = predicted class)
//! - Per-class Precision, Recall, F1-Score
//! - Zero-one loss and macro-averaged F1 loss
//!
//! Macro F1 averages over the classes that occur in the evaluated examples,
//! either as a true label or as a prediction. A class that occurs but is
//! never predicted correctly contributes an F1 of zero.

use crate::error::{NbError, Result};
use crate::example::LabeledExample;
use serde::{Deserialize, Serialize};

/// Confusion matrix for multi-class classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// counts[true][predicted]
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn new(num_classes: usize) -> Self {
        Self {
            counts: vec![vec![0; num_classes]; num_classes],
        }
    }

    /// Create from predicted and true class ids
    pub fn from_predictions(predictions: &[usize], ground_truth: &[usize], num_classes: usize) -> Result<Self> {
        if predictions.len() != ground_truth.len() {
            return Err(NbError::MalformedInput(format!(
                "{} predictions for {} labels",
                predictions.len(),
                ground_truth.len()
            )));
        }
        let mut matrix = Self::new(num_classes);
        for (pred, truth) in predictions.iter().zip(ground_truth) {
            for id in [pred, truth] {
                if *id >= num_classes {
                    return Err(NbError::domain("class id", id, format!("0..{}", num_classes)));
                }
            }
            matrix.counts[*truth][*pred] += 1;
        }
        Ok(matrix)
    }

    /// Create from classified examples
    pub fn from_examples(examples: &[LabeledExample]) -> Result<Self> {
        let num_classes = examples.first().map_or(0, LabeledExample::num_classes);
        let predictions = examples
            .iter()
            .enumerate()
            .map(|(i, e)| {
                e.class_id()
                    .ok_or_else(|| NbError::MalformedInput(format!("example {} has not been classified", i)))
            })
            .collect::<Result<Vec<_>>>()?;
        let ground_truth: Vec<usize> = examples.iter().map(LabeledExample::true_label).collect();
        Self::from_predictions(&predictions, &ground_truth, num_classes)
    }

    pub fn num_classes(&self) -> usize {
        self.counts.len()
    }

    pub fn count(&self, truth: usize, predicted: usize) -> usize {
        self.counts[truth][predicted]
    }

    /// Total number of samples
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.num_classes()).map(|c| self.counts[c][c]).sum()
    }

    pub fn tp(&self, class: usize) -> usize {
        self.counts[class][class]
    }

    /// Predicted as `class` but labelled otherwise
    pub fn fp(&self, class: usize) -> usize {
        (0..self.num_classes())
            .filter(|t| *t != class)
            .map(|t| self.counts[t][class])
            .sum()
    }

    /// Labelled `class` but predicted otherwise
    pub fn fn_(&self, class: usize) -> usize {
        (0..self.num_classes())
            .filter(|p| *p != class)
            .map(|p| self.counts[class][p])
            .sum()
    }

    /// Number of examples whose true label is `class`
    pub fn support(&self, class: usize) -> usize {
        self.counts[class].iter().sum()
    }

    /// Whether `class` appears as a true label or a prediction
    pub fn is_present(&self, class: usize) -> bool {
        self.tp(class) + self.fp(class) + self.fn_(class) > 0
    }

    /// Accuracy: correct / total
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.correct() as f64 / total as f64
    }

    /// Precision: TP / (TP + FP)
    pub fn precision(&self, class: usize) -> f64 {
        let denom = self.tp(class) + self.fp(class);
        if denom == 0 {
            return 0.0;
        }
        self.tp(class) as f64 / denom as f64
    }

    /// Recall: TP / (TP + FN)
    pub fn recall(&self, class: usize) -> f64 {
        let denom = self.tp(class) + self.fn_(class);
        if denom == 0 {
            return 0.0;
        }
        self.tp(class) as f64 / denom as f64
    }

    /// F1 Score: 2 * (Precision * Recall) / (Precision + Recall)
    pub fn f1_score(&self, class: usize) -> f64 {
        let precision = self.precision(class);
        let recall = self.recall(class);
        let denom = precision + recall;
        if denom == 0.0 {
            return 0.0;
        }
        2.0 * precision * recall / denom
    }

    /// Mean F1 over the classes present in the matrix
    pub fn macro_f1(&self) -> f64 {
        let present: Vec<usize> = (0..self.num_classes()).filter(|c| self.is_present(*c)).collect();
        if present.is_empty() {
            return 0.0;
        }
        present.iter().map(|c| self.f1_score(*c)).sum::<f64>() / present.len() as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Full classification report with all metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub confusion_matrix: ConfusionMatrix,
    pub accuracy: f64,
    pub zero_one_loss: f64,
    pub macro_f1: f64,
    pub f1_loss: f64,
    /// Indexed by class id
    pub per_class: Vec<ClassMetrics>,
    pub support: usize,
}

impl ClassificationReport {
    /// Generate full report from confusion matrix
    pub fn from_confusion_matrix(cm: ConfusionMatrix) -> Result<Self> {
        if cm.total() == 0 {
            return Err(NbError::DivisionByZero("no classified examples to score".to_string()));
        }
        let per_class = (0..cm.num_classes())
            .map(|c| ClassMetrics {
                precision: cm.precision(c),
                recall: cm.recall(c),
                f1_score: cm.f1_score(c),
                support: cm.support(c),
            })
            .collect();
        let accuracy = cm.accuracy();
        let macro_f1 = cm.macro_f1();
        Ok(Self {
            accuracy,
            zero_one_loss: 1.0 - accuracy,
            macro_f1,
            f1_loss: 1.0 - macro_f1,
            per_class,
            support: cm.total(),
            confusion_matrix: cm,
        })
    }

    /// Generate report from classified examples
    pub fn from_examples(examples: &[LabeledExample]) -> Result<Self> {
        Self::from_confusion_matrix(ConfusionMatrix::from_examples(examples)?)
    }

    /// Format as a human-readable string
    pub fn format(&self, class_names: &[String]) -> String {
        let label = |c: usize| class_names.get(c).cloned().unwrap_or_else(|| c.to_string());

        let mut output = format!(
            r#"Classification Report
=====================
Accuracy:       {:.4} ({:.2}%)
Zero-One Loss:  {:.4}
Macro F1:       {:.4}
F1 Loss:        {:.4}
Support:        {}

Per-Class Metrics:
"#,
            self.accuracy,
            self.accuracy * 100.0,
            self.zero_one_loss,
            self.macro_f1,
            self.f1_loss,
            self.support,
        );
        for (c, metrics) in self.per_class.iter().enumerate() {
            output.push_str(&format!(
                "  {}: P={:.4} R={:.4} F1={:.4} (n={})\n",
                label(c),
                metrics.precision,
                metrics.recall,
                metrics.f1_score,
                metrics.support
            ));
        }

        output.push_str("\nConfusion Matrix (rows = actual, columns = predicted):\n");
        let n = self.confusion_matrix.num_classes();
        for t in 0..n {
            output.push_str(&format!("{:>6}", t));
            for p in 0..n {
                output.push_str(&format!(" {:>6}", self.confusion_matrix.count(t, p)));
            }
            output.push('\n');
        }
        output
    }
}

/// 1 - (correct predictions / total)
pub fn zero_one_loss(classified: &[LabeledExample]) -> Result<f64> {
    if classified.is_empty() {
        return Err(NbError::DivisionByZero("zero-one loss of an empty set".to_string()));
    }
    let cm = ConfusionMatrix::from_examples(classified)?;
    Ok(1.0 - cm.accuracy())
}

/// 1 - macro-averaged F1
pub fn f1_score_loss(classified: &[LabeledExample]) -> Result<f64> {
    if classified.is_empty() {
        return Err(NbError::DivisionByZero("F1 loss of an empty set".to_string()));
    }
    let cm = ConfusionMatrix::from_examples(classified)?;
    Ok(1.0 - cm.macro_f1())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    fn schema(num_classes: usize) -> Schema {
        let names = (0..num_classes).map(|c| format!("class_{}", c)).collect();
        Schema::discrete("metrics", names, 1, 0, 1)
    }

    /// Examples with the given true labels, classified as `predicted`
    fn classified(truth: &[usize], predicted: &[usize], num_classes: usize) -> Vec<LabeledExample> {
        let schema = schema(num_classes);
        truth
            .iter()
            .zip(predicted)
            .map(|(t, p)| {
                let mut e = LabeledExample::unlabeled(vec![0, *t], &schema).unwrap();
                e.set_class(*p).unwrap();
                e
            })
            .collect()
    }

    #[test]
    fn test_all_correct() {
        let examples = classified(&[0, 1, 1, 0], &[0, 1, 1, 0], 2);
        assert!(zero_one_loss(&examples).unwrap().abs() < 1e-9);
        assert!(f1_score_loss(&examples).unwrap().abs() < 1e-9);
    }

    #[test]
    fn test_all_wrong() {
        let examples = classified(&[0, 1, 1, 0], &[1, 0, 0, 1], 2);
        assert!((zero_one_loss(&examples).unwrap() - 1.0).abs() < 1e-9);
        assert!((f1_score_loss(&examples).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_confusion_counts() {
        let cm = ConfusionMatrix::from_predictions(&[0, 1, 1, 2, 0], &[0, 1, 2, 2, 1], 3).unwrap();
        assert_eq!(cm.total(), 5);
        assert_eq!(cm.correct(), 3);
        assert_eq!(cm.tp(1), 1);
        assert_eq!(cm.fp(1), 1);
        assert_eq!(cm.fn_(1), 1);
        assert_eq!(cm.support(2), 2);
        assert!((cm.precision(0) - 0.5).abs() < 1e-9);
        assert!((cm.recall(0) - 1.0).abs() < 1e-9);
        assert!((cm.f1_score(0) - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_absent_class_excluded_from_macro() {
        // class 2 never occurs: macro F1 averages classes 0 and 1 only
        let examples = classified(&[0, 0, 1, 1], &[0, 0, 1, 1], 3);
        assert!(f1_score_loss(&examples).unwrap().abs() < 1e-9);
    }

    #[test]
    fn test_class_never_predicted_counts_as_zero() {
        // class 1 present but never predicted: F1_1 = 0, F1_0 = 2/3
        let examples = classified(&[0, 1], &[0, 0], 2);
        let loss = f1_score_loss(&examples).unwrap();
        assert!((loss - (1.0 - (2.0 / 3.0) / 2.0)).abs() < 1e-9);
        assert!((zero_one_loss(&examples).unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_set() {
        assert!(matches!(zero_one_loss(&[]), Err(NbError::DivisionByZero(_))));
        assert!(matches!(f1_score_loss(&[]), Err(NbError::DivisionByZero(_))));
    }

    #[test]
    fn test_unclassified_rejected() {
        let schema = schema(2);
        let examples = vec![LabeledExample::unlabeled(vec![0, 1], &schema).unwrap()];
        assert!(matches!(zero_one_loss(&examples), Err(NbError::MalformedInput(_))));
    }

    #[test]
    fn test_classification_report_format() {
        let examples = classified(&[0, 1, 1, 0], &[0, 1, 0, 0], 2);
        let report = ClassificationReport::from_examples(&examples).unwrap();
        assert!((report.zero_one_loss - 0.25).abs() < 1e-9);
        assert_eq!(report.per_class[1].support, 2);

        let formatted = report.format(&["benign".to_string(), "malignant".to_string()]);
        assert!(formatted.contains("Classification Report"));
        assert!(formatted.contains("malignant"));
        assert!(formatted.contains("Confusion Matrix"));
    }
}
