// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Classifiers over discrete attribute vectors
//!
//! Implements:
//! - Naive Bayes with Laplace smoothing (class prior plus per-class,
//!   per-attribute value likelihood tables)
//! - Majority class baseline (always predicts the most common training class)
//!
//! A model owns its tables. Each `train` call resets them, so a fresh or
//! re-trained model never carries counts over from an earlier training set.

use crate::error::{NbError, Result};
use crate::example::{labeled_examples, unlabeled_examples, LabeledExample};
use crate::schema::{Schema, ValueDomain};

/// Common interface for the models evaluated by cross-validation
pub trait Classifier {
    /// Fit the model on labeled examples, discarding any previous state
    fn train(&mut self, examples: &[LabeledExample]) -> Result<()>;

    /// Predict a class id for one attribute vector
    fn predict(&self, features: &[usize]) -> Result<usize>;

    /// Assign a predicted class id to every example
    fn classify(&self, examples: &mut [LabeledExample]) -> Result<()> {
        for example in examples.iter_mut() {
            let class_id = self.predict(example.features())?;
            example.set_class(class_id)?;
        }
        Ok(())
    }

    /// Get model name
    fn name(&self) -> &str;

    /// Get model description
    fn description(&self) -> &str;
}

/// Index of the first maximum; ties resolve to the lowest index
fn first_argmax(scores: &[f64]) -> usize {
    let mut best = 0;
    for (i, score) in scores.iter().enumerate().skip(1) {
        if *score > scores[best] {
            best = i;
        }
    }
    best
}

fn training_class(example: &LabeledExample, num_classes: usize) -> Result<usize> {
    let class_id = example
        .class_id()
        .ok_or_else(|| NbError::InvalidTrainingSet("training example has no class id".to_string()))?;
    if class_id >= num_classes {
        return Err(NbError::domain("class id", class_id, format!("0..{}", num_classes)));
    }
    Ok(class_id)
}

/// Naive Bayes over discrete attributes.
///
/// `likelihood[c][j][k]` is P(attribute j = k-th domain value | class c).
/// Scores are plain products of probabilities, so very wide attribute
/// vectors can underflow to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct NaiveBayes {
    domains: Vec<ValueDomain>,
    num_classes: usize,
    class_prior: Vec<f64>,
    likelihood: Vec<Vec<Vec<f64>>>,
    trained: bool,
}

impl NaiveBayes {
    pub fn new(schema: &Schema) -> Self {
        let mut model = Self {
            domains: schema.domains.clone(),
            num_classes: schema.num_classes(),
            class_prior: Vec::new(),
            likelihood: Vec::new(),
            trained: false,
        };
        model.reset();
        model
    }

    /// Zero class counts and set every likelihood cell to the smoothing count
    fn reset(&mut self) {
        self.class_prior = vec![0.0; self.num_classes];
        self.likelihood = (0..self.num_classes)
            .map(|_| self.domains.iter().map(|d| vec![1.0; d.cardinality()]).collect())
            .collect();
        self.trained = false;
    }

    pub fn num_attributes(&self) -> usize {
        self.domains.len()
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn class_prior(&self) -> &[f64] {
        &self.class_prior
    }

    /// Value distribution of one attribute under one class
    pub fn likelihood(&self, class_id: usize, attribute: usize) -> Option<&[f64]> {
        self.likelihood
            .get(class_id)
            .and_then(|per_attr| per_attr.get(attribute))
            .map(Vec::as_slice)
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    fn value_index(&self, attribute: usize, value: usize) -> Result<usize> {
        let domain = &self.domains[attribute];
        domain
            .index_of(value)
            .ok_or_else(|| NbError::domain(format!("attribute {}", attribute), value, domain.describe()))
    }

    fn check_width(&self, features: &[usize]) -> Result<()> {
        if features.len() != self.num_attributes() {
            return Err(NbError::MalformedInput(format!(
                "expected {} attributes, found {}",
                self.num_attributes(),
                features.len()
            )));
        }
        Ok(())
    }

    /// Unnormalized posterior `P(c) * prod_j P(x_j | c)` for every class
    pub fn scores(&self, features: &[usize]) -> Result<Vec<f64>> {
        if !self.trained {
            return Err(NbError::InvalidTrainingSet("model has not been trained".to_string()));
        }
        self.check_width(features)?;

        let indices = features
            .iter()
            .enumerate()
            .map(|(j, value)| self.value_index(j, *value))
            .collect::<Result<Vec<_>>>()?;

        Ok((0..self.num_classes)
            .map(|c| {
                indices
                    .iter()
                    .enumerate()
                    .fold(self.class_prior[c], |score, (j, k)| score * self.likelihood[c][j][*k])
            })
            .collect())
    }
}

impl Classifier for NaiveBayes {
    fn train(&mut self, examples: &[LabeledExample]) -> Result<()> {
        if examples.is_empty() {
            return Err(NbError::InvalidTrainingSet("no training examples".to_string()));
        }
        self.reset();

        for example in examples {
            let class_id = training_class(example, self.num_classes)?;
            let features = example.features();
            self.check_width(features)?;
            for (j, value) in features.iter().enumerate() {
                let k = self.value_index(j, *value)?;
                self.likelihood[class_id][j][k] += 1.0;
            }
            self.class_prior[class_id] += 1.0;
        }

        let n = examples.len() as f64;
        for prior in &mut self.class_prior {
            *prior /= n;
        }

        for per_attr in &mut self.likelihood {
            for counts in per_attr.iter_mut() {
                let total: f64 = counts.iter().sum();
                if total > 0.0 {
                    for cell in counts.iter_mut() {
                        *cell /= total;
                    }
                }
            }
        }

        self.trained = true;
        tracing::debug!(
            "Trained Naive Bayes on {} examples, priors {:?}",
            examples.len(),
            self.class_prior
        );
        Ok(())
    }

    fn predict(&self, features: &[usize]) -> Result<usize> {
        self.scores(features).map(|scores| first_argmax(&scores))
    }

    fn name(&self) -> &str {
        "NaiveBayes"
    }

    fn description(&self) -> &str {
        "Naive Bayes with Laplace smoothing over discrete attribute values"
    }
}

/// Majority class baseline: always predicts the most common training class
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MajorityBaseline {
    num_classes: usize,
    majority_class: Option<usize>,
}

impl MajorityBaseline {
    pub fn new(schema: &Schema) -> Self {
        Self {
            num_classes: schema.num_classes(),
            majority_class: None,
        }
    }

    pub fn majority_class(&self) -> Option<usize> {
        self.majority_class
    }
}

impl Classifier for MajorityBaseline {
    fn train(&mut self, examples: &[LabeledExample]) -> Result<()> {
        if examples.is_empty() {
            return Err(NbError::InvalidTrainingSet("no training examples".to_string()));
        }
        let mut counts = vec![0.0; self.num_classes];
        for example in examples {
            counts[training_class(example, self.num_classes)?] += 1.0;
        }
        self.majority_class = Some(first_argmax(&counts));
        Ok(())
    }

    fn predict(&self, _features: &[usize]) -> Result<usize> {
        self.majority_class
            .ok_or_else(|| NbError::InvalidTrainingSet("model has not been trained".to_string()))
    }

    fn name(&self) -> &str {
        "Majority"
    }

    fn description(&self) -> &str {
        "Always predicts the majority class from training data"
    }
}

/// Train Naive Bayes on `train` and classify `test`.
///
/// Returns the test rows with their trailing label replaced by the
/// predicted class id.
pub fn train_and_classify(train: &[Vec<usize>], test: &[Vec<usize>], schema: &Schema) -> Result<Vec<Vec<usize>>> {
    let training = labeled_examples(train, schema)?;
    let mut testing = unlabeled_examples(test, schema)?;

    let mut model = NaiveBayes::new(schema);
    model.train(&training)?;
    model.classify(&mut testing)?;

    testing
        .iter()
        .map(|example| {
            let class_id = example
                .class_id()
                .ok_or_else(|| NbError::InvalidTrainingSet("example left unclassified".to_string()))?;
            let mut row = example.features().to_vec();
            row.push(class_id);
            Ok(row)
        })
        .collect()
}
