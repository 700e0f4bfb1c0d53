// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Dataset loading and preprocessing for Naive Bayes evaluation
//!
//! Raw files are read according to their `Schema` (id column, label
//! position, symbolic tokens, missing values), continuous attributes are
//! discretized, and the result is the uniform integer matrix consumed by
//! training and cross-validation: one row per example, attribute values
//! followed by the class id.

use crate::discretize::Discretizer;
use crate::error::NbError;
use crate::schema::{LabelPosition, Schema, ValueDomain};
use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::Path;

/// Parsed raw file: attribute values before discretization, plus class ids
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub values: Vec<Vec<f64>>,
    pub labels: Vec<usize>,
}

/// Parse one raw record into attribute values and a class id
fn parse_record<R: Rng + ?Sized>(
    fields: &[&str],
    schema: &Schema,
    rng: &mut R,
    line: usize,
) -> std::result::Result<(Vec<f64>, usize), NbError> {
    let format = &schema.format;
    let mut fields = fields;
    if format.drop_leading_id {
        fields = fields.get(1..).unwrap_or_default();
    }
    let (label_token, attributes) = match format.label_position {
        LabelPosition::First => fields.split_first(),
        LabelPosition::Last => fields.split_last(),
    }
    .ok_or_else(|| NbError::MalformedInput(format!("line {}: no class label", line)))?;

    if attributes.len() != schema.num_attributes() {
        return Err(NbError::MalformedInput(format!(
            "line {}: expected {} attributes, found {}",
            line,
            schema.num_attributes(),
            attributes.len()
        )));
    }

    let class_id = format.class_id(label_token).ok_or_else(|| {
        NbError::MalformedInput(format!("line {}: unknown class label '{}'", line, label_token.trim()))
    })?;

    let mut values = Vec::with_capacity(attributes.len());
    for (token, domain) in attributes.iter().map(|t| t.trim()).zip(&schema.domains) {
        let value = if format.missing_token.as_deref() == Some(token) {
            rng.gen_range(domain.low()..=domain.high()) as f64
        } else if let Some(mapped) = format.token_values.get(token) {
            *mapped as f64
        } else {
            let parsed: f64 = token.parse().map_err(|_| {
                NbError::MalformedInput(format!("line {}: cannot parse '{}' as a number", line, token))
            })?;
            parsed + format.value_shift as f64
        };
        values.push(value);
    }

    Ok((values, class_id))
}

impl RawTable {
    /// Parse raw records (already split into fields)
    pub fn from_records<R: Rng + ?Sized>(
        records: &[Vec<String>],
        schema: &Schema,
        rng: &mut R,
    ) -> std::result::Result<Self, NbError> {
        let mut values = Vec::with_capacity(records.len());
        let mut labels = Vec::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            let fields: Vec<&str> = record.iter().map(String::as_str).collect();
            let (row, label) = parse_record(&fields, schema, rng, idx + 1)?;
            values.push(row);
            labels.push(label);
        }
        Ok(Self { values, labels })
    }

    /// Read a raw comma-separated data file
    pub fn load<R: Rng + ?Sized>(path: &Path, schema: &Schema, rng: &mut R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to open data file: {}", path.display()))?;

        let mut records = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result.with_context(|| format!("Failed to read record {} in {}", idx, path.display()))?;
            if record.iter().all(|field| field.trim().is_empty()) {
                tracing::warn!("Skipping blank record {} in {}", idx, path.display());
                continue;
            }
            records.push(record.iter().map(str::to_string).collect());
        }

        let table = Self::from_records(&records, schema, rng)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::info!(
            "Read {} records with {} attributes from {}",
            table.values.len(),
            schema.num_attributes(),
            path.display()
        );
        Ok(table)
    }

    /// Convert to the integer matrix, binning continuous attributes.
    ///
    /// Returns the matrix and, for binned schemas, the bin documentation.
    pub fn into_matrix(self, schema: &Schema) -> std::result::Result<(Vec<Vec<usize>>, Option<String>), NbError> {
        let (mut rows, doc) = if schema.is_binned() {
            let num_bins = uniform_bin_count(schema)?;
            let discretizer = Discretizer::fit(&self.values, num_bins)?;
            (discretizer.transform(&self.values)?, Some(discretizer.describe()))
        } else {
            let rows = self
                .values
                .iter()
                .enumerate()
                .map(|(i, row)| {
                    row.iter()
                        .map(|v| discrete_value(*v, i))
                        .collect::<std::result::Result<Vec<usize>, NbError>>()
                })
                .collect::<std::result::Result<Vec<Vec<usize>>, NbError>>()?;
            (rows, None)
        };

        for (row, label) in rows.iter_mut().zip(self.labels) {
            row.push(label);
        }
        schema.validate_rows(&rows)?;
        Ok((rows, doc))
    }
}

fn uniform_bin_count(schema: &Schema) -> std::result::Result<usize, NbError> {
    let mut counts = schema.domains.iter().map(|d| match d {
        ValueDomain::Binned { num_bins } => Some(*num_bins),
        ValueDomain::Range { .. } => None,
    });
    let first = counts.next().flatten();
    match first {
        Some(n) if counts.all(|c| c == Some(n)) => Ok(n),
        _ => Err(NbError::InvalidParameter(format!(
            "dataset '{}' mixes binned and discrete attributes",
            schema.id
        ))),
    }
}

fn discrete_value(value: f64, row: usize) -> std::result::Result<usize, NbError> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Ok(value as usize)
    } else {
        Err(NbError::MalformedInput(format!(
            "row {} has value {}, expected a non-negative integer",
            row, value
        )))
    }
}

/// A loaded dataset ready for evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub schema: Schema,
    /// Attribute values followed by the class id
    pub rows: Vec<Vec<usize>>,
    /// Bin boundaries, for datasets with continuous attributes
    pub bin_documentation: Option<String>,
}

impl Dataset {
    /// Wrap already processed rows, validating them against the schema
    pub fn from_rows(schema: Schema, rows: Vec<Vec<usize>>) -> std::result::Result<Self, NbError> {
        schema.validate_rows(&rows)?;
        Ok(Self {
            schema,
            rows,
            bin_documentation: None,
        })
    }

    /// Load and discretize a raw data file
    pub fn load<R: Rng + ?Sized>(path: &Path, schema: Schema, rng: &mut R) -> Result<Self> {
        let table = RawTable::load(path, &schema, rng)?;
        let (rows, bin_documentation) = table
            .into_matrix(&schema)
            .with_context(|| format!("Failed to preprocess {}", path.display()))?;
        if bin_documentation.is_some() {
            tracing::info!("Discretized {} attributes of '{}'", schema.num_attributes(), schema.id);
        }
        Ok(Self {
            schema,
            rows,
            bin_documentation,
        })
    }

    /// Load an already processed matrix
    pub fn load_processed(path: &Path, schema: Schema) -> Result<Self> {
        let rows = read_matrix(path)?;
        Self::from_rows(schema, rows).with_context(|| format!("Invalid processed data in {}", path.display()))
    }

    /// Class-correlated synthetic dataset for development/testing
    pub fn synthetic(num_rows: usize, num_attributes: usize, num_values: usize, num_classes: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let num_values = num_values.max(1);
        let num_classes = num_classes.max(1);

        let class_names = (0..num_classes).map(|c| format!("class_{}", c)).collect();
        let mut schema = Schema::discrete("synthetic", class_names, num_attributes, 0, num_values - 1);
        schema.name = "Synthetic Test Dataset".to_string();

        let rows = (0..num_rows)
            .map(|_| {
                let class_id = rng.gen_range(0..num_classes);
                let mut row: Vec<usize> = (0..num_attributes)
                    .map(|j| {
                        if rng.gen_bool(0.7) {
                            (class_id + j) % num_values
                        } else {
                            rng.gen_range(0..num_values)
                        }
                    })
                    .collect();
                row.push(class_id);
                row
            })
            .collect();

        Self {
            schema,
            rows,
            bin_documentation: None,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Shuffle row order in place
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.rows.shuffle(rng);
    }

    /// Number of rows per class id
    pub fn class_distribution(&self) -> Vec<usize> {
        let mut dist = vec![0; self.schema.num_classes()];
        for row in &self.rows {
            if let Some(count) = row.last().and_then(|c| dist.get_mut(*c)) {
                *count += 1;
            }
        }
        dist
    }
}

/// Read a processed matrix: comma-separated integers, one row per line
pub fn read_matrix(path: &Path) -> Result<Vec<Vec<usize>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open matrix file: {}", path.display()))?;

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read line {} in {}", idx + 1, path.display()))?;
        let row = record
            .iter()
            .map(|field| {
                let field = field.trim();
                field.parse::<usize>().map_err(|_| {
                    NbError::MalformedInput(format!("line {}: '{}' is not a non-negative integer", idx + 1, field))
                })
            })
            .collect::<std::result::Result<Vec<usize>, NbError>>()
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

/// Write a processed matrix as comma-separated lines
pub fn write_matrix(path: &Path, rows: &[Vec<usize>]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
