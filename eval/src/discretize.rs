// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Equal-frequency discretization of continuous attributes
//!
//! Each attribute column is sorted and split into `num_bins` contiguous
//! groups whose sizes differ by at most one (the first `N mod num_bins`
//! groups take the extra value). A group's upper edge is its largest value;
//! bin `j` covers `(upper_{j-1}, upper_j]`, and the first bin also admits
//! the column minimum.

use crate::error::{NbError, Result};
use serde::{Deserialize, Serialize};

/// One half-open interval `(min, max]` and the bin id it maps to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinInterval {
    pub min: f64,
    pub max: f64,
    pub bin: usize,
}

/// Ordered bin intervals for one attribute. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinMap {
    intervals: Vec<BinInterval>,
}

impl BinMap {
    /// Build equal-frequency bins from a column of values.
    ///
    /// `num_bins` is clamped to the number of values.
    pub fn build(values: &[f64], num_bins: usize) -> Result<Self> {
        if num_bins == 0 {
            return Err(NbError::InvalidParameter("num_bins must be at least 1".to_string()));
        }
        if values.is_empty() {
            return Err(NbError::MalformedInput("cannot bin an empty column".to_string()));
        }
        if let Some(bad) = values.iter().find(|v| v.is_nan()) {
            return Err(NbError::domain("continuous", bad, "a finite number"));
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let num_bins = num_bins.min(n);
        let per_bin = n / num_bins;
        let left_over = n % num_bins;

        let mut intervals = Vec::with_capacity(num_bins);
        let mut lower = sorted[0];
        let mut end = 0;
        for j in 0..num_bins {
            end += per_bin + usize::from(j < left_over);
            let upper = sorted[end - 1];
            intervals.push(BinInterval {
                min: lower,
                max: upper,
                bin: j + 1,
            });
            lower = upper;
        }

        Ok(Self { intervals })
    }

    pub fn intervals(&self) -> &[BinInterval] {
        &self.intervals
    }

    pub fn num_bins(&self) -> usize {
        self.intervals.len()
    }

    /// Bin id for `value`.
    ///
    /// Values below the first interval clamp to bin 1 and values above the
    /// last clamp to the last bin. NaN is a domain error.
    pub fn apply(&self, value: f64) -> Result<usize> {
        if value.is_nan() {
            return Err(NbError::domain("continuous", value, "a finite number"));
        }
        let (first, last) = match (self.intervals.first(), self.intervals.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(NbError::InvalidParameter("bin map has no intervals".to_string())),
        };

        // first interval is closed on the left; anything below it clamps here
        if value <= first.max {
            return Ok(first.bin);
        }
        if value > last.max {
            return Ok(last.bin);
        }
        self.intervals
            .iter()
            .find(|iv| iv.min < value && value <= iv.max)
            .map(|iv| iv.bin)
            .ok_or_else(|| {
                NbError::domain(
                    "continuous",
                    value,
                    format!("[{}, {}]", first.min, last.max),
                )
            })
    }
}

/// Build the bin map for one attribute column
pub fn build_bins(column_values: &[f64], num_bins: usize) -> Result<BinMap> {
    BinMap::build(column_values, num_bins)
}

/// Bin id of `value` under `bin_map`
pub fn apply_bins(value: f64, bin_map: &BinMap) -> Result<usize> {
    bin_map.apply(value)
}

/// Render bin boundaries, one block per attribute, bins in id order
pub fn describe(bin_maps: &[BinMap]) -> String {
    let mut doc = String::new();
    for (i, bin_map) in bin_maps.iter().enumerate() {
        doc.push_str(&format!("Feature {} bins:\n", i + 1));
        for iv in bin_map.intervals() {
            doc.push_str(&format!("  {}: ({:.5},{:.5})\n", iv.bin, iv.min, iv.max));
        }
        doc.push('\n');
    }
    doc
}

/// Per-attribute bin maps fitted on a set of attribute rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discretizer {
    bin_maps: Vec<BinMap>,
}

impl Discretizer {
    /// Fit one bin map per column of `rows` (attribute values only)
    pub fn fit(rows: &[Vec<f64>], num_bins: usize) -> Result<Self> {
        let width = rows
            .first()
            .map(Vec::len)
            .ok_or_else(|| NbError::MalformedInput("cannot discretize an empty matrix".to_string()))?;

        let mut bin_maps = Vec::with_capacity(width);
        for j in 0..width {
            let column = column(rows, j, width)?;
            bin_maps.push(BinMap::build(&column, num_bins)?);
        }

        tracing::debug!("Fitted {} bin maps with up to {} bins each", width, num_bins);
        Ok(Self { bin_maps })
    }

    pub fn bin_maps(&self) -> &[BinMap] {
        &self.bin_maps
    }

    /// Bin one attribute row
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<usize>> {
        if row.len() != self.bin_maps.len() {
            return Err(NbError::MalformedInput(format!(
                "expected {} attributes, found {}",
                self.bin_maps.len(),
                row.len()
            )));
        }
        row.iter()
            .zip(&self.bin_maps)
            .map(|(value, bin_map)| bin_map.apply(*value))
            .collect()
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<usize>>> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }

    /// Bin documentation for all fitted attributes
    pub fn describe(&self) -> String {
        describe(&self.bin_maps)
    }
}

fn column(rows: &[Vec<f64>], j: usize, width: usize) -> Result<Vec<f64>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            if row.len() != width {
                return Err(NbError::MalformedInput(format!(
                    "row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    width
                )));
            }
            Ok(row[j])
        })
        .collect()
}

/// Convert a float class-label cell into a class id
pub(crate) fn label_from_f64(value: f64, row: usize) -> Result<usize> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Ok(value as usize)
    } else {
        Err(NbError::MalformedInput(format!(
            "row {} has class label {}, expected a non-negative integer",
            row, value
        )))
    }
}

/// Discretize a raw matrix whose last column is the class label.
///
/// Returns the binned integer matrix (label carried through unchanged) and
/// the bin documentation.
pub fn discretize(raw: &[Vec<f64>], num_bins: usize) -> Result<(Vec<Vec<usize>>, String)> {
    let width = raw
        .first()
        .map(Vec::len)
        .ok_or_else(|| NbError::MalformedInput("cannot discretize an empty matrix".to_string()))?;
    if width < 2 {
        return Err(NbError::MalformedInput(
            "rows need at least one attribute and a class label".to_string(),
        ));
    }

    let mut attributes = Vec::with_capacity(raw.len());
    let mut labels = Vec::with_capacity(raw.len());
    for (i, row) in raw.iter().enumerate() {
        if row.len() != width {
            return Err(NbError::MalformedInput(format!(
                "row {} has {} columns, expected {}",
                i,
                row.len(),
                width
            )));
        }
        attributes.push(row[..width - 1].to_vec());
        labels.push(label_from_f64(row[width - 1], i)?);
    }

    let discretizer = Discretizer::fit(&attributes, num_bins)?;
    let mut binned = discretizer.transform(&attributes)?;
    for (row, label) in binned.iter_mut().zip(labels) {
        row.push(label);
    }

    Ok((binned, discretizer.describe()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_even_split() {
        let values: Vec<f64> = (1..=6).map(f64::from).collect();
        let bins = build_bins(&values, 3).unwrap();
        let edges: Vec<(f64, f64)> = bins.intervals().iter().map(|iv| (iv.min, iv.max)).collect();
        assert_eq!(edges, vec![(1.0, 2.0), (2.0, 4.0), (4.0, 6.0)]);
        assert_eq!(apply_bins(1.0, &bins).unwrap(), 1);
        assert_eq!(apply_bins(2.0, &bins).unwrap(), 1);
        assert_eq!(apply_bins(3.0, &bins).unwrap(), 2);
        assert_eq!(apply_bins(6.0, &bins).unwrap(), 3);
    }

    #[test]
    fn test_remainder_goes_to_first_bins() {
        // 7 values into 3 bins: sizes 3, 2, 2
        let values = [7.0, 1.0, 6.0, 2.0, 5.0, 3.0, 4.0];
        let bins = build_bins(&values, 3).unwrap();
        let uppers: Vec<f64> = bins.intervals().iter().map(|iv| iv.max).collect();
        assert_eq!(uppers, vec![3.0, 5.0, 7.0]);
    }

    #[test]
    fn test_num_bins_clamped_to_value_count() {
        let bins = build_bins(&[0.5, 0.1], 15).unwrap();
        assert_eq!(bins.num_bins(), 2);
        assert_eq!(apply_bins(0.1, &bins).unwrap(), 1);
        assert_eq!(apply_bins(0.5, &bins).unwrap(), 2);
    }

    #[test]
    fn test_out_of_range_clamps() {
        let bins = build_bins(&[1.0, 2.0, 3.0, 4.0], 2).unwrap();
        assert_eq!(apply_bins(-100.0, &bins).unwrap(), 1);
        assert_eq!(apply_bins(100.0, &bins).unwrap(), 2);
        assert!(matches!(apply_bins(f64::NAN, &bins), Err(NbError::Domain { .. })));
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(build_bins(&[1.0], 0), Err(NbError::InvalidParameter(_))));
        assert!(matches!(build_bins(&[], 3), Err(NbError::MalformedInput(_))));
        assert!(matches!(build_bins(&[1.0, f64::NAN], 1), Err(NbError::Domain { .. })));
    }

    #[test]
    fn test_describe_format() {
        let bins = build_bins(&[0.25, 1.5], 2).unwrap();
        let doc = describe(&[bins]);
        assert_eq!(doc, "Feature 1 bins:\n  1: (0.25000,0.25000)\n  2: (0.25000,1.50000)\n\n");
    }

    #[test]
    fn test_discretize_keeps_labels() {
        let raw = vec![
            vec![5.1, 3.5, 0.0],
            vec![4.9, 3.0, 0.0],
            vec![6.3, 3.3, 2.0],
            vec![5.8, 2.7, 1.0],
        ];
        let (binned, doc) = discretize(&raw, 2).unwrap();
        assert_eq!(binned.len(), 4);
        assert!(binned.iter().all(|row| row.len() == 3));
        assert_eq!(binned.iter().map(|r| r[2]).collect::<Vec<_>>(), vec![0, 0, 2, 1]);
        assert!(binned.iter().all(|r| (1..=2).contains(&r[0]) && (1..=2).contains(&r[1])));
        assert!(doc.contains("Feature 1 bins:"));
        assert!(doc.contains("Feature 2 bins:"));
        assert!(!doc.contains("Feature 3 bins:"));
    }

    #[test]
    fn test_discretize_rejects_bad_label() {
        let raw = vec![vec![1.0, 0.5], vec![2.0, 1.0]];
        assert!(matches!(discretize(&raw, 2), Err(NbError::MalformedInput(_))));
        let ragged = vec![vec![1.0, 0.0], vec![2.0]];
        assert!(matches!(discretize(&ragged, 2), Err(NbError::MalformedInput(_))));
    }

    proptest! {
        #[test]
        fn prop_every_training_value_binned(
            values in prop::collection::vec(-1.0e6f64..1.0e6, 1..200),
            num_bins in 1usize..20,
        ) {
            let bins = build_bins(&values, num_bins).unwrap();
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            prop_assert_eq!(apply_bins(min, &bins).unwrap(), 1);
            for v in &values {
                let bin = apply_bins(*v, &bins).unwrap();
                prop_assert!(bin >= 1 && bin <= bins.num_bins());
            }
        }

        #[test]
        fn prop_distinct_values_balanced(
            raw in prop::collection::btree_set(-10_000i32..10_000, 1..200),
            num_bins in 1usize..20,
        ) {
            let values: Vec<f64> = raw.iter().map(|v| f64::from(*v)).collect();
            let bins = build_bins(&values, num_bins).unwrap();
            let mut counts = vec![0usize; bins.num_bins()];
            for v in &values {
                counts[apply_bins(*v, &bins).unwrap() - 1] += 1;
            }
            let sizes: BTreeSet<usize> = counts.iter().copied().collect();
            let lo = *sizes.iter().next().unwrap();
            let hi = *sizes.iter().last().unwrap();
            prop_assert!(hi - lo <= 1);
        }
    }
}
