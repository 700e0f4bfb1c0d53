// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Per-dataset schemas
//!
//! A `Schema` is a tagged configuration value describing one dataset:
//! - attribute count and per-attribute value domain
//! - class-name table (index = class id)
//! - raw file format rules (id column, label position, symbolic tokens,
//!   missing-value token, value shift, label lookup table)
//!
//! Every dataset runs through the same pipeline; only its schema differs.

use crate::error::{NbError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default bin count for continuous datasets
pub const DEFAULT_NUM_BINS: usize = 15;

/// Value space of a single attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueDomain {
    /// Pre-discrete values `min..=max`
    Range { min: usize, max: usize },
    /// Continuous values discretized into bins `1..=num_bins`
    Binned { num_bins: usize },
}

impl ValueDomain {
    /// Smallest legal value
    pub fn low(&self) -> usize {
        match self {
            ValueDomain::Range { min, .. } => *min,
            ValueDomain::Binned { .. } => 1,
        }
    }

    /// Largest legal value
    pub fn high(&self) -> usize {
        match self {
            ValueDomain::Range { max, .. } => *max,
            ValueDomain::Binned { num_bins } => *num_bins,
        }
    }

    /// Number of distinct legal values
    pub fn cardinality(&self) -> usize {
        (self.high() + 1).saturating_sub(self.low())
    }

    pub fn contains(&self, value: usize) -> bool {
        value >= self.low() && value <= self.high()
    }

    /// Position of `value` inside the domain, if legal
    pub fn index_of(&self, value: usize) -> Option<usize> {
        self.contains(value).then(|| value - self.low())
    }

    pub fn is_binned(&self) -> bool {
        matches!(self, ValueDomain::Binned { .. })
    }

    /// Human-readable range, e.g. `0..=9`
    pub fn describe(&self) -> String {
        format!("{}..={}", self.low(), self.high())
    }
}

/// Column holding the class label in a raw file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPosition {
    First,
    Last,
}

/// Raw file format rules for one dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFormat {
    /// Drop a leading example-id column
    pub drop_leading_id: bool,
    pub label_position: LabelPosition,
    /// Symbolic attribute tokens and the value each maps to
    #[serde(default)]
    pub token_values: BTreeMap<String, usize>,
    /// Token marking a missing value, filled from the attribute's domain
    #[serde(default)]
    pub missing_token: Option<String>,
    /// Constant added to every numeric attribute value
    #[serde(default)]
    pub value_shift: i64,
    /// Raw label token -> class id
    pub label_table: BTreeMap<String, usize>,
}

impl RawFormat {
    /// Format of an already processed matrix: integer attributes, integer
    /// class id in the last column
    pub fn processed(num_classes: usize) -> Self {
        Self {
            drop_leading_id: false,
            label_position: LabelPosition::Last,
            token_values: BTreeMap::new(),
            missing_token: None,
            value_shift: 0,
            label_table: (0..num_classes).map(|c| (c.to_string(), c)).collect(),
        }
    }

    /// Map a raw label token to its class id
    pub fn class_id(&self, token: &str) -> Option<usize> {
        self.label_table.get(token.trim()).copied()
    }
}

/// Description of one dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub id: String,
    pub name: String,
    /// Raw file name this schema is registered for
    pub file_name: String,
    pub class_names: Vec<String>,
    pub domains: Vec<ValueDomain>,
    pub format: RawFormat,
}

fn table(entries: &[(&str, usize)]) -> BTreeMap<String, usize> {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

impl Schema {
    /// Schema for a pre-discrete matrix where every attribute shares `min..=max`
    pub fn discrete(id: &str, class_names: Vec<String>, num_attributes: usize, min: usize, max: usize) -> Self {
        let num_classes = class_names.len();
        Self {
            id: id.to_string(),
            name: id.to_string(),
            file_name: format!("{}.data", id),
            class_names,
            domains: vec![ValueDomain::Range { min, max }; num_attributes],
            format: RawFormat::processed(num_classes),
        }
    }

    /// Breast Cancer Wisconsin: id column, values 1..10 shifted to 0..9,
    /// `?` missing, labels 2 (benign) and 4 (malignant)
    pub fn cancer() -> Self {
        Self {
            id: "cancer".to_string(),
            name: "Breast Cancer Wisconsin".to_string(),
            file_name: "breast-cancer-wisconsin.data".to_string(),
            class_names: names(&["Benign", "Malignant"]),
            domains: vec![ValueDomain::Range { min: 0, max: 9 }; 9],
            format: RawFormat {
                drop_leading_id: true,
                label_position: LabelPosition::Last,
                token_values: BTreeMap::new(),
                missing_token: Some("?".to_string()),
                value_shift: -1,
                label_table: table(&[("2", 0), ("4", 1)]),
            },
        }
    }

    /// Glass Identification: id column, nine continuous attributes
    pub fn glass() -> Self {
        Self {
            id: "glass".to_string(),
            name: "Glass Identification".to_string(),
            file_name: "glass.data".to_string(),
            class_names: names(&[
                "building_windows_float_processed",
                "building_windows_non_float_processed",
                "vehicle_windows_float_processed",
                "vehicle_windows_non_float_processed",
                "containers",
                "tableware",
                "headlamps",
            ]),
            domains: vec![ValueDomain::Binned { num_bins: DEFAULT_NUM_BINS }; 9],
            format: RawFormat {
                drop_leading_id: true,
                label_position: LabelPosition::Last,
                token_values: BTreeMap::new(),
                missing_token: None,
                value_shift: 0,
                label_table: table(&[("1", 0), ("2", 1), ("3", 2), ("4", 3), ("5", 4), ("6", 5), ("7", 6)]),
            },
        }
    }

    /// Congressional Voting Records: label first, `?` is a real vote value
    pub fn votes() -> Self {
        Self {
            id: "votes".to_string(),
            name: "Congressional Voting Records".to_string(),
            file_name: "house-votes-84.data".to_string(),
            class_names: names(&["Republican", "Democrat"]),
            domains: vec![ValueDomain::Range { min: 0, max: 2 }; 16],
            format: RawFormat {
                drop_leading_id: false,
                label_position: LabelPosition::First,
                token_values: table(&[("?", 0), ("y", 1), ("n", 2)]),
                missing_token: None,
                value_shift: 0,
                label_table: table(&[("republican", 0), ("democrat", 1)]),
            },
        }
    }

    /// Iris: four continuous attributes, label by species name
    pub fn iris() -> Self {
        Self {
            id: "iris".to_string(),
            name: "Iris".to_string(),
            file_name: "iris.data".to_string(),
            class_names: names(&["Iris-setosa", "Iris-versicolor", "Iris-virginica"]),
            domains: vec![ValueDomain::Binned { num_bins: DEFAULT_NUM_BINS }; 4],
            format: RawFormat {
                drop_leading_id: false,
                label_position: LabelPosition::Last,
                token_values: BTreeMap::new(),
                missing_token: None,
                value_shift: 0,
                label_table: table(&[("Iris-setosa", 0), ("Iris-versicolor", 1), ("Iris-virginica", 2)]),
            },
        }
    }

    /// Small Soybean: 35 discrete attributes in 0..=6
    pub fn soybean() -> Self {
        Self {
            id: "soybean".to_string(),
            name: "Soybean (Small)".to_string(),
            file_name: "soybean-small.data".to_string(),
            class_names: names(&["D1", "D2", "D3", "D4"]),
            domains: vec![ValueDomain::Range { min: 0, max: 6 }; 35],
            format: RawFormat {
                drop_leading_id: false,
                label_position: LabelPosition::Last,
                token_values: BTreeMap::new(),
                missing_token: None,
                value_shift: 0,
                label_table: table(&[("D1", 0), ("D2", 1), ("D3", 2), ("D4", 3)]),
            },
        }
    }

    /// All built-in dataset schemas
    pub fn builtins() -> Vec<Schema> {
        vec![Self::cancer(), Self::glass(), Self::votes(), Self::iris(), Self::soybean()]
    }

    pub fn by_id(id: &str) -> Result<Schema> {
        Self::builtins()
            .into_iter()
            .find(|s| s.id.eq_ignore_ascii_case(id))
            .ok_or_else(|| NbError::InvalidParameter(format!("unknown dataset '{}'", id)))
    }

    pub fn by_file_name(file_name: &str) -> Result<Schema> {
        Self::builtins()
            .into_iter()
            .find(|s| s.file_name == file_name)
            .ok_or_else(|| NbError::InvalidParameter(format!("no dataset registered for file '{}'", file_name)))
    }

    pub fn num_attributes(&self) -> usize {
        self.domains.len()
    }

    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    /// Width of a processed row: attributes plus trailing class id
    pub fn row_width(&self) -> usize {
        self.num_attributes() + 1
    }

    pub fn class_name(&self, class_id: usize) -> Option<&str> {
        self.class_names.get(class_id).map(String::as_str)
    }

    pub fn is_binned(&self) -> bool {
        self.domains.iter().any(ValueDomain::is_binned)
    }

    /// Replace the bin count of every binned attribute
    pub fn with_num_bins(mut self, num_bins: usize) -> Result<Self> {
        if num_bins == 0 {
            return Err(NbError::InvalidParameter("num_bins must be at least 1".to_string()));
        }
        for domain in &mut self.domains {
            if domain.is_binned() {
                *domain = ValueDomain::Binned { num_bins };
            }
        }
        Ok(self)
    }

    /// Check width, attribute domains and class id of one processed row
    pub fn validate_row(&self, row: &[usize]) -> Result<()> {
        if row.len() != self.row_width() {
            return Err(NbError::MalformedInput(format!(
                "expected {} columns for dataset '{}', found {}",
                self.row_width(),
                self.id,
                row.len()
            )));
        }
        for (j, (value, domain)) in row.iter().zip(&self.domains).enumerate() {
            if !domain.contains(*value) {
                return Err(NbError::domain(format!("attribute {}", j), value, domain.describe()));
            }
        }
        let label = row[self.num_attributes()];
        if label >= self.num_classes() {
            return Err(NbError::domain("class id", label, format!("0..{}", self.num_classes())));
        }
        Ok(())
    }

    /// Validate every row of a processed matrix
    pub fn validate_rows(&self, rows: &[Vec<usize>]) -> Result<()> {
        rows.iter().try_for_each(|row| self.validate_row(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_bounds() {
        let range = ValueDomain::Range { min: 0, max: 9 };
        assert_eq!(range.cardinality(), 10);
        assert_eq!(range.index_of(0), Some(0));
        assert_eq!(range.index_of(9), Some(9));
        assert_eq!(range.index_of(10), None);

        let binned = ValueDomain::Binned { num_bins: 15 };
        assert_eq!(binned.cardinality(), 15);
        assert_eq!(binned.index_of(0), None);
        assert_eq!(binned.index_of(1), Some(0));
        assert_eq!(binned.index_of(15), Some(14));
        assert_eq!(binned.describe(), "1..=15");
    }

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(Schema::by_id("iris").unwrap().num_attributes(), 4);
        assert_eq!(Schema::by_id("SOYBEAN").unwrap().num_classes(), 4);
        assert_eq!(Schema::by_file_name("house-votes-84.data").unwrap().id, "votes");
        assert!(Schema::by_id("mushroom").is_err());
    }

    #[test]
    fn test_label_table_is_lookup() {
        let cancer = Schema::cancer();
        assert_eq!(cancer.format.class_id("2"), Some(0));
        assert_eq!(cancer.format.class_id("4\n"), Some(1));
        assert_eq!(cancer.format.class_id("3"), None);
        assert_eq!(cancer.class_name(1), Some("Malignant"));
    }

    #[test]
    fn test_validate_row() {
        let schema = Schema::discrete("toy", vec!["a".into(), "b".into()], 2, 0, 2);
        assert!(schema.validate_row(&[0, 2, 1]).is_ok());
        assert!(matches!(schema.validate_row(&[0, 2]), Err(NbError::MalformedInput(_))));
        assert!(matches!(schema.validate_row(&[0, 3, 1]), Err(NbError::Domain { .. })));
        assert!(matches!(schema.validate_row(&[0, 1, 2]), Err(NbError::Domain { .. })));
    }

    #[test]
    fn test_with_num_bins() {
        let iris = Schema::iris().with_num_bins(5).unwrap();
        assert!(iris.domains.iter().all(|d| *d == ValueDomain::Binned { num_bins: 5 }));
        let votes = Schema::votes().with_num_bins(5).unwrap();
        assert_eq!(votes.domains[0], ValueDomain::Range { min: 0, max: 2 });
        assert!(Schema::iris().with_num_bins(0).is_err());
    }
}
