// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Labeled examples: one processed row bound to a dataset's class table

use crate::error::{NbError, Result};
use crate::schema::Schema;
use serde::{Deserialize, Serialize};

/// A processed row plus its assigned class.
///
/// `class_id` is set from the row's trailing label for training examples,
/// or later by a classifier for test examples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledExample {
    /// Attribute values followed by the true class id
    row: Vec<usize>,
    class_id: Option<usize>,
    num_classes: usize,
}

impl LabeledExample {
    fn checked(row: Vec<usize>, schema: &Schema) -> Result<Self> {
        schema.validate_row(&row)?;
        Ok(Self {
            row,
            class_id: None,
            num_classes: schema.num_classes(),
        })
    }

    /// Training example: class id taken from the trailing label
    pub fn labeled(row: Vec<usize>, schema: &Schema) -> Result<Self> {
        let mut example = Self::checked(row, schema)?;
        example.class_id = Some(example.true_label());
        Ok(example)
    }

    /// Test example: class id left unset until classified
    pub fn unlabeled(row: Vec<usize>, schema: &Schema) -> Result<Self> {
        Self::checked(row, schema)
    }

    /// Attribute values, without the class label
    pub fn features(&self) -> &[usize] {
        &self.row[..self.row.len() - 1]
    }

    /// Class id recorded in the row itself
    pub fn true_label(&self) -> usize {
        self.row[self.row.len() - 1]
    }

    pub fn row(&self) -> &[usize] {
        &self.row
    }

    pub fn class_id(&self) -> Option<usize> {
        self.class_id
    }

    /// Size of the class-name table this example is bound to
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn is_classified(&self) -> bool {
        self.class_id.is_some()
    }

    /// Assign a class id; out-of-range ids are a domain error
    pub fn set_class(&mut self, class_id: usize) -> Result<()> {
        if class_id >= self.num_classes {
            return Err(NbError::domain("class id", class_id, format!("0..{}", self.num_classes)));
        }
        self.class_id = Some(class_id);
        Ok(())
    }

    /// Class name of the assigned class, looked up in the schema's table
    pub fn class_name<'a>(&self, schema: &'a Schema) -> Option<&'a str> {
        self.class_id.and_then(|id| schema.class_name(id))
    }

    /// Whether the assigned class matches the true label
    pub fn is_correct(&self) -> bool {
        self.class_id == Some(self.true_label())
    }
}

/// Build training examples from processed rows
pub fn labeled_examples(rows: &[Vec<usize>], schema: &Schema) -> Result<Vec<LabeledExample>> {
    rows.iter().map(|row| LabeledExample::labeled(row.clone(), schema)).collect()
}

/// Build unclassified test examples from processed rows
pub fn unlabeled_examples(rows: &[Vec<usize>], schema: &Schema) -> Result<Vec<LabeledExample>> {
    rows.iter().map(|row| LabeledExample::unlabeled(row.clone(), schema)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::discrete("toy", vec!["red".into(), "blue".into()], 2, 0, 2)
    }

    #[test]
    fn test_labeled_takes_trailing_label() {
        let schema = schema();
        let e = LabeledExample::labeled(vec![2, 0, 1], &schema).unwrap();
        assert_eq!(e.features(), &[2, 0]);
        assert_eq!(e.true_label(), 1);
        assert_eq!(e.class_id(), Some(1));
        assert_eq!(e.class_name(&schema), Some("blue"));
        assert!(e.is_correct());
    }

    #[test]
    fn test_unlabeled_starts_unclassified() {
        let schema = schema();
        let mut e = LabeledExample::unlabeled(vec![2, 0, 1], &schema).unwrap();
        assert!(!e.is_classified());
        assert_eq!(e.class_name(&schema), None);

        e.set_class(0).unwrap();
        assert_eq!(e.class_name(&schema), Some("red"));
        assert!(!e.is_correct());
    }

    #[test]
    fn test_set_class_out_of_range() {
        let schema = schema();
        let mut e = LabeledExample::unlabeled(vec![0, 0, 0], &schema).unwrap();
        assert!(matches!(e.set_class(2), Err(NbError::Domain { .. })));
        assert!(!e.is_classified());
    }

    #[test]
    fn test_construction_validates_row() {
        let schema = schema();
        assert!(LabeledExample::labeled(vec![0, 0], &schema).is_err());
        assert!(LabeledExample::labeled(vec![0, 0, 5], &schema).is_err());
        assert!(LabeledExample::unlabeled(vec![3, 0, 0], &schema).is_err());
    }
}
