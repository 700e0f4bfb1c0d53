// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Attribute noise injection
//!
//! Picks `ceil(fraction * num_attributes)` attribute columns at random and
//! permutes the values within each chosen column across rows. The class
//! column is never touched.

use crate::error::{NbError, Result};
use rand::seq::{index, SliceRandom};
use rand::Rng;

/// Fraction used when the requested one is outside `(0, 1)`
pub const DEFAULT_NOISE_FRACTION: f64 = 0.10;

/// Noisy copy of a dataset and the attribute columns that were shuffled
#[derive(Debug, Clone, PartialEq)]
pub struct NoisyDataset {
    pub rows: Vec<Vec<usize>>,
    /// Shuffled attribute indices, ascending
    pub noisy_columns: Vec<usize>,
}

fn effective_fraction(noise_fraction: f64) -> f64 {
    if noise_fraction > 0.0 && noise_fraction < 1.0 {
        noise_fraction
    } else {
        tracing::warn!(
            "Noise fraction {} outside (0, 1), using {}",
            noise_fraction,
            DEFAULT_NOISE_FRACTION
        );
        DEFAULT_NOISE_FRACTION
    }
}

/// Shuffle a random subset of attribute columns of `rows`.
///
/// Rows carry a trailing class label. The input is not modified.
pub fn inject_noise<R: Rng + ?Sized>(rows: &[Vec<usize>], noise_fraction: f64, rng: &mut R) -> Result<NoisyDataset> {
    let width = match rows.first() {
        Some(row) => row.len(),
        None => {
            return Ok(NoisyDataset {
                rows: Vec::new(),
                noisy_columns: Vec::new(),
            })
        }
    };
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
        return Err(NbError::MalformedInput(format!(
            "row {} has {} columns, expected {}",
            i,
            row.len(),
            width
        )));
    }

    let num_attributes = width.saturating_sub(1);
    let fraction = effective_fraction(noise_fraction);
    let num_noisy = ((num_attributes as f64 * fraction).ceil() as usize).min(num_attributes);

    let mut noisy_columns = index::sample(rng, num_attributes, num_noisy).into_vec();
    noisy_columns.sort_unstable();

    let mut noisy = rows.to_vec();
    for &j in &noisy_columns {
        let mut column: Vec<usize> = noisy.iter().map(|row| row[j]).collect();
        column.shuffle(rng);
        for (row, value) in noisy.iter_mut().zip(column) {
            row[j] = value;
        }
    }

    tracing::debug!("Shuffled attribute columns {:?}", noisy_columns);
    Ok(NoisyDataset {
        rows: noisy,
        noisy_columns,
    })
}

/// Noisy copy of `matrix` using a caller-supplied RNG
pub fn add_noise<R: Rng + ?Sized>(matrix: &[Vec<usize>], fraction: f64, rng: &mut R) -> Result<Vec<Vec<usize>>> {
    inject_noise(matrix, fraction, rng).map(|noisy| noisy.rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn sorted_column(rows: &[Vec<usize>], j: usize) -> Vec<usize> {
        let mut col: Vec<usize> = rows.iter().map(|r| r[j]).collect();
        col.sort_unstable();
        col
    }

    fn sample_rows() -> Vec<Vec<usize>> {
        (0..50).map(|i| (0..11).map(|j| (i * 7 + j * 3) % 10).collect()).collect()
    }

    #[test]
    fn test_column_count() {
        let rows = sample_rows();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        // 10 attributes at 0.25 -> ceil(2.5) = 3
        let noisy = inject_noise(&rows, 0.25, &mut rng).unwrap();
        assert_eq!(noisy.noisy_columns.len(), 3);
        assert!(noisy.noisy_columns.iter().all(|&j| j < 10));
    }

    #[test]
    fn test_invalid_fraction_falls_back() {
        let rows = sample_rows();
        for fraction in [0.0, -0.5, 1.0, 3.0] {
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            let noisy = inject_noise(&rows, fraction, &mut rng).unwrap();
            assert_eq!(noisy.noisy_columns.len(), 1);
        }
    }

    #[test]
    fn test_input_untouched_and_labels_kept() {
        let rows = sample_rows();
        let before = rows.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let noisy = inject_noise(&rows, 0.5, &mut rng).unwrap();
        assert_eq!(rows, before);
        for (a, b) in rows.iter().zip(&noisy.rows) {
            assert_eq!(a[10], b[10]);
        }
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let rows = sample_rows();
        let a = add_noise(&rows, 0.3, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        let b = add_noise(&rows, 0.3, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let rows = vec![vec![1, 2, 0], vec![1, 0]];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(matches!(inject_noise(&rows, 0.5, &mut rng), Err(NbError::MalformedInput(_))));
    }

    proptest! {
        #[test]
        fn prop_noise_preserves_shape_and_multisets(
            rows in (2usize..8).prop_flat_map(|width| {
                prop::collection::vec(prop::collection::vec(0usize..5, width), 1..40)
            }),
            fraction in 0.01f64..0.99,
            seed in any::<u64>(),
        ) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let noisy = inject_noise(&rows, fraction, &mut rng).unwrap();
            prop_assert_eq!(noisy.rows.len(), rows.len());
            let width = rows[0].len();
            for row in &noisy.rows {
                prop_assert_eq!(row.len(), width);
            }
            for j in 0..width {
                prop_assert_eq!(sorted_column(&rows, j), sorted_column(&noisy.rows, j));
                if !noisy.noisy_columns.contains(&j) {
                    let original: Vec<usize> = rows.iter().map(|r| r[j]).collect();
                    let after: Vec<usize> = noisy.rows.iter().map(|r| r[j]).collect();
                    prop_assert_eq!(original, after);
                }
            }
        }
    }
}
