// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Error types for the training and evaluation core

use thiserror::Error;

/// Failures raised by binning, training, classification and scoring
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NbError {
    /// A value fell outside its declared attribute or class domain
    #[error("{what} value {value} is outside its domain {expected}")]
    Domain {
        what: String,
        value: String,
        expected: String,
    },

    /// Empty or degenerate training set
    #[error("Invalid training set: {0}")]
    InvalidTrainingSet(String),

    /// A ratio whose denominator is zero (e.g. scoring an empty fold)
    #[error("Division by zero: {0}")]
    DivisionByZero(String),

    /// Row width mismatch or unparsable token
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Caller-supplied parameter out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl NbError {
    pub fn domain(what: impl Into<String>, value: impl ToString, expected: impl Into<String>) -> Self {
        NbError::Domain {
            what: what.into(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, NbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NbError::domain("attribute 2", 7, "0..=2");
        let msg = format!("{}", err);
        assert!(msg.contains("attribute 2"));
        assert!(msg.contains('7'));
        assert!(msg.contains("0..=2"));

        let err = NbError::InvalidTrainingSet("no examples".to_string());
        assert!(format!("{}", err).contains("Invalid training set"));

        let err = NbError::MalformedInput("line 3".to_string());
        assert!(format!("{}", err).contains("line 3"));
    }

    #[test]
    fn test_error_into_anyhow() {
        fn fails() -> anyhow::Result<()> {
            Err(NbError::DivisionByZero("empty fold".to_string()))?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert!(err.to_string().contains("empty fold"));
    }
}
