use std::error::Error;
use std::fmt;

/// Custom error type for metric computation failures
#[derive(Debug)]
pub enum MetricsError {
    LengthMismatch { predictions: usize, labels: usize },
    Empty,
}

impl fmt::Display for MetricsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MetricsError::LengthMismatch {
                predictions,
                labels,
            } => write!(
                f,
                "Predictions ({}) and labels ({}) must have equal length",
                predictions, labels
            ),
            MetricsError::Empty => write!(f, "Cannot compute a metric over zero values"),
        }
    }
}

impl Error for MetricsError {}

/// Custom error type for grid-search contract violations
#[derive(Debug)]
pub enum SearchError {
    EmptyGrid,
    BadFoldCount { folds: usize, rows: usize },
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SearchError::EmptyGrid => write!(f, "Candidate grid must not be empty"),
            SearchError::BadFoldCount { folds, rows } => write!(
                f,
                "Cannot split {} rows into {} folds (need at least 2 folds and one row per fold)",
                rows, folds
            ),
        }
    }
}

impl Error for SearchError {}

/// Custom error type for model prediction failures
#[derive(Debug)]
pub enum BoostError {
    FeatureCountMismatch { expected: usize, actual: usize },
}

impl fmt::Display for BoostError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BoostError::FeatureCountMismatch { expected, actual } => write!(
                f,
                "Model was trained on {} feature columns, input has {}",
                expected, actual
            ),
        }
    }
}

impl Error for BoostError {}
