//! Numeric dataset produced by applying a fitted recipe to a raw table.

use ndarray::{Array1, Array2, Axis};

use crate::error::MetricsError;

/// A fully numeric feature matrix with aligned labels and feature names.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub x: Array2<f32>,
    pub y: Array1<f32>,
    pub feature_names: Vec<String>,
}

impl Dataset {
    pub fn new(
        x: Array2<f32>,
        y: Array1<f32>,
        feature_names: Vec<String>,
    ) -> Result<Self, MetricsError> {
        if x.nrows() != y.len() {
            return Err(MetricsError::LengthMismatch {
                predictions: x.nrows(),
                labels: y.len(),
            });
        }
        Ok(Dataset {
            x,
            y,
            feature_names,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.x.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// New dataset containing the selected rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Dataset {
        Dataset {
            x: self.x.select(Axis(0), indices),
            y: self.y.select(Axis(0), indices),
            feature_names: self.feature_names.clone(),
        }
    }

    pub fn log_summary(&self, label: &str) {
        log::info!(
            "{}: {} rows, {} feature columns",
            label,
            self.n_rows(),
            self.n_features()
        );
    }
}
