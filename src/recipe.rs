//! Preprocessing recipe: an ordered list of transformation steps fit once on
//! the training table and applied unchanged to any other split.
//!
//! Step order follows the analysis this crate reproduces: novel-category
//! handling, zero-variance removal, standardization, Yeo-Johnson power
//! transform, median imputation, one-hot encoding. Numeric columns may carry
//! missing values until the imputation step; categorical missing values map
//! to the reserved novel level.

use anyhow::{anyhow, Result};
use ndarray::{Array1, Array2};

use crate::dataset::Dataset;
use crate::metrics::median;
use crate::table::{ColumnData, RawTable};

/// Reserved level for categories unseen (or missing) at fit time.
const NOVEL_LEVEL: &str = "new";

/// Minimum stddev to avoid division by zero when standardizing.
const MIN_STD: f64 = 1e-6;

#[derive(Debug, Clone)]
enum FittedColumn {
    /// Removed by the zero-variance step.
    Dropped { name: String },
    Numeric {
        name: String,
        mean: f64,
        std: f64,
        lambda: f64,
        /// Median of the fit-time transformed values, used for imputation.
        fill: f64,
    },
    Categorical {
        name: String,
        /// Fit-time levels, sorted; the novel level is appended at encode time.
        levels: Vec<String>,
    },
}

/// A recipe fitted on one training table.
#[derive(Debug, Clone)]
pub struct FittedRecipe {
    columns: Vec<FittedColumn>,
    outcome: String,
    feature_names: Vec<String>,
}

impl FittedRecipe {
    /// Fit every step on the training table.
    pub fn fit(table: &RawTable) -> Result<FittedRecipe> {
        let mut columns = Vec::new();
        let mut dropped = 0usize;

        for name in table.predictor_names() {
            let data = table
                .column(name)
                .ok_or_else(|| anyhow!("Predictor column '{}' disappeared", name))?;
            let fitted = match data {
                ColumnData::Numeric(values) => fit_numeric(name, values),
                ColumnData::Categorical(values) => fit_categorical(name, values),
            };
            if matches!(fitted, FittedColumn::Dropped { .. }) {
                dropped += 1;
            }
            columns.push(fitted);
        }

        if dropped > 0 {
            log::warn!("Zero-variance step dropped {} column(s)", dropped);
        }

        let feature_names = feature_names_for(&columns);
        if feature_names.is_empty() {
            anyhow::bail!("No predictor columns survived preprocessing");
        }
        log::info!(
            "Fitted recipe: {} raw predictors -> {} feature columns",
            columns.len(),
            feature_names.len()
        );

        Ok(FittedRecipe {
            columns,
            outcome: table.outcome.clone(),
            feature_names,
        })
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Apply the fitted steps to a table with the same column layout.
    ///
    /// The output schema (feature count and names) depends only on the fit,
    /// never on the table being transformed.
    pub fn apply(&self, table: &RawTable) -> Result<Dataset> {
        if table.outcome != self.outcome {
            anyhow::bail!(
                "Recipe was fit with outcome '{}', table has '{}'",
                self.outcome,
                table.outcome
            );
        }
        let n_rows = table.n_rows();
        let n_features = self.feature_names.len();
        let mut data = Vec::with_capacity(n_rows * n_features);

        // Resolve source columns once, in recipe order.
        let mut sources = Vec::with_capacity(self.columns.len());
        for fitted in &self.columns {
            let name = fitted_name(fitted);
            let col = table
                .column(name)
                .ok_or_else(|| anyhow!("Column '{}' missing from table", name))?;
            sources.push(col);
        }

        for row in 0..n_rows {
            for (fitted, source) in self.columns.iter().zip(&sources) {
                encode_cell(fitted, source, row, &mut data)?;
            }
        }

        let x = Array2::from_shape_vec((n_rows, n_features), data)
            .map_err(|e| anyhow!("Failed to build feature matrix: {}", e))?;
        let y = Array1::from_vec(table.outcome_values()?);
        Ok(Dataset::new(x, y, self.feature_names.clone())?)
    }
}

fn fitted_name(fitted: &FittedColumn) -> &str {
    match fitted {
        FittedColumn::Dropped { name } => name,
        FittedColumn::Numeric { name, .. } => name,
        FittedColumn::Categorical { name, .. } => name,
    }
}

fn feature_names_for(columns: &[FittedColumn]) -> Vec<String> {
    let mut names = Vec::new();
    for fitted in columns {
        match fitted {
            FittedColumn::Dropped { .. } => {}
            FittedColumn::Numeric { name, .. } => names.push(name.clone()),
            FittedColumn::Categorical { name, levels } => {
                for level in levels {
                    names.push(format!("{}_{}", name, level));
                }
                names.push(format!("{}_{}", name, NOVEL_LEVEL));
            }
        }
    }
    names
}

fn fit_numeric(name: &str, values: &[Option<f64>]) -> FittedColumn {
    let observed: Vec<f64> = values.iter().filter_map(|v| *v).collect();
    if is_constant(&observed) {
        log::debug!("Numeric column '{}' is constant, dropping", name);
        return FittedColumn::Dropped {
            name: name.to_string(),
        };
    }

    let n = observed.len() as f64;
    let mean = observed.iter().sum::<f64>() / n;
    let std = (observed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n)
        .sqrt()
        .max(MIN_STD);

    let standardized: Vec<f64> = observed.iter().map(|v| (v - mean) / std).collect();
    let lambda = fit_lambda(&standardized);
    let transformed: Vec<f32> = standardized
        .iter()
        .map(|&v| yeo_johnson(v, lambda) as f32)
        .collect();
    let fill = median(&transformed).unwrap_or(0.0) as f64;

    FittedColumn::Numeric {
        name: name.to_string(),
        mean,
        std,
        lambda,
        fill,
    }
}

fn fit_categorical(name: &str, values: &[Option<String>]) -> FittedColumn {
    let mut levels: Vec<String> = values.iter().filter_map(|v| v.clone()).collect();
    levels.sort();
    levels.dedup();
    if levels.len() <= 1 {
        log::debug!("Categorical column '{}' is constant, dropping", name);
        return FittedColumn::Dropped {
            name: name.to_string(),
        };
    }
    FittedColumn::Categorical {
        name: name.to_string(),
        levels,
    }
}

fn is_constant(observed: &[f64]) -> bool {
    match observed.first() {
        None => true,
        Some(first) => observed.iter().all(|v| v == first),
    }
}

fn encode_cell(
    fitted: &FittedColumn,
    source: &ColumnData,
    row: usize,
    out: &mut Vec<f32>,
) -> Result<()> {
    match (fitted, source) {
        (FittedColumn::Dropped { .. }, _) => {}
        (
            FittedColumn::Numeric {
                mean,
                std,
                lambda,
                fill,
                ..
            },
            ColumnData::Numeric(values),
        ) => {
            let value = match values[row] {
                Some(v) => yeo_johnson((v - mean) / std, *lambda),
                None => *fill,
            };
            out.push(value as f32);
        }
        (FittedColumn::Categorical { levels, .. }, ColumnData::Categorical(values)) => {
            // Missing and unseen levels both land on the novel indicator.
            let hit = values[row]
                .as_deref()
                .and_then(|v| levels.iter().position(|l| l == v));
            for idx in 0..levels.len() {
                out.push(if hit == Some(idx) { 1.0 } else { 0.0 });
            }
            out.push(if hit.is_none() { 1.0 } else { 0.0 });
        }
        (fitted, _) => {
            anyhow::bail!(
                "Column '{}' changed type between fit and apply",
                fitted_name(fitted)
            )
        }
    }
    Ok(())
}

/// Yeo-Johnson power transform of a single value.
pub fn yeo_johnson(y: f64, lambda: f64) -> f64 {
    if y >= 0.0 {
        if lambda.abs() < 1e-6 {
            (y + 1.0).ln()
        } else {
            ((y + 1.0).powf(lambda) - 1.0) / lambda
        }
    } else if (lambda - 2.0).abs() < 1e-6 {
        -(1.0 - y).ln()
    } else {
        -((1.0 - y).powf(2.0 - lambda) - 1.0) / (2.0 - lambda)
    }
}

/// Estimate the Yeo-Johnson lambda by log-likelihood grid search over [-2, 2].
fn fit_lambda(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    // Jacobian term is constant in lambda-free parts: sum of sign(y)*ln(|y|+1).
    let jacobian: f64 = values
        .iter()
        .map(|&y| y.signum() * (y.abs() + 1.0).ln())
        .sum();

    let mut best_lambda = 1.0;
    let mut best_ll = f64::NEG_INFINITY;
    let steps = 81;
    for i in 0..steps {
        let lambda = -2.0 + 4.0 * (i as f64) / ((steps - 1) as f64);
        let transformed: Vec<f64> = values.iter().map(|&y| yeo_johnson(y, lambda)).collect();
        let mean = transformed.iter().sum::<f64>() / n;
        let var = transformed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        if !(var.is_finite() && var > 1e-12) {
            continue;
        }
        let ll = -0.5 * n * var.ln() + (lambda - 1.0) * jacobian;
        if ll > best_ll {
            best_ll = ll;
            best_lambda = lambda;
        }
    }
    best_lambda
}
