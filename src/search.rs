//! Single-axis hyperparameter search loop.
//!
//! One parameterized function serves every tuning stage: given candidate
//! values for one hyperparameter and fixed values for the rest, it
//! cross-validates each candidate and ranks them by best-iteration mean
//! validation RMSE, ascending. Ties keep input order.

use ndarray::{Array1, Array2};

use crate::config::{BoostParams, TunedParam};
use crate::cv::{run_cv, CvOutcome, Fold};
use crate::error::SearchError;

/// One hyperparameter axis: which parameter varies and its ordered
/// candidate values.
#[derive(Debug, Clone)]
pub struct GridAxis {
    pub param: TunedParam,
    pub candidates: Vec<f64>,
}

impl GridAxis {
    pub fn new(param: TunedParam, candidates: Vec<f64>) -> Self {
        Self { param, candidates }
    }
}

/// Summary of one candidate after cross-validation.
#[derive(Debug, Clone)]
pub struct CandidateRow {
    pub value: f64,
    pub best_iteration: usize,
    pub valid_mean: f32,
    pub valid_std: f32,
    pub train_mean: f32,
}

/// Full cross-validation curve for one candidate, kept for the report.
#[derive(Debug, Clone)]
pub struct CandidateCurve {
    pub value: f64,
    pub outcome: CvOutcome,
}

/// Result of one search stage.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub param: TunedParam,
    /// Candidates ranked ascending by mean validation RMSE.
    pub ranked: Vec<CandidateRow>,
    /// CV curves in original candidate order.
    pub curves: Vec<CandidateCurve>,
}

impl StageOutcome {
    /// The winning candidate: lowest mean validation RMSE, earliest on ties.
    pub fn winner(&self) -> &CandidateRow {
        &self.ranked[0]
    }
}

/// Cross-validate every candidate on the axis and rank them.
///
/// Folds are shared by all candidates; the seed drives only the per-fold
/// fits. Fit failures propagate to the caller untouched.
pub fn grid_search(
    x: &Array2<f32>,
    y: &Array1<f32>,
    base_params: &BoostParams,
    axis: &GridAxis,
    folds: &[Fold],
    patience: usize,
    seed: u64,
) -> Result<StageOutcome, SearchError> {
    if axis.candidates.is_empty() {
        return Err(SearchError::EmptyGrid);
    }

    let mut curves = Vec::with_capacity(axis.candidates.len());
    let mut rows = Vec::with_capacity(axis.candidates.len());

    for &value in &axis.candidates {
        let params = base_params.with_value(axis.param, value);
        log::info!(
            "Evaluating {:?} = {} ({} folds, patience {})",
            axis.param,
            value,
            folds.len(),
            patience
        );
        let outcome = run_cv(x, y, &params, folds, patience, seed);
        let best = outcome.best_row();
        log::info!(
            "  best iteration {} with mean valid RMSE {:.5} (+/- {:.5})",
            best.iteration,
            best.valid_mean,
            best.valid_std
        );
        rows.push(CandidateRow {
            value,
            best_iteration: best.iteration,
            valid_mean: best.valid_mean,
            valid_std: best.valid_std,
            train_mean: best.train_mean,
        });
        curves.push(CandidateCurve { value, outcome });
    }

    // Stable sort: equal errors keep candidate input order.
    let mut ranked = rows;
    ranked.sort_by(|a, b| {
        a.valid_mean
            .partial_cmp(&b.valid_mean)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(StageOutcome {
        param: axis.param,
        ranked,
        curves,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cv::make_folds;
    use ndarray::{Array1, Array2};

    fn quadratic_data(n: usize) -> (Array2<f32>, Array1<f32>) {
        let mut cells = Vec::with_capacity(n * 2);
        let mut labels = Vec::with_capacity(n);
        for i in 0..n {
            let a = i as f32 / n as f32;
            let b = ((i * 13) % n) as f32 / n as f32;
            cells.push(a);
            cells.push(b);
            labels.push(a * a + 0.5 * b);
        }
        (
            Array2::from_shape_vec((n, 2), cells).unwrap(),
            Array1::from_vec(labels),
        )
    }

    #[test]
    fn empty_grid_is_rejected() {
        let (x, y) = quadratic_data(30);
        let folds = make_folds(30, 3, 0).unwrap();
        let axis = GridAxis::new(TunedParam::Trees, vec![]);
        let result = grid_search(&x, &y, &BoostParams::default(), &axis, &folds, 5, 0);
        assert!(matches!(result, Err(SearchError::EmptyGrid)));
    }

    #[test]
    fn winner_comes_from_the_grid_and_ranks_first() {
        let (x, y) = quadratic_data(60);
        let folds = make_folds(60, 3, 7).unwrap();
        let base = BoostParams {
            trees: 40,
            learning_rate: 0.1,
            max_depth: 3,
            colsample: 1.0,
            min_samples_leaf: 2,
        };
        let axis = GridAxis::new(TunedParam::MaxDepth, vec![1.0, 2.0, 4.0]);
        let stage = grid_search(&x, &y, &base, &axis, &folds, 10, 7).unwrap();

        assert_eq!(stage.ranked.len(), 3);
        assert!(axis.candidates.contains(&stage.winner().value));
        for row in &stage.ranked {
            assert!(
                stage.winner().valid_mean <= row.valid_mean,
                "ranking invariant violated: {} > {}",
                stage.winner().valid_mean,
                row.valid_mean
            );
        }
    }

    #[test]
    fn curves_preserve_candidate_input_order() {
        let (x, y) = quadratic_data(40);
        let folds = make_folds(40, 4, 1).unwrap();
        let base = BoostParams {
            trees: 10,
            learning_rate: 0.2,
            max_depth: 2,
            colsample: 1.0,
            min_samples_leaf: 2,
        };
        let axis = GridAxis::new(TunedParam::LearningRate, vec![0.3, 0.1, 0.2]);
        let stage = grid_search(&x, &y, &base, &axis, &folds, 5, 1).unwrap();
        let order: Vec<f64> = stage.curves.iter().map(|c| c.value).collect();
        assert_eq!(order, vec![0.3, 0.1, 0.2]);
    }
}
