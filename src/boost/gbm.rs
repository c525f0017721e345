//! Squared-error gradient boosting over regression trees.
//!
//! Each iteration fits one tree to the current residuals on a random subset
//! of feature columns, then shrinks its contribution by the learning rate.
//! With an evaluation set attached, training keeps a per-iteration RMSE log
//! and stops early once the held-out error has not improved for the
//! configured patience window.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::boost::tree::RegressionTree;
use crate::config::BoostParams;
use crate::error::BoostError;
use crate::metrics::rmse;

/// Held-out data evaluated after every boosting iteration.
pub struct EvalSet<'a> {
    pub x: &'a Array2<f32>,
    pub y: &'a Array1<f32>,
}

/// Per-iteration error log from one fit. `valid_rmse` is empty when no
/// evaluation set was attached.
#[derive(Debug, Clone, Default)]
pub struct FitLog {
    pub train_rmse: Vec<f32>,
    pub valid_rmse: Vec<f32>,
}

impl FitLog {
    /// Number of boosting iterations actually run.
    pub fn len(&self) -> usize {
        self.train_rmse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.train_rmse.is_empty()
    }
}

/// A fitted gradient-boosted tree ensemble.
pub struct GbmModel {
    base_score: f32,
    learning_rate: f32,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl GbmModel {
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn predict(&self, x: &Array2<f32>) -> Result<Vec<f32>, BoostError> {
        if x.ncols() != self.n_features {
            return Err(BoostError::FeatureCountMismatch {
                expected: self.n_features,
                actual: x.ncols(),
            });
        }
        let mut preds = vec![self.base_score; x.nrows()];
        for tree in &self.trees {
            for (i, p) in preds.iter_mut().enumerate() {
                *p += self.learning_rate * tree.predict_row(x.row(i));
            }
        }
        Ok(preds)
    }
}

/// Fit a boosted ensemble.
///
/// `patience` only has an effect when `eval` is given; the returned log
/// covers every iteration actually run. The seed drives per-tree column
/// sampling and nothing else.
pub fn fit_gbm(
    x: &Array2<f32>,
    y: &Array1<f32>,
    params: &BoostParams,
    eval: Option<EvalSet<'_>>,
    patience: Option<usize>,
    seed: u64,
) -> (GbmModel, FitLog) {
    let n = x.nrows();
    let n_features = x.ncols();
    let labels = y.to_vec();

    let base_score = if n == 0 {
        0.0
    } else {
        (labels.iter().map(|&v| v as f64).sum::<f64>() / n as f64) as f32
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let all_rows: Vec<usize> = (0..n).collect();
    let all_features: Vec<usize> = (0..n_features).collect();
    let n_sampled = ((params.colsample as f64 * n_features as f64).ceil() as usize)
        .clamp(1, n_features.max(1));

    let mut preds = vec![base_score; n];
    let mut residuals = vec![0f32; n];
    let mut trees: Vec<RegressionTree> = Vec::new();
    let mut log_out = FitLog::default();

    let eval_labels: Option<Vec<f32>> = eval
        .as_ref()
        .map(|e| e.y.iter().copied().collect::<Vec<f32>>());
    let mut eval_preds: Option<Vec<f32>> = eval.as_ref().map(|e| vec![base_score; e.x.nrows()]);

    let mut best_valid = f32::INFINITY;
    let mut since_improvement = 0usize;

    for iteration in 0..params.trees {
        for i in 0..n {
            residuals[i] = labels[i] - preds[i];
        }

        let features: Vec<usize> = if n_sampled == n_features {
            all_features.clone()
        } else {
            let mut sampled: Vec<usize> = all_features
                .choose_multiple(&mut rng, n_sampled)
                .copied()
                .collect();
            sampled.sort_unstable();
            sampled
        };

        let tree = RegressionTree::fit(
            x,
            &residuals,
            &all_rows,
            &features,
            params.max_depth,
            params.min_samples_leaf,
        );

        for (i, p) in preds.iter_mut().enumerate() {
            *p += params.learning_rate * tree.predict_row(x.row(i));
        }
        let train_rmse = rmse(&preds, &labels).expect("aligned by construction");
        log_out.train_rmse.push(train_rmse);

        if let (Some(eval), Some(eval_preds)) = (eval.as_ref(), eval_preds.as_mut()) {
            for (i, p) in eval_preds.iter_mut().enumerate() {
                *p += params.learning_rate * tree.predict_row(eval.x.row(i));
            }
            let valid_rmse = rmse(eval_preds, eval_labels.as_deref().unwrap())
                .expect("aligned by construction");
            log_out.valid_rmse.push(valid_rmse);

            if valid_rmse < best_valid {
                best_valid = valid_rmse;
                since_improvement = 0;
            } else {
                since_improvement += 1;
            }
        }

        trees.push(tree);

        if let Some(patience) = patience {
            if eval.is_some() && since_improvement >= patience {
                log::debug!(
                    "Early stop at iteration {} (no improvement for {} rounds)",
                    iteration + 1,
                    patience
                );
                break;
            }
        }
    }

    let model = GbmModel {
        base_score,
        learning_rate: params.learning_rate,
        trees,
        n_features,
    };
    (model, log_out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn linear_data(n: usize) -> (Array2<f32>, Array1<f32>) {
        let mut rows = Vec::with_capacity(n * 2);
        let mut labels = Vec::with_capacity(n);
        for i in 0..n {
            let a = i as f32 / n as f32;
            let b = ((i * 7) % n) as f32 / n as f32;
            rows.push(a);
            rows.push(b);
            labels.push(3.0 * a - 2.0 * b + 0.5);
        }
        (
            Array2::from_shape_vec((n, 2), rows).unwrap(),
            Array1::from_vec(labels),
        )
    }

    #[test]
    fn training_error_is_monotone_non_increasing() {
        let (x, y) = linear_data(80);
        let params = BoostParams {
            trees: 30,
            learning_rate: 0.2,
            max_depth: 3,
            colsample: 1.0,
            min_samples_leaf: 2,
        };
        let (_, log) = fit_gbm(&x, &y, &params, None, None, 1);
        assert_eq!(log.len(), 30);
        for w in log.train_rmse.windows(2) {
            assert!(
                w[1] <= w[0] + 1e-5,
                "train RMSE increased: {} -> {}",
                w[0],
                w[1]
            );
        }
    }

    #[test]
    fn fit_is_deterministic_for_fixed_seed() {
        let (x, y) = linear_data(60);
        let params = BoostParams {
            trees: 15,
            learning_rate: 0.1,
            max_depth: 3,
            colsample: 0.5,
            min_samples_leaf: 2,
        };
        let (_, a) = fit_gbm(&x, &y, &params, None, None, 11);
        let (_, b) = fit_gbm(&x, &y, &params, None, None, 11);
        assert_eq!(a.train_rmse, b.train_rmse);
    }

    #[test]
    fn early_stopping_truncates_the_log() {
        let (x, y) = linear_data(50);
        // Evaluation on pure noise: no sustained improvement is possible.
        let eval_x = x.clone();
        let eval_y = Array1::from_vec(
            (0..50)
                .map(|i| if i % 2 == 0 { 1.0f32 } else { -1.0 })
                .collect(),
        );
        let params = BoostParams {
            trees: 500,
            learning_rate: 0.1,
            max_depth: 2,
            colsample: 1.0,
            min_samples_leaf: 2,
        };
        let eval = EvalSet {
            x: &eval_x,
            y: &eval_y,
        };
        let (model, log) = fit_gbm(&x, &y, &params, Some(eval), Some(5), 3);
        assert!(log.len() < 500, "expected an early stop, ran {}", log.len());
        assert_eq!(model.n_trees(), log.len());
        assert_eq!(log.valid_rmse.len(), log.len());
    }

    #[test]
    fn predict_rejects_wrong_width() {
        let (x, y) = linear_data(20);
        let params = BoostParams {
            trees: 3,
            ..BoostParams::default()
        };
        let (model, _) = fit_gbm(&x, &y, &params, None, None, 0);
        let narrow = array![[0.5f32], [0.1]];
        assert!(model.predict(&narrow).is_err());
    }

    #[test]
    fn model_fits_a_step_function_closely() {
        let x = Array2::from_shape_vec((40, 1), (0..40).map(|i| i as f32).collect()).unwrap();
        let y = Array1::from_vec(
            (0..40)
                .map(|i| if i < 20 { 1.0f32 } else { 3.0 })
                .collect(),
        );
        let params = BoostParams {
            trees: 50,
            learning_rate: 0.3,
            max_depth: 2,
            colsample: 1.0,
            min_samples_leaf: 2,
        };
        let (model, _) = fit_gbm(&x, &y, &params, None, None, 0);
        let preds = model.predict(&x).unwrap();
        assert!((preds[0] - 1.0).abs() < 0.1, "left plateau: {}", preds[0]);
        assert!((preds[39] - 3.0).abs() < 0.1, "right plateau: {}", preds[39]);
    }
}
