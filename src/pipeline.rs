//! The five-stage tuning pipeline.
//!
//! Strictly linear: each stage's winning value is baked into the base
//! parameters before the next stage starts, in the order tree count,
//! learning rate (pass 1), max depth, column subsample, learning rate
//! (pass 2). After the last stage one model is fit on the full training
//! split and evaluated once on the held-out split.

use anyhow::{Context, Result};

use crate::boost::fit_gbm;
use crate::config::{BoostParams, PipelineConfig, TunedParam};
use crate::cv::make_folds;
use crate::dataset::Dataset;
use crate::metrics::rmse;
use crate::recipe::FittedRecipe;
use crate::search::{grid_search, GridAxis, StageOutcome};
use crate::table::RawTable;

/// One completed tuning stage.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub title: String,
    pub outcome: StageOutcome,
}

/// Everything the report needs from one pipeline run.
#[derive(Debug)]
pub struct PipelineRun {
    pub stages: Vec<StageReport>,
    pub final_params: BoostParams,
    pub final_test_rmse: f32,
    pub train_rows: usize,
    pub test_rows: usize,
    pub n_features: usize,
}

/// Run preprocessing, all five tuning stages, and the final evaluation.
pub fn run_pipeline(table: &RawTable, config: &PipelineConfig) -> Result<PipelineRun> {
    let started = std::time::Instant::now();
    let seed = config.settings.seed;

    let (train_table, test_table) = table.split(config.test_fraction, seed);

    let recipe =
        FittedRecipe::fit(&train_table).context("Failed to fit the preprocessing recipe")?;
    let train = recipe
        .apply(&train_table)
        .context("Failed to preprocess the training split")?;
    let test = recipe
        .apply(&test_table)
        .context("Failed to preprocess the held-out split")?;
    train.log_summary("Training split");
    test.log_summary("Held-out split");

    let axes = [
        (
            "Tree count",
            TunedParam::Trees,
            config.trees_grid.iter().map(|&v| v as f64).collect::<Vec<f64>>(),
        ),
        (
            "Learning rate (pass 1)",
            TunedParam::LearningRate,
            config.learning_rate_grid.iter().map(|&v| v as f64).collect(),
        ),
        (
            "Max depth",
            TunedParam::MaxDepth,
            config.depth_grid.iter().map(|&v| v as f64).collect(),
        ),
        (
            "Column subsample",
            TunedParam::Colsample,
            config.colsample_grid.iter().map(|&v| v as f64).collect(),
        ),
        (
            "Learning rate (pass 2)",
            TunedParam::LearningRate,
            config.learning_rate_grid_2.iter().map(|&v| v as f64).collect(),
        ),
    ];

    let mut params = config.base_params.clone();
    let mut stages = Vec::with_capacity(axes.len());

    for (stage_idx, (title, param, candidates)) in axes.into_iter().enumerate() {
        let stage_seed = seed.wrapping_add(1000 * (stage_idx as u64 + 1));
        let folds = make_folds(train.n_rows(), config.settings.folds, stage_seed)?;
        let axis = GridAxis::new(param, candidates);

        log::info!("Stage {}: tuning {}", stage_idx + 1, title);
        let outcome = grid_search(
            &train.x,
            &train.y,
            &params,
            &axis,
            &folds,
            config.settings.patience,
            stage_seed,
        )?;
        let winner = outcome.winner();
        log::info!(
            "Stage {} winner: {} = {} (mean valid RMSE {:.5})",
            stage_idx + 1,
            title,
            winner.value,
            winner.valid_mean
        );

        params = params.with_value(param, winner.value);
        stages.push(StageReport {
            title: title.to_string(),
            outcome,
        });
    }

    let final_test_rmse = evaluate_final(&train, &test, &params, seed)?;
    log::info!(
        "Pipeline finished in {:?}; held-out RMSE {:.5}",
        started.elapsed(),
        final_test_rmse
    );

    Ok(PipelineRun {
        stages,
        final_params: params,
        final_test_rmse,
        train_rows: train.n_rows(),
        test_rows: test.n_rows(),
        n_features: train.n_features(),
    })
}

/// Fit the tuned parameters on the whole training split and score the
/// held-out split once.
fn evaluate_final(
    train: &Dataset,
    test: &Dataset,
    params: &BoostParams,
    seed: u64,
) -> Result<f32> {
    log::info!("Fitting the final model: {:?}", params);
    let (model, _) = fit_gbm(&train.x, &train.y, params, None, None, seed);
    let predictions = model.predict(&test.x)?;
    let test_labels = test.y.to_vec();
    Ok(rmse(&predictions, &test_labels)?)
}
