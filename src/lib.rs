//! gbtune: gradient-boosted tree tuning for tabular regression.
//!
//! This crate loads a tabular dataset, preprocesses it with a fixed
//! feature-engineering recipe, and tunes a gradient-boosted tree regressor
//! with a staged, cross-validated grid search (tree count, learning rate,
//! depth, column subsampling). The outcome is a fitted model, a held-out
//! RMSE, and a static HTML report of the tuning curves.
//!
//! The design favors small, testable modules: the search loop is one
//! parameterized function shared by every tuning stage, and the random seed
//! is an explicit argument everywhere rather than process-wide state.
pub mod boost;
pub mod config;
pub mod cv;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod recipe;
pub mod report;
pub mod search;
pub mod table;
