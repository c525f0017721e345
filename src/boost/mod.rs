//! In-crate gradient-boosted tree regressor.

pub mod gbm;
pub mod tree;

pub use gbm::{fit_gbm, EvalSet, FitLog, GbmModel};
pub use tree::RegressionTree;
