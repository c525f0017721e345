use plotly::common::{Fill, Mode};
use plotly::layout::{Axis, Layout};
use plotly::{Plot, Scatter};

use crate::cv::CvOutcome;
use crate::search::StageOutcome;

/// Mean validation RMSE vs boosting iteration, one trace per grid candidate.
pub fn plot_stage_curves(stage: &StageOutcome, title: &str) -> Plot {
    let mut plot = Plot::new();

    for curve in &stage.curves {
        let iterations: Vec<f64> = curve
            .outcome
            .rows
            .iter()
            .map(|r| (r.iteration + 1) as f64)
            .collect();
        let valid: Vec<f64> = curve
            .outcome
            .rows
            .iter()
            .map(|r| r.valid_mean as f64)
            .collect();
        plot.add_trace(
            Scatter::new(iterations, valid)
                .mode(Mode::Lines)
                .name(&format!("{}", curve.value)),
        );
    }

    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title("Boosting iteration"))
            .y_axis(Axis::new().title("Mean validation RMSE")),
    );
    plot
}

/// Train and validation RMSE with a +/- one-sigma band for one candidate.
pub fn plot_train_valid_band(outcome: &CvOutcome, title: &str) -> Plot {
    let iterations: Vec<f64> = outcome
        .rows
        .iter()
        .map(|r| (r.iteration + 1) as f64)
        .collect();
    let train_mean: Vec<f64> = outcome.rows.iter().map(|r| r.train_mean as f64).collect();
    let valid_mean: Vec<f64> = outcome.rows.iter().map(|r| r.valid_mean as f64).collect();
    let valid_std: Vec<f64> = outcome.rows.iter().map(|r| r.valid_std as f64).collect();

    let mut plot = Plot::new();

    plot.add_trace(
        Scatter::new(iterations.clone(), train_mean)
            .name("Train RMSE")
            .mode(Mode::Lines)
            .line(plotly::common::Line::new().color("rgba(31, 119, 180, 1.0)")),
    );

    plot.add_trace(
        Scatter::new(iterations.clone(), valid_mean.clone())
            .name("Validation RMSE")
            .mode(Mode::Lines)
            .line(plotly::common::Line::new().color("rgba(255, 127, 14, 1.0)")),
    );

    // Validation band: upper path followed by the reversed lower path.
    let upper: Vec<f64> = valid_mean
        .iter()
        .zip(&valid_std)
        .map(|(m, s)| m + s)
        .collect();
    let lower: Vec<f64> = valid_mean
        .iter()
        .zip(&valid_std)
        .map(|(m, s)| m - s)
        .collect();
    let mut band_x = iterations.clone();
    band_x.extend(iterations.iter().rev());
    let mut band_y = upper;
    band_y.extend(lower.iter().rev());

    plot.add_trace(
        Scatter::new(band_x, band_y)
            .name("Validation +/- sigma")
            .mode(Mode::Lines)
            .fill(Fill::ToSelf)
            .line(plotly::common::Line::new().width(0.0))
            .fill_color("rgba(255, 127, 14, 0.2)"),
    );

    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title("Boosting iteration"))
            .y_axis(Axis::new().title("RMSE")),
    );
    plot
}
