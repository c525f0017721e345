//! Evaluation metrics used by training, cross-validation and the report.

use crate::error::MetricsError;

/// Root mean squared error between predictions and labels.
pub fn rmse(predictions: &[f32], labels: &[f32]) -> Result<f32, MetricsError> {
    if predictions.len() != labels.len() {
        return Err(MetricsError::LengthMismatch {
            predictions: predictions.len(),
            labels: labels.len(),
        });
    }
    if predictions.is_empty() {
        return Err(MetricsError::Empty);
    }
    let mut acc = 0f64;
    for (p, y) in predictions.iter().zip(labels.iter()) {
        let d = (*p - *y) as f64;
        acc += d * d;
    }
    Ok((acc / predictions.len() as f64).sqrt() as f32)
}

/// Population mean and standard deviation of a slice.
pub fn mean_std(values: &[f32]) -> (f32, f32) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let var = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    (mean as f32, var.sqrt() as f32)
}

/// Median of a slice, ignoring nothing; `None` for empty input.
pub fn median(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rmse_of_perfect_predictions_is_zero() {
        let p = vec![1.0f32, 2.0, 3.0];
        assert!(rmse(&p, &p).unwrap() < 1e-7);
    }

    #[test]
    fn rmse_known_value() {
        // Errors are (1, -1, 1, -1) -> mean square 1 -> rmse 1
        let p = vec![2.0f32, 1.0, 4.0, 3.0];
        let y = vec![1.0f32, 2.0, 3.0, 4.0];
        assert!((rmse(&p, &y).unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rmse_length_mismatch_errors() {
        let p = vec![1.0f32, 2.0];
        let y = vec![1.0f32];
        assert!(rmse(&p, &y).is_err());
    }

    #[test]
    fn mean_std_known_values() {
        let (m, s) = mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((m - 5.0).abs() < 1e-6, "mean = {}", m);
        assert!((s - 2.0).abs() < 1e-6, "std = {}", s);
    }

    #[test]
    fn median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }
}
