/// Binary cross-entropy loss, clamping probabilities away from 0/1 to avoid
/// `ln(0)`, matching the convention of `sklearn.metrics.log_loss`.
const CLAMP_EPS: f64 = 1e-15;

pub fn binary_cross_entropy(labels: &[f64], probabilities: &[f64]) -> f64 {
    assert_eq!(
        labels.len(),
        probabilities.len(),
        "labels and probabilities must be joined 1:1 by row-id before scoring"
    );
    if labels.is_empty() {
        return 0.0;
    }
    let n = labels.len() as f64;
    let sum: f64 = labels
        .iter()
        .zip(probabilities.iter())
        .map(|(&y, &p)| {
            let p = p.clamp(CLAMP_EPS, 1.0 - CLAMP_EPS);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum();
    sum / n
}

/// `-ln(0.5)`, the consistency threshold: an era whose loss falls strictly
/// below this is "better than random."
pub const RANDOM_GUESS_LOSS: f64 = std::f64::consts::LN_2;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions_score_near_zero() {
        let labels = vec![1.0, 0.0, 1.0, 0.0];
        let probs = vec![0.999, 0.001, 0.999, 0.001];
        assert!(binary_cross_entropy(&labels, &probs) < 0.01);
    }

    #[test]
    fn coin_flip_predictions_equal_ln2() {
        let labels = vec![1.0, 0.0, 1.0, 0.0];
        let probs = vec![0.5, 0.5, 0.5, 0.5];
        assert!((binary_cross_entropy(&labels, &probs) - RANDOM_GUESS_LOSS).abs() < 1e-9);
    }
}
