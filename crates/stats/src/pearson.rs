/// Population standard deviation. Used to detect constant submissions
/// (sigma == 0), which are automatically non-original.
pub fn stddev(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let mean = x.iter().sum::<f64>() / x.len() as f64;
    let variance = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / x.len() as f64;
    variance.sqrt()
}

/// Pearson product-moment correlation coefficient, pairing `x` and `y`
/// elementwise by position. Callers are responsible for pre-sorting both
/// vectors by a shared key (row-id) before calling this, per the design
/// note resolving the originality-pairing open question.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    assert_eq!(x.len(), y.len(), "pearson requires equal-length samples");
    let n = x.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_linear_correlation() {
        let x: Vec<f64> = (0..100).map(|i| i as f64 / 100.0).collect();
        let y: Vec<f64> = x.iter().map(|&xi| 0.01 + 0.5 * xi).collect();
        let rho = pearson(&x, &y);
        assert!((rho - 1.0).abs() < 1e-9);
    }

    #[test]
    fn constant_vector_has_zero_stddev() {
        let x = vec![0.5; 1000];
        assert_eq!(stddev(&x), 0.0);
    }
}
