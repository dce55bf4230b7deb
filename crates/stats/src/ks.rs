/// Count of elements of `sorted` that are `<= x` (numpy's `searchsorted(..., side='right')`).
fn searchsorted_right(sorted: &[f64], x: f64) -> usize {
    sorted.partition_point(|&v| v <= x)
}

fn sorted_copy(data: &[f64]) -> Vec<f64> {
    let mut out = data.to_vec();
    out.sort_by(|a, b| a.partial_cmp(b).expect("non-NaN probability"));
    out
}

/// Two-sample Kolmogorov-Smirnov D-statistic, given `a` already sorted
/// ascending. This is the optimization from the design notes: avoids
/// materializing the full concatenated universe by only sorting `b` and
/// using `searchsorted` against both samples.
///
/// `D = max_x |F_a(x) - F_b(x)|` evaluated at every point of `a ∪ b`, which
/// is sufficient because both empirical CDFs are step functions whose
/// extremal gap always occurs at a sample point.
///
/// Returns 0 for an empty sample (the convention the concordance worker
/// relies on for empty cluster membership).
pub fn ks_sorted_vs(sorted_a: &[f64], b: &[f64]) -> f64 {
    if sorted_a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let sorted_b = sorted_copy(b);
    let n1 = sorted_a.len() as f64;
    let n2 = sorted_b.len() as f64;
    sorted_a
        .iter()
        .chain(sorted_b.iter())
        .map(|&x| {
            let cdf_a = searchsorted_right(sorted_a, x) as f64 / n1;
            let cdf_b = searchsorted_right(&sorted_b, x) as f64 / n2;
            (cdf_a - cdf_b).abs()
        })
        .fold(0.0_f64, f64::max)
}

/// Two-sample KS D-statistic for two arbitrary (unsorted) samples.
///
/// `ks_two_sample(a, b) == ks_two_sample(b, a)` within floating point
/// tolerance, and `0 <= ks_two_sample(a, b) <= 1` for equal-length finite
/// samples — see the `tests` module for both properties.
pub fn ks_two_sample(a: &[f64], b: &[f64]) -> f64 {
    let sorted_a = sorted_copy(a);
    ks_sorted_vs(&sorted_a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_samples_have_zero_distance() {
        let a = vec![0.1, 0.2, 0.3, 0.4, 0.5];
        assert_eq!(ks_two_sample(&a, &a), 0.0);
    }

    #[test]
    fn disjoint_samples_approach_one() {
        let a = vec![0.05, 0.06, 0.07, 0.08, 0.09];
        let b = vec![0.90, 0.91, 0.92, 0.93, 0.94];
        assert_eq!(ks_two_sample(&a, &b), 1.0);
    }

    #[test]
    fn symmetric() {
        let a = vec![0.1, 0.5, 0.2, 0.9, 0.4, 0.4];
        let b = vec![0.05, 0.3, 0.6, 0.6, 0.2];
        let sorted_a = sorted_copy(&a);
        let sorted_b = sorted_copy(&b);
        let d1 = ks_sorted_vs(&sorted_a, &b);
        let d2 = ks_sorted_vs(&sorted_b, &a);
        assert!((d1 - d2).abs() < 1e-12);
    }

    #[test]
    fn bounded_in_unit_interval() {
        let a = vec![0.1, 0.9, 0.3, 0.7, 0.2, 0.6, 0.15, 0.85];
        let b = vec![0.4, 0.5, 0.45, 0.55, 0.48, 0.52, 0.33];
        let d = ks_two_sample(&a, &b);
        assert!((0.0..=1.0).contains(&d));
    }

    #[test]
    fn empty_sample_scores_zero() {
        let a: Vec<f64> = vec![];
        let b = vec![0.1, 0.2];
        assert_eq!(ks_two_sample(&a, &b), 0.0);
    }
}
