use criteria_clustering::ValidationRow;
use std::collections::BTreeMap;

/// Percentage of validation eras whose binary-cross-entropy loss is
/// strictly below `ln(2)`. `submission_ids`/`submission_probs`
/// must be sorted ascending by id, as returned by the blob cache; `validation`
/// must be sorted ascending by id, as returned by
/// [`criteria_clustering::load_validation_rows`].
pub fn compute(
    validation: &[ValidationRow],
    submission_ids: &[String],
    submission_probs: &[f64],
) -> f64 {
    let joined = criteria_stats::join_by_id(submission_ids, submission_probs, &ids_of(validation));
    let missing = joined.iter().filter(|p| p.is_nan()).count();
    if missing > 0 {
        log::warn!(
            "consistency: submission missing {}/{} validation rows",
            missing,
            validation.len()
        );
    }

    let mut eras: BTreeMap<&str, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for (row, &probability) in validation.iter().zip(joined.iter()) {
        if probability.is_nan() {
            continue;
        }
        let (labels, probabilities) = eras.entry(row.era.as_str()).or_default();
        labels.push(row.target);
        probabilities.push(probability);
    }
    if eras.is_empty() {
        return 0.0;
    }

    let consistent = eras
        .values()
        .filter(|(labels, probabilities)| {
            criteria_stats::binary_cross_entropy(labels, probabilities)
                < criteria_stats::RANDOM_GUESS_LOSS
        })
        .count();
    100.0 * consistent as f64 / eras.len() as f64
}

fn ids_of(rows: &[ValidationRow]) -> Vec<String> {
    rows.iter().map(|r| r.id.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, era: &str, target: f64) -> ValidationRow {
        ValidationRow {
            id: id.to_string(),
            era: era.to_string(),
            target,
        }
    }

    #[test]
    fn counts_eras_better_than_random_guessing() {
        let validation = vec![
            row("v1", "era1", 1.0),
            row("v2", "era1", 0.0),
            row("v3", "era2", 1.0),
            row("v4", "era2", 0.0),
        ];
        // era1: near-perfect predictions, era2: coin flips
        let ids = vec!["v1".to_string(), "v2".to_string(), "v3".to_string(), "v4".to_string()];
        let probs = vec![0.99, 0.01, 0.5, 0.5];
        let consistency = compute(&validation, &ids, &probs);
        assert_eq!(consistency, 50.0);
    }

    #[test]
    fn perfect_submission_is_fully_consistent() {
        let validation = vec![row("v1", "era1", 1.0), row("v2", "era2", 0.0)];
        let ids = vec!["v1".to_string(), "v2".to_string()];
        let probs = vec![0.999, 0.001];
        assert_eq!(compute(&validation, &ids, &probs), 100.0);
    }
}
