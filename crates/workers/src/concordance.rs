use crate::Pipeline;
use criteria_clustering::RoundFeatures;
use criteria_core::Metric;
use criteria_core::SubmissionId;
use criteria_core::Verdict;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// A submission is concordant at this threshold.
const CONCORDANCE_THRESHOLD: f64 = 0.12;

/// Drains the *concordance* queue on a single dedicated thread — serial,
/// because the round-features memo benefits from cache locality and
/// fitting k-means is CPU-heavy.
pub fn run(pipeline: Arc<Pipeline>, runtime: tokio::runtime::Handle) {
    loop {
        if criteria_core::interrupted() {
            log::info!("concordance worker stopping");
            return;
        }
        let Some((offset, entry)) = pipeline.concordance.get_timeout(Duration::from_millis(500))
        else {
            continue;
        };

        if let Err(e) = runtime.block_on(process(&pipeline, entry.submission_id)) {
            log::error!(
                "concordance: submission {} failed: {:#}",
                entry.submission_id,
                e
            );
        }

        if let Err(e) = pipeline.concordance.task_done(offset) {
            log::error!("concordance: failed to acknowledge offset {}: {}", offset, e);
        }
    }
}

async fn process(pipeline: &Pipeline, submission_id: SubmissionId) -> anyhow::Result<()> {
    let submission = pipeline.gateway.get_submission(submission_id).await?;
    let round_number = pipeline.gateway.get_round_number(submission_id).await?;
    let dataset_dir = pipeline.blobs.fetch_dataset(round_number).await?;

    let vector = pipeline
        .blobs
        .fetch_submission(submission_id, &submission.blob_key)
        .await;
    let Some(vector) = vector else {
        anyhow::bail!("could not fetch submission blob {}", submission.blob_key);
    };

    let features = resolve_features(pipeline, submission.round, &dataset_dir)?;

    let p_val = criteria_stats::join_by_id(&vector.ids, &vector.probabilities, &features.val_ids);
    let p_test =
        criteria_stats::join_by_id(&vector.ids, &vector.probabilities, &features.test_ids);
    let p_live =
        criteria_stats::join_by_id(&vector.ids, &vector.probabilities, &features.live_ids);

    let scores = cluster_scores(
        &p_val,
        &features.c_val,
        &p_test,
        &features.c_test,
        &p_live,
        &features.c_live,
    );
    let concordant = is_concordant(&scores);

    pipeline
        .gateway
        .write_verdict(submission_id, Metric::Concordance, Verdict::Value(concordant))
        .await?;
    Ok(())
}

/// Per-cluster KS score `s_i = max(D(val,test), D(val,live), D(live,test))`
/// for every cluster index present in `c_val`. Pure and
/// I/O-free so it can be exercised directly against fixture partitions.
fn cluster_scores(
    p_val: &[f64],
    c_val: &[usize],
    p_test: &[f64],
    c_test: &[usize],
    p_live: &[f64],
    c_live: &[usize],
) -> Vec<f64> {
    let clusters: BTreeSet<usize> = c_val.iter().copied().collect();
    clusters
        .into_iter()
        .map(|i| {
            let val = select(p_val, c_val, i);
            let test = select(p_test, c_test, i);
            let live = select(p_live, c_live, i);
            let d_val_test = criteria_stats::ks_two_sample(&val, &test);
            let d_val_live = criteria_stats::ks_two_sample(&val, &live);
            let d_live_test = criteria_stats::ks_two_sample(&live, &test);
            d_val_test.max(d_val_live).max(d_live_test)
        })
        .collect()
}

/// A submission is concordant iff the mean of its per-cluster scores is
/// strictly below [`CONCORDANCE_THRESHOLD`]. A round with no
/// clusters present in `c_val` (only possible for an empty validation
/// partition) is vacuously concordant.
fn is_concordant(scores: &[f64]) -> bool {
    if scores.is_empty() {
        return true;
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    mean < CONCORDANCE_THRESHOLD
}

/// Resolves `RoundFeatures` for `round_id`, recomputing once on a detected
/// round restart: the dataset's *current* partition sizes no longer
/// match the cached cluster vectors' lengths.
fn resolve_features(
    pipeline: &Pipeline,
    round_id: criteria_core::RoundId,
    dataset_dir: &Path,
) -> anyhow::Result<Arc<RoundFeatures>> {
    let mut features = pipeline.clustering.get_or_compute(round_id, dataset_dir)?;
    let current = criteria_clustering::partition_id_counts(dataset_dir)?;
    let cached = (
        features.val_ids.len(),
        features.test_ids.len(),
        features.live_ids.len(),
    );
    if current != cached {
        log::warn!(
            "round {} restart detected: dataset partitions {:?} != cached {:?}, recomputing",
            round_id,
            current,
            cached
        );
        pipeline.clustering.invalidate(round_id);
        features = pipeline.clustering.get_or_compute(round_id, dataset_dir)?;
        let retried = (
            features.val_ids.len(),
            features.test_ids.len(),
            features.live_ids.len(),
        );
        if current != retried {
            anyhow::bail!(
                "round {} partitions still mismatched after recompute: dataset {:?} != recomputed {:?}",
                round_id,
                current,
                retried
            );
        }
    }
    Ok(features)
}

/// Values assigned to cluster `target`, excluding rows the submission
/// didn't cover (surfaced by [`criteria_stats::join_by_id`] as `NaN`).
fn select(values: &[f64], clusters: &[usize], target: usize) -> Vec<f64> {
    values
        .iter()
        .zip(clusters.iter())
        .filter(|(v, &c)| c == target && !v.is_nan())
        .map(|(&v, _)| v)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three equal-sized partitions drawn from the same
    /// distribution, single cluster — mean KS near zero, concordant.
    #[test]
    fn same_distribution_across_partitions_is_concordant() {
        let n = 1000;
        let values: Vec<f64> = (0..n).map(|i| (i as f64) / n as f64).collect();
        let clusters = vec![0usize; n];
        let scores = cluster_scores(&values, &clusters, &values, &clusters, &values, &clusters);
        assert!(is_concordant(&scores), "scores = {:?}", scores);
    }

    /// Validation and test drawn from different distributions
    /// with identical cluster assignments — mean KS near 1, not concordant.
    #[test]
    fn distribution_shift_across_partitions_is_not_concordant() {
        let n = 200;
        let p_val: Vec<f64> = (0..n).map(|i| 0.05 + 0.0005 * i as f64).collect();
        let p_test: Vec<f64> = (0..n).map(|i| 0.55 + 0.0005 * i as f64).collect();
        let p_live = p_val.clone();
        let clusters = vec![0usize; n];
        let scores = cluster_scores(
            &p_val, &clusters, &p_test, &clusters, &p_live, &clusters,
        );
        assert!(!is_concordant(&scores), "scores = {:?}", scores);
    }

    #[test]
    fn concordance_is_monotonic_in_threshold() {
        // mean_ks < t1 < t2 implies concordant at t1 implies concordant at t2
        let scores = vec![0.05, 0.07, 0.06];
        let mean: f64 = scores.iter().sum::<f64>() / scores.len() as f64;
        let t1 = mean + 0.01;
        let t2 = t1 + 0.01;
        assert!(mean < t1 && t1 < t2);
        assert!(mean < t1); // concordant at t1
        assert!(mean < t2); // therefore concordant at t2 too
    }

    #[test]
    fn select_drops_other_clusters_and_missing_rows() {
        let values = vec![1.0, f64::NAN, 3.0, 4.0];
        let clusters = vec![0, 0, 1, 0];
        assert_eq!(select(&values, &clusters, 0), vec![1.0, 4.0]);
        assert_eq!(select(&values, &clusters, 1), vec![3.0]);
    }
}
