use crate::Pipeline;
use criteria_core::Metric;
use criteria_core::SubmissionId;
use criteria_core::Verdict;
use std::sync::Arc;
use std::time::Duration;

/// Two-sample KS below this is treated as an exact duplicate.
const IS_EXACT_DUPE_THRESH: f64 = 0.005;
/// Two-sample KS at or below this counts toward the similar-model tally.
const IS_SIMILAR_THRESH: f64 = 0.03;
/// Similar-model tally that tips a submission to non-original.
const MAX_SIMILAR_MODELS: usize = 1;
/// |Pearson correlation| above this, against any one cohort member, is
/// non-original regardless of KS distance.
const CORRELATION_THRESH: f64 = 0.95;

/// One thread from the originality pool, draining the *originality* queue.
/// Pool size is `NUM_THREADS - 3`; every thread runs this same loop
/// against the same shared [`Pipeline`].
pub fn run(pipeline: Arc<Pipeline>, runtime: tokio::runtime::Handle) {
    loop {
        if criteria_core::interrupted() {
            log::info!("originality worker stopping");
            return;
        }
        let Some((offset, entry)) = pipeline.originality.get_timeout(Duration::from_millis(500))
        else {
            continue;
        };

        if let Err(e) = runtime.block_on(process(&pipeline, entry.submission_id)) {
            log::error!(
                "originality: submission {} failed: {:#}",
                entry.submission_id,
                e
            );
        }

        if let Err(e) = pipeline.originality.task_done(offset) {
            log::error!("originality: failed to acknowledge offset {}: {}", offset, e);
        }
    }
}

async fn process(pipeline: &Pipeline, submission_id: SubmissionId) -> anyhow::Result<()> {
    let submission = pipeline.gateway.get_submission(submission_id).await?;

    let subject = pipeline
        .blobs
        .fetch_submission(submission_id, &submission.blob_key)
        .await;
    let Some(subject) = subject else {
        anyhow::bail!("could not fetch submission blob {}", submission.blob_key);
    };

    if criteria_stats::stddev(&subject.probabilities) == 0.0 {
        return write_verdict(pipeline, submission_id, Verdict::Value(false)).await;
    }

    let mut sorted_subject = subject.probabilities.clone();
    sorted_subject.sort_by(|a, b| a.partial_cmp(b).expect("non-NaN probability"));

    let created_at = pipeline.gateway.get_created_at(submission_id).await?;
    let cohort = pipeline
        .gateway
        .list_cohort(submission.round, submission.user, created_at)
        .await?;

    let mut others = Vec::with_capacity(cohort.len());
    for entry in cohort {
        if let Some(vector) = pipeline.blobs.fetch_submission(entry.id, &entry.blob_key).await {
            others.push(vector);
        }
    }
    let others: Vec<_> = others
        .iter()
        .map(|v| (v.ids.as_slice(), v.probabilities.as_slice()))
        .collect();

    let original = is_original(
        &subject.ids,
        &subject.probabilities,
        &sorted_subject,
        &others,
    );
    write_verdict(pipeline, submission_id, Verdict::Value(original)).await
}

/// Iterates the cohort in order, applying the
/// correlation / exact-dupe / similar-count clauses (in that order — see
/// the design notes on clause ordering). Pure and I/O-free: `others` is
/// already fetched, so this can be exercised directly with fixture
/// vectors for the end-to-end scenarios.
fn is_original(
    subject_ids: &[String],
    subject: &[f64],
    sorted_subject: &[f64],
    others: &[(&[String], &[f64])],
) -> bool {
    let mut similar_count = 0usize;
    for &(other_ids, other) in others {
        if criteria_stats::stddev(other) > 0.0 {
            let (a, b) = criteria_stats::join_common(subject_ids, subject, other_ids, other);
            if !a.is_empty() && criteria_stats::pearson(&a, &b).abs() > CORRELATION_THRESH {
                return false;
            }
        }

        let ks = criteria_stats::ks_sorted_vs(sorted_subject, other);
        if ks < IS_EXACT_DUPE_THRESH {
            return false;
        }
        if ks <= IS_SIMILAR_THRESH {
            similar_count += 1;
            if similar_count >= MAX_SIMILAR_MODELS {
                return false;
            }
        }
    }
    true
}

async fn write_verdict(
    pipeline: &Pipeline,
    submission_id: SubmissionId,
    verdict: Verdict,
) -> anyhow::Result<()> {
    pipeline
        .gateway
        .write_verdict(submission_id, Metric::Originality, verdict)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("r{}", i)).collect()
    }

    fn sorted(values: &[f64]) -> Vec<f64> {
        let mut v = values.to_vec();
        v.sort_by(|a, b| a.partial_cmp(b).unwrap());
        v
    }

    /// An identical submission in the cohort makes the subject
    /// non-original via the exact-duplicate clause.
    #[test]
    fn identical_submission_is_non_original() {
        let row_ids = ids(5);
        let subject = vec![0.1, 0.2, 0.3, 0.4, 0.5];
        let other = subject.clone();
        let others = [(row_ids.as_slice(), other.as_slice())];
        assert!(!is_original(&row_ids, &subject, &sorted(&subject), &others));
    }

    /// A cohort member drawn from a disjoint range of values
    /// leaves the subject original.
    #[test]
    fn disjoint_submission_is_original() {
        let row_ids = ids(5);
        let subject = vec![0.05, 0.06, 0.07, 0.08, 0.09];
        let other = vec![0.90, 0.91, 0.92, 0.93, 0.94];
        let others = [(row_ids.as_slice(), other.as_slice())];
        assert!(is_original(&row_ids, &subject, &sorted(&subject), &others));
    }

    /// A cohort member that is an affine rescaling of the
    /// subject is non-original via the correlation clause, even though the
    /// two vectors occupy different ranges and would not KS-match exactly.
    #[test]
    fn highly_correlated_different_scale_is_non_original() {
        let n = 100;
        let row_ids = ids(n);
        let subject: Vec<f64> = (0..n).map(|i| i as f64 / 100.0).collect();
        let other: Vec<f64> = subject.iter().map(|x| 0.01 + 0.5 * x).collect();
        let others = [(row_ids.as_slice(), other.as_slice())];
        assert!(!is_original(&row_ids, &subject, &sorted(&subject), &others));
    }

    /// A constant submission is non-original without even
    /// consulting the cohort (the stddev-zero early return in `process`).
    #[test]
    fn constant_submission_has_zero_stddev() {
        let subject = vec![0.5; 1000];
        assert_eq!(criteria_stats::stddev(&subject), 0.0);
    }

    #[test]
    fn empty_cohort_is_original() {
        let row_ids = ids(5);
        let subject = vec![0.1, 0.2, 0.3, 0.4, 0.5];
        assert!(is_original(&row_ids, &subject, &sorted(&subject), &[]));
    }

    #[test]
    fn single_similar_but_not_dupe_model_is_non_original() {
        let n = 50;
        let row_ids = ids(n);
        let subject: Vec<f64> = (0..n).map(|i| i as f64 / n as f64).collect();
        // small jitter: close enough in KS to count as "similar" but not an
        // exact dupe, and MAX_SIMILAR_MODELS is 1.
        let other: Vec<f64> = subject.iter().map(|x| (x + 0.001).min(0.999)).collect();
        let others = [(row_ids.as_slice(), other.as_slice())];
        let ks = criteria_stats::ks_two_sample(&subject, &other);
        assert!(ks <= IS_SIMILAR_THRESH && ks >= IS_EXACT_DUPE_THRESH, "ks = {}", ks);
        assert!(!is_original(&row_ids, &subject, &sorted(&subject), &others));
    }
}
