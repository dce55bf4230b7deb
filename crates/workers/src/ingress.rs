use crate::consistency;
use crate::Pipeline;
use criteria_core::SubmissionId;
use criteria_queue::QueueEntry;
use std::sync::Arc;
use std::time::Duration;

/// Drains the *ingress* queue on a single dedicated thread (serial, because
/// a submission's leaderboard-pending write must precede its fan-out).
/// Blocks on `ingress.get_timeout` between submissions, checking for a
/// cooperative shutdown request on each wakeup.
pub fn run(pipeline: Arc<Pipeline>, runtime: tokio::runtime::Handle) {
    loop {
        if criteria_core::interrupted() {
            log::info!("ingress consumer stopping");
            return;
        }
        let Some((offset, entry)) = pipeline.ingress.get_timeout(Duration::from_millis(500))
        else {
            continue;
        };

        if let Err(e) = runtime.block_on(process(&pipeline, entry.submission_id)) {
            log::error!("ingress: submission {} failed: {:#}", entry.submission_id, e);
        }

        // Acknowledge unconditionally: a permanently broken submission must
        // never block the next one behind it.
        if let Err(e) = pipeline.ingress.task_done(offset) {
            log::error!("ingress: failed to acknowledge offset {}: {}", offset, e);
        }
    }
}

async fn process(pipeline: &Pipeline, submission_id: SubmissionId) -> anyhow::Result<()> {
    let submission = pipeline.gateway.get_submission(submission_id).await?;
    let round_number = pipeline.gateway.get_round_number(submission_id).await?;
    let dataset_dir = pipeline.blobs.fetch_dataset(round_number).await?;

    let dir = dataset_dir.clone();
    let validation =
        tokio::task::spawn_blocking(move || criteria_clustering::load_validation_rows(&dir))
            .await
            .expect("validation loader task panicked")?;

    let vector = pipeline
        .blobs
        .fetch_submission(submission_id, &submission.blob_key)
        .await;
    let Some(vector) = vector else {
        anyhow::bail!("could not fetch submission blob {}", submission.blob_key);
    };

    let consistency = consistency::compute(&validation, &vector.ids, &vector.probabilities);
    pipeline
        .gateway
        .mark_leaderboard_pending(submission_id, consistency)
        .await?;

    let entry = QueueEntry::new(submission_id);
    pipeline.originality.put(&entry)?;
    pipeline.concordance.put(&entry)?;
    Ok(())
}
