use chrono::DateTime;
use chrono::Utc;
use criteria_core::SubmissionId;
use serde::Deserialize;
use serde::Serialize;

/// One unit of work flowing through the queue triad: a submission that
/// needs to be (depending on which queue it sits in) reflected on the
/// leaderboard, scored for concordance, or scored for originality.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QueueEntry {
    pub submission_id: SubmissionId,
    pub enqueued_at: DateTime<Utc>,
}

impl QueueEntry {
    pub fn new(submission_id: SubmissionId) -> Self {
        Self {
            submission_id,
            enqueued_at: Utc::now(),
        }
    }
}
