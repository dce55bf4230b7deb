use crate::GatewayError;
use crate::Leaderboard;
use crate::Rounds;
use crate::Schema;
use crate::Submissions;
use chrono::DateTime;
use chrono::Utc;
use criteria_core::Metric;
use criteria_core::RoundId;
use criteria_core::Submission;
use criteria_core::SubmissionId;
use criteria_core::UserId;
use criteria_core::Verdict;
use std::sync::Arc;
use tokio_postgres::Client;

/// Typed façade over the submission/round/leaderboard tables. Every method
/// is one transaction; callers never see raw SQL.
pub struct Gateway {
    client: Arc<Client>,
}

impl Gateway {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// Creates the tables and indices if they don't already exist. Safe to
    /// call on every process start.
    pub async fn migrate(&self) -> Result<(), GatewayError> {
        self.client.batch_execute(Rounds::creates()).await?;
        self.client.batch_execute(Rounds::indices()).await?;
        self.client.batch_execute(Submissions::creates()).await?;
        self.client.batch_execute(Submissions::indices()).await?;
        self.client.batch_execute(Leaderboard::creates()).await?;
        self.client.batch_execute(Leaderboard::indices()).await?;
        Ok(())
    }

    pub async fn get_submission(&self, id: SubmissionId) -> Result<Submission, GatewayError> {
        let row = self
            .client
            .query_opt(
                "SELECT user_id, round_id, blob_key, created_at
                 FROM submissions WHERE id = $1",
                &[&id.inner()],
            )
            .await?
            .ok_or(GatewayError::SubmissionNotFound(id))?;
        Ok(Submission {
            id,
            user: UserId::from(row.get::<_, uuid::Uuid>(0)),
            round: RoundId::from(row.get::<_, uuid::Uuid>(1)),
            blob_key: row.get(2),
            created_at: row.get(3),
        })
    }

    pub async fn get_round_number(&self, submission_id: SubmissionId) -> Result<i64, GatewayError> {
        let row = self
            .client
            .query_opt(
                "SELECT r.number FROM rounds r
                 JOIN submissions s ON s.round_id = r.id
                 WHERE s.id = $1",
                &[&submission_id.inner()],
            )
            .await?
            .ok_or(GatewayError::SubmissionNotFound(submission_id))?;
        Ok(row.get(0))
    }

    pub async fn get_created_at(
        &self,
        submission_id: SubmissionId,
    ) -> Result<DateTime<Utc>, GatewayError> {
        let row = self
            .client
            .query_opt(
                "SELECT created_at FROM submissions WHERE id = $1",
                &[&submission_id.inner()],
            )
            .await?
            .ok_or(GatewayError::SubmissionNotFound(submission_id))?;
        Ok(row.get(0))
    }

    /// Sets the consistency metric and (re-)initializes both verdicts to
    /// pending (NULL). Idempotent: re-running for the same submission just
    /// overwrites the row with the same values.
    pub async fn mark_leaderboard_pending(
        &self,
        submission_id: SubmissionId,
        consistency: f64,
    ) -> Result<(), GatewayError> {
        self.client
            .execute(
                "INSERT INTO leaderboard (submission_id, consistency, concordant, original)
                 VALUES ($1, $2, NULL, NULL)
                 ON CONFLICT (submission_id)
                 DO UPDATE SET consistency = EXCLUDED.consistency,
                               concordant = NULL,
                               original = NULL,
                               updated_at = now()",
                &[&submission_id.inner(), &consistency],
            )
            .await?;
        Ok(())
    }

    /// Sets a verdict column, overwriting any prior value. Writing the same
    /// value twice is a no-op in effect, which is what makes this safe to
    /// call again after a redelivered queue entry. `verdict` must be
    /// `Verdict::Value`; a pending verdict is only ever written by
    /// `mark_leaderboard_pending`, never here.
    pub async fn write_verdict(
        &self,
        submission_id: SubmissionId,
        metric: Metric,
        verdict: Verdict,
    ) -> Result<(), GatewayError> {
        let Verdict::Value(value) = verdict else {
            return Err(GatewayError::PendingVerdictWrite);
        };
        let statement = format!(
            "UPDATE leaderboard SET {} = $1, updated_at = now() WHERE submission_id = $2",
            metric.column()
        );
        self.client
            .execute(&statement, &[&value, &submission_id.inner()])
            .await?;
        Ok(())
    }

    /// Most-recent selected submission per other user in the round, created
    /// strictly before `before`, ordered by `created_at` descending.
    pub async fn list_cohort(
        &self,
        round_id: RoundId,
        excluding_user: UserId,
        before: DateTime<Utc>,
    ) -> Result<Vec<Submission>, GatewayError> {
        let rows = self
            .client
            .query(
                "SELECT DISTINCT ON (user_id) id, user_id, blob_key, created_at
                 FROM submissions
                 WHERE round_id = $1
                   AND user_id != $2
                   AND created_at < $3
                   AND selected
                 ORDER BY user_id, created_at DESC",
                &[&round_id.inner(), &excluding_user.inner(), &before],
            )
            .await?;
        let mut cohort: Vec<Submission> = rows
            .into_iter()
            .map(|row| Submission {
                id: SubmissionId::from(row.get::<_, uuid::Uuid>(0)),
                user: UserId::from(row.get::<_, uuid::Uuid>(1)),
                round: round_id,
                blob_key: row.get(2),
                created_at: row.get(3),
            })
            .collect();
        cohort.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(cohort)
    }
}
