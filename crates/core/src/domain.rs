use crate::ID;
use chrono::DateTime;
use chrono::Utc;

/// Marker type; see [`ID`].
#[derive(Debug)]
pub struct Submission {
    pub id: SubmissionId,
    pub user: UserId,
    pub round: RoundId,
    pub created_at: DateTime<Utc>,
    pub blob_key: String,
}

pub type SubmissionId = ID<SubmissionMarker>;
#[derive(Debug)]
pub struct SubmissionMarker;

pub type UserId = ID<UserMarker>;
#[derive(Debug)]
pub struct UserMarker;

/// A time-bounded tournament instance with its own dataset and leaderboard.
#[derive(Debug, Clone, Copy)]
pub struct Round {
    pub id: RoundId,
    pub number: i64,
    pub open_time: DateTime<Utc>,
}

pub type RoundId = ID<RoundMarker>;
#[derive(Debug)]
pub struct RoundMarker;

/// The two independent verdicts a submission receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Concordance,
    Originality,
}

impl Metric {
    pub fn column(&self) -> &'static str {
        match self {
            Metric::Concordance => "concordant",
            Metric::Originality => "original",
        }
    }
}

/// Tri-state verdict: created pending, transitions exactly once to a bool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pending,
    Value(bool),
}

impl Verdict {
    pub fn is_pending(&self) -> bool {
        matches!(self, Verdict::Pending)
    }
}
