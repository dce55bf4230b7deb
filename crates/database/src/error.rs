#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
    #[error("submission {0} not found")]
    SubmissionNotFound(criteria_core::SubmissionId),
    #[error("round {0} not found")]
    RoundNotFound(criteria_core::RoundId),
    #[error("cannot write a pending verdict, only a decided one")]
    PendingVerdictWrite,
}
