//! Table DDL for the scoring service's three tables.
use crate::Schema;

/// Table for tournament round metadata.
#[rustfmt::skip]
pub const ROUNDS:      &str = "rounds";
/// Table for ingested submissions.
#[rustfmt::skip]
pub const SUBMISSIONS: &str = "submissions";
/// Table for per-submission leaderboard verdicts.
#[rustfmt::skip]
pub const LEADERBOARD: &str = "leaderboard";

pub struct Rounds;
pub struct Submissions;
pub struct Leaderboard;

impl Schema for Rounds {
    fn name() -> &'static str {
        ROUNDS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            ROUNDS,
            " (
                id         UUID PRIMARY KEY,
                number     BIGINT NOT NULL UNIQUE,
                open_time  TIMESTAMPTZ NOT NULL
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_",
            ROUNDS,
            "_number ON ",
            ROUNDS,
            " (number);"
        )
    }
}

impl Schema for Submissions {
    fn name() -> &'static str {
        SUBMISSIONS
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            SUBMISSIONS,
            " (
                id          UUID PRIMARY KEY,
                user_id     UUID NOT NULL,
                round_id    UUID NOT NULL REFERENCES ",
            ROUNDS,
            " (id),
                blob_key    TEXT NOT NULL,
                selected    BOOLEAN NOT NULL DEFAULT true,
                created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_",
            SUBMISSIONS,
            "_round_created ON ",
            SUBMISSIONS,
            " (round_id, created_at);"
        )
    }
}

impl Schema for Leaderboard {
    fn name() -> &'static str {
        LEADERBOARD
    }
    fn creates() -> &'static str {
        const_format::concatcp!(
            "CREATE TABLE IF NOT EXISTS ",
            LEADERBOARD,
            " (
                submission_id  UUID PRIMARY KEY REFERENCES ",
            SUBMISSIONS,
            " (id),
                consistency    DOUBLE PRECISION NOT NULL,
                concordant     BOOLEAN,
                original       BOOLEAN,
                updated_at     TIMESTAMPTZ NOT NULL DEFAULT now()
            );"
        )
    }
    fn indices() -> &'static str {
        const_format::concatcp!(
            "CREATE INDEX IF NOT EXISTS idx_",
            LEADERBOARD,
            "_pending ON ",
            LEADERBOARD,
            " (submission_id) WHERE concordant IS NULL OR original IS NULL;"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ddl_references_expected_tables() {
        assert!(Rounds::creates().contains("rounds"));
        assert!(Submissions::creates().contains("REFERENCES rounds"));
        assert!(Leaderboard::creates().contains("REFERENCES submissions"));
    }
}
