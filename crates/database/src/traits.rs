//! PostgreSQL schema metadata.
//!
//! Unlike a bulk-training pipeline that streams millions of rows through
//! `COPY`, this gateway writes one row at a time in response to HTTP and
//! queue events, so only DDL generation survives here — no binary row
//! encoding, no `COPY` writer.
pub trait Schema {
    /// Returns the table name in the database.
    fn name() -> &'static str;
    /// Returns `CREATE TABLE IF NOT EXISTS` DDL statement.
    fn creates() -> &'static str;
    /// Returns `CREATE INDEX IF NOT EXISTS` statements for all indices.
    fn indices() -> &'static str;
}
