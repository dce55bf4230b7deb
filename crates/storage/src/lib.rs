//! Local disk cache for dataset archives and submission files fetched from
//! S3, plus an in-memory cache of parsed, id-sorted submission probability
//! vectors for the originality worker pool.
mod client;
mod error;

pub use client::BlobCache;
pub use client::SubmissionVector;
pub use error::FetchError;
