//! Pure statistics used by the scoring pipeline: binary cross-entropy
//! (consistency), the two-sample Kolmogorov-Smirnov statistic (concordance
//! and originality), and Pearson correlation (originality).
//!
//! Kept dependency-free and free of any I/O so it can be exercised directly
//! with `Vec<f64>` fixtures.
mod bce;
mod join;
mod ks;
mod pearson;

pub use bce::binary_cross_entropy;
pub use bce::RANDOM_GUESS_LOSS;
pub use join::join_by_id;
pub use join::join_common;
pub use ks::ks_sorted_vs;
pub use ks::ks_two_sample;
pub use pearson::pearson;
pub use pearson::stddev;
