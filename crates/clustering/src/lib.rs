//! Round Feature Engine: per-round memoized mini-batch k-means over
//! tournament feature rows.
//!
//! Given a round's unpacked dataset directory, [`Engine`] fits 5 centroids
//! on the training + tournament feature matrix and predicts cluster
//! assignments for the validation, test, and live partitions, caching the
//! two most recently used rounds.
mod engine;
mod error;
mod features;
mod kmeans;
mod loader;

pub use engine::Engine;
pub use error::ClusteringError;
pub use features::RoundFeatures;
pub use kmeans::Centroids;
pub use kmeans::K;
pub use loader::load_validation_rows;
pub use loader::partition_id_counts;
pub use loader::ValidationRow;
