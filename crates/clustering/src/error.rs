#[derive(Debug, thiserror::Error)]
pub enum ClusteringError {
    #[error("dataset io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed dataset csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("dataset missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("dataset has no feature columns")]
    NoFeatureColumns,
}
