#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue storage error: {0}")]
    Storage(#[from] sled::Error),
    #[error("failed to serialize queue entry: {0}")]
    Serialize(#[from] bincode::Error),
    #[error("acknowledged an offset that was not leased")]
    NotLeased,
}
