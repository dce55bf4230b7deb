/// Cluster-index assignments for a round's tournament partitions, plus the
/// row ids they were assigned in order. Created lazily on first use,
/// invalidated on a round restart (§4.D).
pub struct RoundFeatures {
    pub k: usize,
    pub val_ids: Vec<String>,
    pub test_ids: Vec<String>,
    pub live_ids: Vec<String>,
    pub c_val: Vec<usize>,
    pub c_test: Vec<usize>,
    pub c_live: Vec<usize>,
}
