use crate::kmeans::Centroids;
use crate::kmeans::K;
use crate::loader;
use crate::ClusteringError;
use crate::RoundFeatures;
use criteria_core::RoundId;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

/// Two most-recently-used `RoundFeatures`, recomputed on a memo miss.
///
/// Capacity 2 rather than 1 because concordance and ingress can be working
/// a new round's first submissions while a handful of the previous round's
/// submissions are still draining through the queue.
pub struct Engine {
    memo: Mutex<VecDeque<(RoundId, Arc<RoundFeatures>)>>,
}

const CAPACITY: usize = 2;

impl Engine {
    pub fn new() -> Self {
        Self {
            memo: Mutex::new(VecDeque::with_capacity(CAPACITY)),
        }
    }

    /// Returns the memoized `RoundFeatures` for `round_id`, computing and
    /// inserting it on a miss.
    pub fn get_or_compute(
        &self,
        round_id: RoundId,
        dataset_dir: &Path,
    ) -> Result<Arc<RoundFeatures>, ClusteringError> {
        {
            let memo = self.memo.lock().expect("features memo poisoned");
            if let Some((_, features)) = memo.iter().find(|(id, _)| *id == round_id) {
                return Ok(features.clone());
            }
        }
        log::info!("round {} features not memoized, fitting k-means", round_id);
        let computed = Arc::new(compute(dataset_dir)?);
        let mut memo = self.memo.lock().expect("features memo poisoned");
        if memo.len() >= CAPACITY {
            memo.pop_front();
        }
        memo.push_back((round_id, computed.clone()));
        Ok(computed)
    }

    /// Forces recomputation on the next call, used after a round-restart is
    /// detected (the cached cluster vectors no longer line up with the
    /// submission's partitions).
    pub fn invalidate(&self, round_id: RoundId) {
        log::info!("invalidating memoized features for round {}", round_id);
        let mut memo = self.memo.lock().expect("features memo poisoned");
        memo.retain(|(id, _)| *id != round_id);
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

fn compute(dataset_dir: &Path) -> Result<RoundFeatures, ClusteringError> {
    let dataset = loader::load(dataset_dir)?;
    let centroids = Centroids::fit(&dataset.training);
    let c_val = centroids.predict(&dataset.validation.features);
    let c_test = centroids.predict(&dataset.test.features);
    let c_live = centroids.predict(&dataset.live.features);
    Ok(RoundFeatures {
        k: K,
        val_ids: dataset.validation.ids,
        test_ids: dataset.test.ids,
        live_ids: dataset.live.ids,
        c_val,
        c_test,
        c_live,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_dataset(dir: &Path) {
        let mut training = std::fs::File::create(dir.join("numerai_training_data.csv")).unwrap();
        writeln!(training, "id,feature1,feature2,target").unwrap();
        for i in 0..20 {
            writeln!(training, "t{},{},{},0.5", i, i as f64, (i * 2) as f64).unwrap();
        }
        let mut tournament =
            std::fs::File::create(dir.join("numerai_tournament_data.csv")).unwrap();
        writeln!(tournament, "id,feature1,feature2,data_type").unwrap();
        for i in 0..10 {
            writeln!(tournament, "v{},{},{},validation", i, i as f64, (i * 2) as f64).unwrap();
            writeln!(tournament, "s{},{},{},test", i, i as f64, (i * 2) as f64).unwrap();
            writeln!(tournament, "l{},{},{},live", i, i as f64, (i * 2) as f64).unwrap();
        }
    }

    #[test]
    fn computes_and_memoizes_round_features() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        let engine = Engine::new();
        let round_id = RoundId::default();
        let features = engine.get_or_compute(round_id, dir.path()).unwrap();
        assert_eq!(features.k, K);
        assert_eq!(features.val_ids.len(), 10);
        assert_eq!(features.c_val.len(), 10);

        // second call hits the memo and returns the same Arc
        let again = engine.get_or_compute(round_id, dir.path()).unwrap();
        assert!(Arc::ptr_eq(&features, &again));
    }

    #[test]
    fn invalidate_forces_recompute() {
        let dir = tempfile::tempdir().unwrap();
        write_dataset(dir.path());
        let engine = Engine::new();
        let round_id = RoundId::default();
        let first = engine.get_or_compute(round_id, dir.path()).unwrap();
        engine.invalidate(round_id);
        let second = engine.get_or_compute(round_id, dir.path()).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }
}
