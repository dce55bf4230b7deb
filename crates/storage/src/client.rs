use crate::FetchError;
use criteria_core::Config;
use criteria_core::SubmissionId;
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use tokio::sync::Mutex;

/// Capacity of the in-memory parsed-submission cache, mirroring the
/// `functools.lru_cache(maxsize=512)` the originality worker used to
/// memoize a downloaded-and-sorted probability vector by submission id.
const SUBMISSION_CACHE_CAPACITY: usize = 512;

/// A parsed submission file: ids and probabilities, both sorted ascending
/// by id and kept in lockstep. Concordance needs the ids to split a
/// submission into its validation/test/live partitions by row-id;
/// originality only reads `probabilities`.
pub struct SubmissionVector {
    pub ids: Vec<String>,
    pub probabilities: Vec<f64>,
}

/// Downloads and locally caches round datasets and submission files from
/// S3. Dataset archives live under `<local_dir>/datasets/<round>/`,
/// submission blobs under `<local_dir>/submissions/`. Both are idempotent
/// across process restarts: a file already on disk is never re-downloaded.
///
/// The parsed-submission cache lookup is a quick, separately-locked LRU
/// hit/miss; a cache miss for submission `s` takes a lock scoped to `s`
/// alone (§9's "per-key single-flight, not a global lock") so the
/// originality pool's other threads keep fetching unrelated submissions
/// in parallel while one fetch-and-parse is in flight.
pub struct BlobCache {
    s3: aws_sdk_s3::Client,
    upload_bucket: String,
    dataset_bucket: String,
    local_dir: PathBuf,
    submissions: StdMutex<LruCache<SubmissionId, Option<Arc<SubmissionVector>>>>,
    in_flight: StdMutex<HashMap<SubmissionId, Arc<Mutex<()>>>>,
}

impl BlobCache {
    pub async fn connect(config: &Config) -> Self {
        let loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        let aws_config = match (&config.s3_access_key, &config.s3_secret_key) {
            (Some(access), Some(secret)) => {
                let creds = aws_sdk_s3::config::Credentials::new(
                    access, secret, None, None, "criteria-storage",
                );
                loader.credentials_provider(creds).load().await
            }
            _ => loader.load().await,
        };
        let s3 = aws_sdk_s3::Client::new(&aws_config);
        Self {
            s3,
            upload_bucket: config.submissions_bucket.clone(),
            dataset_bucket: config.datasets_bucket.clone(),
            local_dir: config.temp_dir.clone(),
            submissions: StdMutex::new(LruCache::new(
                NonZeroUsize::new(SUBMISSION_CACHE_CAPACITY).unwrap(),
            )),
            in_flight: StdMutex::new(HashMap::new()),
        }
    }

    /// Downloads `bucket/key` to `dest` unless `dest` already exists.
    /// Writes to a sibling `.part` file first and renames into place so a
    /// process crash mid-download never leaves a half-written file that
    /// looks cached.
    async fn download_if_absent(
        &self,
        bucket: &str,
        key: &str,
        dest: &Path,
    ) -> Result<(), FetchError> {
        if dest.is_file() {
            return Ok(());
        }
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        log::info!("downloading s3://{}/{} to {}", bucket, key, dest.display());
        let output = self
            .s3
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|source| FetchError::Download {
                key: key.to_string(),
                source,
            })?;
        let bytes = output.body.collect().await?.into_bytes();
        let tmp = dest.with_extension("part");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, dest).await?;
        Ok(())
    }

    /// Downloads and unpacks `<round_number>/numerai_datasets.zip`,
    /// returning the directory its members were extracted into. A prior
    /// successful extraction (marked by the directory already existing) is
    /// reused as-is.
    pub async fn fetch_dataset(&self, round_number: i64) -> Result<PathBuf, FetchError> {
        let archive = self
            .local_dir
            .join("datasets")
            .join(round_number.to_string())
            .join("numerai_datasets.zip");
        let extract_dir = self
            .local_dir
            .join("datasets")
            .join(round_number.to_string())
            .join("numerai_datasets");

        self.download_if_absent(
            &self.dataset_bucket,
            &format!("{}/numerai_datasets.zip", round_number),
            &archive,
        )
        .await?;

        if extract_dir.is_dir() {
            return Ok(extract_dir);
        }

        let tmp_extract = self
            .local_dir
            .join("datasets")
            .join(round_number.to_string())
            .join(".numerai_datasets.part");
        if tmp_extract.exists() {
            tokio::fs::remove_dir_all(&tmp_extract).await?;
        }
        tokio::fs::create_dir_all(&tmp_extract).await?;
        let archive = archive.clone();
        let dest = tmp_extract.clone();
        tokio::task::spawn_blocking(move || unpack_zip(&archive, &dest))
            .await
            .expect("unpack task panicked")?;
        tokio::fs::rename(&tmp_extract, &extract_dir).await?;
        Ok(extract_dir)
    }

    /// Returns the id-sorted probability column for a submission, fetching
    /// and parsing it on first access and serving the in-memory cache on
    /// every subsequent call. Returns `None` (and caches the `None`) when
    /// the submission could not be downloaded or parsed, matching the
    /// original service's "skip, don't crash the worker" behavior for a
    /// single bad submission.
    ///
    /// A cache miss takes the per-submission lock from `in_flight` rather
    /// than a cache-wide one, so two originality workers racing on
    /// different submissions never wait on each other — only two workers
    /// racing on the *same* submission do, collapsing into a single
    /// download (single-flight).
    pub async fn fetch_submission(
        &self,
        submission_id: SubmissionId,
        blob_key: &str,
    ) -> Option<Arc<SubmissionVector>> {
        if let Some(cached) = self.cache_get(submission_id) {
            return cached;
        }

        let key_lock = {
            let mut in_flight = self.in_flight.lock().expect("in-flight map poisoned");
            in_flight
                .entry(submission_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _guard = key_lock.lock().await;

        // Another worker may have filled the cache while we waited for the
        // per-key lock.
        if let Some(cached) = self.cache_get(submission_id) {
            self.prune_in_flight(submission_id, &key_lock);
            return cached;
        }

        let parsed = match self.fetch_and_parse(blob_key).await {
            Ok(values) => Some(Arc::new(values)),
            Err(e) => {
                log::warn!("could not fetch submission {}: {}", submission_id, e);
                None
            }
        };
        self.submissions
            .lock()
            .expect("submission cache poisoned")
            .put(submission_id, parsed.clone());
        self.prune_in_flight(submission_id, &key_lock);
        parsed
    }

    fn cache_get(&self, submission_id: SubmissionId) -> Option<Option<Arc<SubmissionVector>>> {
        self.submissions
            .lock()
            .expect("submission cache poisoned")
            .get(&submission_id)
            .cloned()
    }

    /// Drops the in-flight entry for `submission_id` once nobody else is
    /// waiting on it, so the map doesn't grow unbounded with one entry per
    /// submission ever requested.
    fn prune_in_flight(&self, submission_id: SubmissionId, key_lock: &Arc<Mutex<()>>) {
        let mut in_flight = self.in_flight.lock().expect("in-flight map poisoned");
        if let Some(entry) = in_flight.get(&submission_id) {
            if Arc::ptr_eq(entry, key_lock) && Arc::strong_count(entry) == 2 {
                in_flight.remove(&submission_id);
            }
        }
    }

    async fn fetch_and_parse(&self, blob_key: &str) -> Result<SubmissionVector, FetchError> {
        let dest = self.local_dir.join("submissions").join(blob_key);
        self.download_if_absent(&self.upload_bucket, blob_key, &dest)
            .await?;
        let dest = dest.clone();
        tokio::task::spawn_blocking(move || parse_submission_csv(&dest))
            .await
            .expect("parse task panicked")
    }
}

fn unpack_zip(archive: &Path, dest: &Path) -> Result<(), FetchError> {
    let file = std::fs::File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file)?;
    zip.extract(dest)?;
    Ok(())
}

/// Parses a submission CSV and sorts by row id ascending. Sorting here
/// (rather than at every call site) keeps the originality and concordance
/// scorers, which both need id-aligned vectors, from repeating the sort.
fn parse_submission_csv(path: &Path) -> Result<SubmissionVector, FetchError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let id_col = headers
        .iter()
        .position(|h| h == "id")
        .ok_or(FetchError::MissingColumn("id"))?;
    let prob_col = headers
        .iter()
        .position(|h| h == "probability")
        .ok_or(FetchError::MissingColumn("probability"))?;

    let mut rows: Vec<(String, f64)> = Vec::new();
    for record in reader.records() {
        let record = record?;
        let id = record.get(id_col).unwrap_or_default().to_string();
        let probability: f64 = record
            .get(prob_col)
            .and_then(|s| s.parse().ok())
            .unwrap_or(f64::NAN);
        rows.push((id, probability));
    }
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    let (ids, probabilities) = rows.into_iter().unzip();
    Ok(SubmissionVector { ids, probabilities })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_and_sorts_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "id,probability").unwrap();
        writeln!(file, "n3,0.9").unwrap();
        writeln!(file, "n1,0.1").unwrap();
        writeln!(file, "n2,0.5").unwrap();
        drop(file);

        let parsed = parse_submission_csv(&path).unwrap();
        assert_eq!(parsed.ids, vec!["n1", "n2", "n3"]);
        assert_eq!(parsed.probabilities, vec![0.1, 0.5, 0.9]);
    }

    #[test]
    fn missing_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub.csv");
        std::fs::write(&path, "id,score\nn1,0.1\n").unwrap();
        let err = parse_submission_csv(&path).unwrap_err();
        assert!(matches!(err, FetchError::MissingColumn("probability")));
    }
}
