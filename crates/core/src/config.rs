use std::path::PathBuf;

/// Environment-driven configuration, read once at startup.
///
/// Missing required configuration is fatal: the process refuses to serve
/// rather than starting in a half-configured state.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub api_key: String,
    pub num_threads: usize,
    pub postgres_url: String,
    pub submissions_bucket: String,
    pub datasets_bucket: String,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,
    pub queue_dir: PathBuf,
    pub temp_dir: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for environment variable {0}: {1}")]
    Invalid(&'static str, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv::dotenv();

        let port = optional_env("PORT")
            .map(|v| {
                v.parse::<u16>()
                    .map_err(|_| ConfigError::Invalid("PORT", v))
            })
            .transpose()?
            .unwrap_or(5151);

        let api_key = required_env("API_KEY")?;
        if api_key.is_empty() {
            return Err(ConfigError::Invalid("API_KEY", api_key));
        }

        let num_threads = optional_env("NUM_THREADS")
            .map(|v| {
                v.parse::<usize>()
                    .map_err(|_| ConfigError::Invalid("NUM_THREADS", v))
            })
            .transpose()?
            .unwrap_or(32);
        if num_threads < 3 {
            return Err(ConfigError::Invalid(
                "NUM_THREADS",
                num_threads.to_string(),
            ));
        }

        let postgres_url = required_env("POSTGRES_URL")?;
        let submissions_bucket = required_env("S3_UPLOAD_BUCKET")?;
        let datasets_bucket = required_env("S3_DATASET_BUCKET")?;
        let s3_access_key = optional_env("S3_ACCESS_KEY");
        let s3_secret_key = optional_env("S3_SECRET_KEY");

        let queue_dir = optional_env("QUEUE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/tmp/criteria/queues"));
        let temp_dir = optional_env("BLOB_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/tmp/criteria/blobs"));

        Ok(Self {
            port,
            api_key,
            num_threads,
            postgres_url,
            submissions_bucket,
            datasets_bucket,
            s3_access_key,
            s3_secret_key,
            queue_dir,
            temp_dir,
        })
    }

    /// Size of the originality worker pool: NUM_THREADS - 3, reserving
    /// one thread each for the HTTP server, ingress consumer, and
    /// concordance worker. `from_env` rejects NUM_THREADS below 3, so
    /// this never underflows; it can be exactly 0 at the NUM_THREADS == 3
    /// boundary, meaning the originality queue is never drained.
    pub fn originality_pool_size(&self) -> usize {
        self.num_threads - 3
    }
}

fn required_env(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn optional_env(key: &'static str) -> Option<String> {
    std::env::var(key).ok()
}
