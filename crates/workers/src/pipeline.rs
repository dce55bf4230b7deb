use criteria_clustering::Engine;
use criteria_core::Config;
use criteria_database::Gateway;
use criteria_queue::Queue;
use criteria_queue::QueueError;
use criteria_storage::BlobCache;
use std::sync::Arc;

/// The application object: every collaborator a worker thread needs, held
/// by `Arc` and passed by handle rather than reached for through module
/// statics.
pub struct Pipeline {
    pub gateway: Arc<Gateway>,
    pub blobs: Arc<BlobCache>,
    pub clustering: Arc<Engine>,
    pub ingress: Arc<Queue>,
    pub originality: Arc<Queue>,
    pub concordance: Arc<Queue>,
}

impl Pipeline {
    pub async fn connect(config: &Config) -> Result<Self, QueueError> {
        let postgres = criteria_database::connect(&config.postgres_url).await;
        let gateway = Arc::new(Gateway::new(postgres));
        gateway.migrate().await.expect("metadata schema migration");
        let blobs = Arc::new(BlobCache::connect(config).await);
        let clustering = Arc::new(Engine::new());
        let ingress = Arc::new(Queue::open(config.queue_dir.join("ingress"))?);
        let originality = Arc::new(Queue::open(config.queue_dir.join("originality"))?);
        let concordance = Arc::new(Queue::open(config.queue_dir.join("concordance"))?);
        Ok(Self {
            gateway,
            blobs,
            clustering,
            ingress,
            originality,
            concordance,
        })
    }
}
