//! Submission scoring service binary.
//!
//! Starts the ingestion HTTP server alongside the ingress, concordance, and
//! originality workers, all sharing one [`criteria_workers::Pipeline`].

#[tokio::main]
async fn main() {
    criteria_core::log();
    criteria_core::graceful_shutdown();

    let config = criteria_core::Config::from_env().expect("load configuration from environment");

    let pipeline = std::sync::Arc::new(
        criteria_workers::Pipeline::connect(&config)
            .await
            .expect("connect scoring pipeline"),
    );

    let handle = tokio::runtime::Handle::current();
    criteria_workers::spawn(pipeline.clone(), handle, config.originality_pool_size());

    let health_client = criteria_database::connect(&config.postgres_url).await;

    criteria_server::run(
        config.port,
        config.api_key.clone(),
        pipeline.ingress.clone(),
        health_client,
    )
    .await
    .expect("run ingestion server");
}
