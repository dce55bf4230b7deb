use crate::concordance;
use crate::ingress;
use crate::originality;
use crate::Pipeline;
use std::sync::Arc;
use std::thread::JoinHandle;

/// Spawns the scoring pipeline's worker threads: one ingress consumer, one
/// concordance worker, and `originality_pool_size` originality workers
/// (`NUM_THREADS - 3`, reserving a thread each for the HTTP server, the
/// ingress consumer, and the concordance worker).
///
/// Each thread bridges its blocking queue loop to the shared `tokio`
/// runtime via `Handle::block_on` for the async Gateway/BlobCache calls,
/// rather than spawning onto the runtime's own worker pool — this keeps
/// CPU-heavy k-means fitting and KS evaluation off
/// the runtime that also serves HTTP.
pub fn spawn(
    pipeline: Arc<Pipeline>,
    runtime: tokio::runtime::Handle,
    originality_pool_size: usize,
) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::with_capacity(originality_pool_size + 2);

    {
        let pipeline = pipeline.clone();
        let runtime = runtime.clone();
        handles.push(
            std::thread::Builder::new()
                .name("ingress".into())
                .spawn(move || ingress::run(pipeline, runtime))
                .expect("spawn ingress consumer thread"),
        );
    }
    {
        let pipeline = pipeline.clone();
        let runtime = runtime.clone();
        handles.push(
            std::thread::Builder::new()
                .name("concordance".into())
                .spawn(move || concordance::run(pipeline, runtime))
                .expect("spawn concordance worker thread"),
        );
    }
    for i in 0..originality_pool_size {
        let pipeline = pipeline.clone();
        let runtime = runtime.clone();
        handles.push(
            std::thread::Builder::new()
                .name(format!("originality-{}", i))
                .spawn(move || originality::run(pipeline, runtime))
                .expect("spawn originality worker thread"),
        );
    }

    handles
}
