//! Scoring Pipeline: the ingress consumer, concordance worker, and
//! originality worker pool.
//!
//! [`Pipeline`] is the application object every worker thread shares — the
//! Metadata Gateway, Blob Cache, Round Feature Engine, and the three
//! durable queues. [`pool::spawn`] starts one ingress thread, one
//! concordance thread, and `NUM_THREADS - 3` originality threads, all
//! draining their queue against the same `Pipeline`.
mod concordance;
mod consistency;
mod ingress;
mod originality;
mod pipeline;
mod pool;

pub use pipeline::Pipeline;
pub use pool::spawn;
