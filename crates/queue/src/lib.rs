//! A crash-safe FIFO queue, instantiated three times by the binary (ingress,
//! originality, concordance). Entries survive a process restart: a
//! crash between `get` and `task_done` redelivers the entry.
//!
//! Backed by `sled`, an embedded log-structured store — the same family of
//! dependency the wider corpus reaches for when it needs a durable,
//! crash-safe local store rather than an external broker.
mod entry;
mod error;
mod queue;

pub use entry::QueueEntry;
pub use error::QueueError;
pub use queue::Queue;
