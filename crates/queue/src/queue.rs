use crate::QueueEntry;
use crate::QueueError;
use std::path::Path;
use std::sync::Condvar;
use std::sync::Mutex;
use std::time::Duration;

const LEASE_MARKER: &[u8] = b"1";

/// A single crash-safe FIFO, backed by two `sled` trees: `entries` holds
/// every enqueued-but-not-yet-acknowledged item keyed by a monotonically
/// increasing offset, `leased` marks which offsets are currently being
/// processed by a worker.
///
/// On open, `leased` is cleared: whichever worker held a lease before a
/// crash is gone, so every previously-leased entry becomes available again.
/// This is the redelivery half of at-least-once.
pub struct Queue {
    db: sled::Db,
    entries: sled::Tree,
    leased: sled::Tree,
    lock: Mutex<()>,
    cond: Condvar,
}

impl Queue {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, QueueError> {
        let db = sled::open(path)?;
        let entries = db.open_tree("entries")?;
        let leased = db.open_tree("leased")?;
        leased.clear()?;
        leased.flush()?;
        Ok(Self {
            db,
            entries,
            leased,
            lock: Mutex::new(()),
            cond: Condvar::new(),
        })
    }

    /// Appends an entry and wakes any thread blocked in `get`/`get_timeout`.
    pub fn put(&self, entry: &QueueEntry) -> Result<(), QueueError> {
        let offset = self.db.generate_id()?;
        let bytes = bincode::serialize(entry)?;
        self.entries.insert(offset.to_be_bytes(), bytes)?;
        self.entries.flush()?;
        let guard = self.lock.lock().expect("queue mutex poisoned");
        self.cond.notify_all();
        drop(guard);
        Ok(())
    }

    /// Number of entries enqueued but not yet acknowledged, including ones
    /// currently leased to a worker. Used by the queue-durability property:
    /// enqueue N, crash, restart, `qsize() == N`.
    pub fn qsize(&self) -> usize {
        self.entries.len()
    }

    /// Blocks until an entry is available, then leases and returns it with
    /// its offset. Call `task_done` with that offset once processing
    /// completes.
    pub fn get(&self) -> (u64, QueueEntry) {
        loop {
            if let Some(leased) = self.try_lease() {
                return leased;
            }
            let guard = self.lock.lock().expect("queue mutex poisoned");
            let _ = self.cond.wait_timeout(guard, Duration::from_millis(200));
        }
    }

    /// Like `get`, but gives up after `timeout` so a worker loop can check
    /// for a cooperative shutdown request between polls instead of blocking
    /// forever.
    pub fn get_timeout(&self, timeout: Duration) -> Option<(u64, QueueEntry)> {
        if let Some(leased) = self.try_lease() {
            return Some(leased);
        }
        let guard = self.lock.lock().expect("queue mutex poisoned");
        let _ = self.cond.wait_timeout(guard, timeout);
        drop(guard);
        self.try_lease()
    }

    /// Acknowledges an offset, permanently removing it. Acking twice is a
    /// silent no-op the second time would report as `NotLeased`; callers
    /// are expected to ack exactly once per successful `get`.
    pub fn task_done(&self, offset: u64) -> Result<(), QueueError> {
        let key = offset.to_be_bytes();
        if self.leased.remove(key)?.is_none() {
            return Err(QueueError::NotLeased);
        }
        self.entries.remove(key)?;
        self.entries.flush()?;
        Ok(())
    }

    /// Scans for the oldest unleased entry and atomically claims it via
    /// `compare_and_swap`, so multiple pool threads racing on the same
    /// queue (the originality pool) never double-lease one offset.
    fn try_lease(&self) -> Option<(u64, QueueEntry)> {
        for item in self.entries.iter() {
            let (key, value) = match item {
                Ok(kv) => kv,
                Err(e) => {
                    log::error!("queue scan error: {}", e);
                    continue;
                }
            };
            let claimed = self
                .leased
                .compare_and_swap(&key, None::<&[u8]>, Some(LEASE_MARKER))
                .ok()
                .map(|r| r.is_ok())
                .unwrap_or(false);
            if !claimed {
                continue;
            }
            let offset = u64::from_be_bytes(key.as_ref().try_into().expect("8-byte offset key"));
            match bincode::deserialize(&value) {
                Ok(entry) => return Some((offset, entry)),
                Err(e) => {
                    log::error!("corrupt queue entry at offset {}: {}", offset, e);
                    continue;
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use criteria_core::ID;

    fn open_tmp() -> (tempfile::TempDir, Queue) {
        let dir = tempfile::tempdir().unwrap();
        let queue = Queue::open(dir.path()).unwrap();
        (dir, queue)
    }

    #[test]
    fn put_then_get_round_trips() {
        let (_dir, queue) = open_tmp();
        let entry = QueueEntry::new(ID::default());
        queue.put(&entry).unwrap();
        let (offset, got) = queue.get();
        assert_eq!(got.submission_id, entry.submission_id);
        queue.task_done(offset).unwrap();
        assert_eq!(queue.qsize(), 0);
    }

    #[test]
    fn fifo_order_is_preserved() {
        let (_dir, queue) = open_tmp();
        let entries: Vec<_> = (0..5).map(|_| QueueEntry::new(ID::default())).collect();
        for e in &entries {
            queue.put(e).unwrap();
        }
        for expected in &entries {
            let (offset, got) = queue.get();
            assert_eq!(got.submission_id, expected.submission_id);
            queue.task_done(offset).unwrap();
        }
    }

    #[test]
    fn durability_across_restart() {
        let dir = tempfile::tempdir().unwrap();
        let entries: Vec<_> = (0..3).map(|_| QueueEntry::new(ID::default())).collect();
        {
            let queue = Queue::open(dir.path()).unwrap();
            for e in &entries {
                queue.put(e).unwrap();
            }
            assert_eq!(queue.qsize(), 3);
            // simulate crash: no `get`/`task_done` before the queue is dropped
        }
        let queue = Queue::open(dir.path()).unwrap();
        assert_eq!(queue.qsize(), 3);
        for expected in &entries {
            let (offset, got) = queue.get();
            assert_eq!(got.submission_id, expected.submission_id);
            queue.task_done(offset).unwrap();
        }
    }

    #[test]
    fn crash_between_get_and_task_done_redelivers() {
        let dir = tempfile::tempdir().unwrap();
        let entry = QueueEntry::new(ID::default());
        {
            let queue = Queue::open(dir.path()).unwrap();
            queue.put(&entry).unwrap();
            let (_offset, _got) = queue.get();
            // crash: process exits without acknowledging
        }
        let queue = Queue::open(dir.path()).unwrap();
        assert_eq!(queue.qsize(), 1);
        let (offset, got) = queue.get();
        assert_eq!(got.submission_id, entry.submission_id);
        queue.task_done(offset).unwrap();
    }
}
