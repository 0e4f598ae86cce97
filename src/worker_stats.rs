use std::time::Duration;

#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Human readable name used to identify this worker stats when it is reported.
    tag: &'static str,
    /// Number of `LoadRequest`s that were received by the worker.
    load_requests: u32,
    /// The total number of keys that were requested for loading (not necessarily unique).
    items_requested: u32,
    /// Number of times that this worker executed the `LoaderWorker::execute_load` function.
    loads: u32,
    /// Number of batches whose `BatchFunction` failed.
    failed_loads: u32,
    /// The average number of keys (not-unique) that were fetched during load operations.
    average_batch_size: f32,
    /// The max number of keys (not-unique) that were fetched during a single load.
    max_batch_size: u32,
    /// The min number of keys (not-unique) that were fetched during a single load.
    min_batch_size: u32,

    /// The max number of unique keys fetched during a single load.
    max_batch_unique: u32,
    /// The min number of unique keys fetched during a single load.
    min_batch_unique: u32,
    /// Wall time spent inside the `BatchFunction`.
    load_time: Duration,
}

impl WorkerStats {
    pub fn new(tag: &'static str) -> Self {
        Self { tag, min_batch_size: u32::MAX, min_batch_unique: u32::MAX, ..Default::default() }
    }

    pub fn record_load_request(&mut self, items_requested: usize) {
        self.load_requests += 1;
        self.items_requested += items_requested as u32;
    }

    pub fn record_load_exec(&mut self, batch_size: usize, unique_batch_size: usize) {
        let (batch_size, unique_batch_size) = (batch_size as u32, unique_batch_size as u32);
        let new_total_load = self.loads + 1;
        self.average_batch_size = (((self.average_batch_size as f64 * self.loads as f64)
            + batch_size as f64)
            / new_total_load as f64) as f32;
        self.loads = new_total_load;
        self.max_batch_size = self.max_batch_size.max(batch_size);
        self.min_batch_size = self.min_batch_size.min(batch_size);
        self.max_batch_unique = self.max_batch_unique.max(unique_batch_size);
        self.min_batch_unique = self.min_batch_unique.min(unique_batch_size);
    }

    pub fn record_load_exec_completed(&mut self, elapsed: Duration, failed: bool) {
        self.load_time += elapsed;
        if failed {
            self.failed_loads += 1;
        }
    }
}

impl Drop for WorkerStats {
    fn drop(&mut self) {
        tracing::debug!(tag = self.tag, worker_stats = ?self);
    }
}
