use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;
use std::time::{Duration, Instant};

use futures::future::FutureExt;
use tokio::sync::mpsc;

use crate::{batch_function::BatchFunction, error::Error, load_request::LoadRequest};

#[cfg(feature = "stats")]
use crate::worker_stats::WorkerStats;

/// A `LoaderWorker` is the "single-thread" worker task that actually does the loading work.
///
/// Once started, it runs in a loop until the parent Loader aborts its `JoinHandle` or drops the
/// request queue tx channel.
///
/// The worker can be in one of three states during its lifetime:
///
/// 1. Waiting for requests
/// 2. Holding the batch open, then flushing the request queue and staging keys for loading.
/// 3. Executing its load batch function.
///
/// One cycle through this loop may be called an "execution frame".
///
/// In state (1), the worker awaits any messages on the request queue channel, idling until work
/// arrives.
///
/// In state (2), the worker waits out its batch window (a single cooperative yield when the window
/// is zero) so that requests issued alongside the first one can reach the queue. It then
/// synchronously pulls requests from the queue until the queue reports that nothing else is
/// pending. Whatever has been staged at that point is the batch; requests arriving later belong
/// to the next frame.
///
/// In state (3), the worker invokes its `BatchFunction` once with the de-duplicated staged keys,
/// in first-requested order, and fans the positional results back out to every staged request.
/// If the `BatchFunction` fails, every staged request receives the same error.
///
/// Nothing is cached between frames: a key requested twice in separate frames is loaded twice.
pub struct LoaderWorker<K, V, F, ContextT>
where
    K: 'static + Eq + Hash + Debug + Copy + Send + Sync,
    V: 'static + Send + Debug + Clone,
    F: 'static + BatchFunction<K, V, Context = ContextT> + Send,
    ContextT: Send + Sync + 'static,
{
    request_rx: mpsc::UnboundedReceiver<LoadRequest<K, V>>,
    keys_to_load: Vec<K>,
    pending_requests: Vec<LoadRequest<K, V>>,
    context: ContextT,
    batch_window: Duration,
    phantom_batch_function: PhantomData<F>,
    #[cfg(feature = "stats")]
    stats: WorkerStats,
}

impl<K, V, F, ContextT> LoaderWorker<K, V, F, ContextT>
where
    K: 'static + Eq + Hash + Debug + Copy + Send + Sync,
    V: 'static + Send + Debug + Clone,
    F: 'static + BatchFunction<K, V, Context = ContextT> + Send,
    ContextT: Send + Sync + 'static,
{
    pub fn new(
        request_rx: mpsc::UnboundedReceiver<LoadRequest<K, V>>,
        context: ContextT,
        batch_window: Duration,
    ) -> Self {
        Self {
            request_rx,
            keys_to_load: Vec::new(),
            pending_requests: Vec::new(),
            context,
            batch_window,
            phantom_batch_function: PhantomData,
            #[cfg(feature = "stats")]
            stats: WorkerStats::new(std::any::type_name::<F>()),
        }
    }

    pub async fn start(mut self) {
        loop {
            // Async await until we receive the first request.
            match self.request_rx.recv().await {
                None => {
                    tracing::debug!("Tx channel closed. Terminating LoaderWorker.");
                    return;
                }
                Some(request) => self.stage(request),
            }
            hold_batch_open(self.batch_window).await;
            // Flush remainder of the request queue before executing load.
            while let Some(Some(request)) = self.request_rx.recv().now_or_never() {
                self.stage(request);
            }
            if !self.pending_requests.is_empty() {
                self.execute_load().await;
            }
        }
    }

    fn stage(&mut self, request: LoadRequest<K, V>) {
        #[cfg(feature = "stats")]
        self.stats.record_load_request(request.keys().len());

        if request.keys().is_empty() {
            request.send_response(std::iter::empty());
            return;
        }
        tracing::trace!(requested_keys = ?request.keys());
        self.keys_to_load.extend_from_slice(request.keys());
        self.pending_requests.push(request);
    }

    async fn execute_load(&mut self) {
        let batch_size = self.keys_to_load.len();
        let mut seen = HashSet::with_capacity(batch_size);
        let unique_keys =
            self.keys_to_load.drain(..).filter(|key| seen.insert(*key)).collect::<Vec<_>>();
        tracing::debug!(
            batch_size,
            unique_keys = unique_keys.len(),
            requests = self.pending_requests.len(),
            "dispatching batch"
        );
        #[cfg(feature = "stats")]
        self.stats.record_load_exec(batch_size, unique_keys.len());

        let started = Instant::now();
        let loaded = F::load(&unique_keys, &self.context).await.and_then(|values| {
            if values.len() == unique_keys.len() {
                Ok(values)
            } else {
                Err(Error::BatchLength { expected: unique_keys.len(), actual: values.len() })
            }
        });
        #[cfg(feature = "stats")]
        self.stats.record_load_exec_completed(started.elapsed(), loaded.is_err());

        match loaded {
            Ok(values) => {
                tracing::debug!(elapsed_ms = started.elapsed().as_millis() as u64, "batch loaded");
                let positions = unique_keys
                    .iter()
                    .enumerate()
                    .map(|(position, key)| (*key, position))
                    .collect::<HashMap<_, _>>();
                for request in self.pending_requests.drain(..) {
                    let response =
                        request.keys().iter().map(|key| &values[positions[key]]).collect::<Vec<_>>();
                    request.send_response(response);
                }
            }
            Err(error) => {
                tracing::warn!(%error, requests = self.pending_requests.len(), "batch load failed");
                for request in self.pending_requests.drain(..) {
                    request.send_error(error.clone());
                }
            }
        }
    }
}

/// Keeps the current batch open: a single cooperative yield when `batch_window` is zero, a sleep
/// otherwise. Takes the window by value so no borrow of the worker lives across the await.
async fn hold_batch_open(batch_window: Duration) {
    if batch_window.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(batch_window).await;
    }
}
