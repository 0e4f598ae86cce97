use std::fmt::Debug;
use std::hash::Hash;
use std::ops::Drop;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{span, Level};
use tracing_futures::Instrument;

use crate::{
    batch_function::BatchFunction,
    error::{Error, Result},
    load_request::LoadRequest,
    loader_worker::LoaderWorker,
};

/// Batch loads values from some expensive resource, primarily intended for mitigating GraphQL's
/// N+1 problem.
///
/// Users call [`Loader::load`] and [`Loader::load_many`] to fetch values from the underlying
/// resource. Calls issued together are coalesced into a single invocation of the loader's
/// [`BatchFunction`]. There is no cache: every call takes part in a fresh batch, even for a key
/// that was loaded a moment ago.
///
/// The `Loader` struct acts as an intermediary between the async domain in which `load` calls are
/// invoked and the pseudo-single-threaded domain of the `LoaderWorker`. Callers can invoke the
/// `Loader` from multiple parallel tasks, and the loader will enqueue the requested keys on the
/// request queue for processing by its `LoaderWorker`. The worker processes one batch at a time
/// and provides results via response oneshot channels back to the Loader.
///
/// A `Loader` is meant to be short-lived: the gateway builds a fresh one per request, bound to
/// that request's transaction. Dropping it stops the worker.
pub struct Loader<K, V>
where
    K: 'static + Eq + Debug + Copy + Send,
    V: 'static + Send + Debug + Clone,
{
    request_tx: mpsc::UnboundedSender<LoadRequest<K, V>>,
    load_task_handle: tokio::task::JoinHandle<()>,
}

impl<K, V> Drop for Loader<K, V>
where
    K: 'static + Eq + Debug + Copy + Send,
    V: 'static + Send + Debug + Clone,
{
    fn drop(&mut self) {
        self.load_task_handle.abort();
    }
}

impl<K, V> Loader<K, V>
where
    K: 'static + Eq + Hash + Debug + Copy + Send + Sync,
    V: 'static + Send + Debug + Clone,
{
    /// Creates a new Loader for the provided BatchFunction and Context type. The batch is closed
    /// after a single cooperative yield of the worker task.
    ///
    /// Note: the batch function is passed in as a marker for type inference.
    pub fn new<F, ContextT>(batch_function: F, context: ContextT) -> Self
    where
        ContextT: Send + Sync + 'static,
        F: 'static + BatchFunction<K, V, Context = ContextT> + Send,
    {
        Self::with_batch_window(batch_function, context, Duration::ZERO)
    }

    /// Creates a new Loader whose worker keeps each batch open for `batch_window` after the first
    /// request of the batch arrives.
    pub fn with_batch_window<F, ContextT>(
        _: F,
        context: ContextT,
        batch_window: Duration,
    ) -> Self
    where
        ContextT: Send + Sync + 'static,
        F: 'static + BatchFunction<K, V, Context = ContextT> + Send,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let span = span!(Level::TRACE, "LoaderWorker", kv = std::any::type_name::<F>());
        Self {
            request_tx: tx,
            load_task_handle: tokio::task::spawn(
                LoaderWorker::<K, V, F, ContextT>::new(rx, context, batch_window)
                    .start()
                    .instrument(span),
            ),
        }
    }

    /// Loads a value from the underlying resource.
    ///
    /// The key is enqueued for batch loading in the next loader execution frame. If the batch
    /// fails, the error is returned to this caller and to every other caller in the same batch.
    pub async fn load(&self, key: K) -> Result<V> {
        let (response_tx, response_rx) = oneshot::channel();
        self.request_tx
            .send(LoadRequest::One(key, response_tx))
            .map_err(|_| Error::LoaderClosed)?;
        response_rx.await.map_err(|_| Error::LoaderClosed)?
    }

    /// Loads many values at once, returned in the order of `keys`.
    ///
    /// An empty `keys` resolves to an empty vector without invoking the BatchFunction.
    pub async fn load_many(&self, keys: Vec<K>) -> Result<Vec<V>> {
        let (response_tx, response_rx) = oneshot::channel();
        self.request_tx
            .send(LoadRequest::Many(keys, response_tx))
            .map_err(|_| Error::LoaderClosed)?;
        response_rx.await.map_err(|_| Error::LoaderClosed)?
    }
}
