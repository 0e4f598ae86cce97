use std::slice;

use tokio::sync::oneshot;

use crate::error::{Error, Result};

/// A pending request sent from a [`Loader`](crate::Loader) to its `LoaderWorker`.
#[derive(Debug)]
pub enum LoadRequest<K, V> {
    One(K, oneshot::Sender<Result<V>>),
    Many(Vec<K>, oneshot::Sender<Result<Vec<V>>>),
}

impl<K, V> LoadRequest<K, V>
where
    V: Send + Clone + std::fmt::Debug,
{
    pub fn keys(&self) -> &[K] {
        match self {
            LoadRequest::One(ref key, _) => slice::from_ref(key),
            LoadRequest::Many(ref keys, _) => keys,
        }
    }

    /// Resolves the request with one value per key, in key order.
    pub fn send_response<'a, I>(self, values: I)
    where
        I: IntoIterator<Item = &'a V>,
        V: 'a,
    {
        match self {
            LoadRequest::One(_, response_tx) => {
                let response = values
                    .into_iter()
                    .next()
                    .cloned()
                    .ok_or(Error::BatchLength { expected: 1, actual: 0 });
                if response_tx.send(response).is_err() {
                    tracing::debug!("receiver dropped");
                }
            }
            LoadRequest::Many(_, response_tx) => {
                let response = values.into_iter().cloned().collect::<Vec<_>>();
                if response_tx.send(Ok(response)).is_err() {
                    tracing::debug!("receiver dropped");
                }
            }
        }
    }

    pub fn send_error(self, error: Error) {
        let delivered = match self {
            LoadRequest::One(_, response_tx) => response_tx.send(Err(error)).is_ok(),
            LoadRequest::Many(_, response_tx) => response_tx.send(Err(error)).is_ok(),
        };
        if !delivered {
            tracing::debug!("receiver dropped");
        }
    }
}
