use async_trait::async_trait;

use crate::error::Result;

/// A `BatchFunction` defines the method through which some `Loader` fetches batched data from a
/// resource. It receives the unique keys that were requested during the `Loader`'s most recent
/// execution frame, in the order they were first requested, and some user defined context.
///
/// The returned vector is positional: entry `i` holds the value for `keys[i]`, so its length must
/// equal `keys.len()`. A mismatch fails the whole batch with
/// [`Error::BatchLength`](crate::Error::BatchLength). Keys with nothing to load still need an
/// entry (for example an empty `Vec` or a `None`).
///
/// Returning an error fails every request waiting on the batch with a clone of that error.
#[async_trait]
pub trait BatchFunction<K, V> {
    type Context;
    async fn load(keys: &[K], context: &Self::Context) -> Result<Vec<V>>;
}
