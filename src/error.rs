use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::scope::Outcome;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure reported by a [`Storage`](crate::Storage) or [`Transaction`](crate::Transaction)
/// implementation.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("transaction has already been committed or rolled back")]
    TransactionFinished,

    /// Failures from non-sqlx backends, carried as their message.
    #[error("{0}")]
    Backend(String),
}

/// Errors surfaced by the gateway core.
///
/// Storage failures are held behind an `Arc` so a single failed batch can be handed to every
/// caller that was waiting on it.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("failed to load {relation}: {source}")]
    BulkFetch { relation: &'static str, source: Arc<StorageError> },

    #[error("failed to open transaction: {0}")]
    Begin(#[source] Arc<StorageError>),

    #[error("transaction {outcome} failed: {source}")]
    TransactionState { outcome: Outcome, source: Arc<StorageError> },

    #[error("{0}")]
    Insert(#[source] Arc<StorageError>),

    #[error("query failed: {0}")]
    Query(#[source] Arc<StorageError>),

    #[error("batch function returned {actual} values for {expected} keys")]
    BatchLength { expected: usize, actual: usize },

    #[error("loader worker is no longer running")]
    LoaderClosed,

    #[error("request did not complete within {0:?}")]
    Timeout(Duration),
}
