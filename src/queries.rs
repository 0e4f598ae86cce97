use std::sync::Arc;

use crate::columns::Column;
use crate::error::{Error, Result};
use crate::model::{Client, ClientInput, User};
use crate::storage::Transaction;

/// Row limit for `users` when the caller gives none (or a non-positive one).
pub const DEFAULT_USER_LIMIT: i64 = 10;

/// Lists users in ascending id order, fetching only `columns`.
pub async fn list_users(
    tx: &dyn Transaction,
    columns: &[&'static Column],
    first: Option<i32>,
) -> Result<Vec<User>> {
    let limit = first.filter(|first| *first > 0).map_or(DEFAULT_USER_LIMIT, i64::from);
    tracing::debug!(columns = columns.len(), limit, "listing users");
    tx.list_users(columns, limit).await.map_err(|error| Error::Query(Arc::new(error)))
}

/// Inserts a client and echoes the submitted fields back with the generated id.
pub async fn insert_client(tx: &dyn Transaction, input: ClientInput) -> Result<Client> {
    match tx.insert_client(&input).await {
        Ok(id) => {
            tracing::debug!(id, "client created");
            Ok(Client::from_input(id, input))
        }
        Err(error) => {
            tracing::error!(%error, "error creating client");
            Err(Error::Insert(Arc::new(error)))
        }
    }
}
