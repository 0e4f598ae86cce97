use std::sync::Arc;

use async_trait::async_trait;

use crate::columns::Column;
use crate::error::StorageError;
use crate::model::{ClientInput, Comment, Post, User};

/// Shared handle to the transaction serving one request.
pub type TxHandle = Arc<dyn Transaction>;

/// The process-wide storage engine. Its only job here is leasing out transactions.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn begin(&self) -> Result<TxHandle, StorageError>;
}

/// One request's transaction.
///
/// Every query the request issues runs through this handle. `commit` and `rollback` end it; any
/// call after that fails with [`StorageError::TransactionFinished`].
#[async_trait]
pub trait Transaction: Send + Sync {
    /// Posts whose `user_id` is in `user_ids`, in the engine's natural order.
    async fn posts_by_user_ids(&self, user_ids: &[i32]) -> Result<Vec<Post>, StorageError>;

    /// Comments whose `post_id` is in `post_ids`, in the engine's natural order.
    async fn comments_by_post_ids(&self, post_ids: &[i32]) -> Result<Vec<Comment>, StorageError>;

    /// Up to `limit` users ordered by ascending id, fetching only `columns`.
    async fn list_users(
        &self,
        columns: &[&'static Column],
        limit: i64,
    ) -> Result<Vec<User>, StorageError>;

    /// Inserts one client row and returns its generated id.
    async fn insert_client(&self, client: &ClientInput) -> Result<i32, StorageError>;

    async fn commit(&self) -> Result<(), StorageError>;

    async fn rollback(&self) -> Result<(), StorageError>;
}
