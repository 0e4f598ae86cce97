//! Postgres-backed [`Storage`] using sqlx.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Postgres;
use tokio::sync::Mutex;

use crate::columns::Column;
use crate::config::DatabaseConfig;
use crate::error::StorageError;
use crate::model::{ClientInput, Comment, Post, User};
use crate::storage::{Storage, Transaction, TxHandle};

const POSTS_BY_USER_IDS: &str = "SELECT post_id, user_id, title, description, \
     created_at::text AS created_at, updated_at::text AS updated_at \
     FROM posts WHERE user_id = ANY($1)";

const COMMENTS_BY_POST_IDS: &str = "SELECT comment_id, description, post_id, user_id, \
     created_at::text AS created_at, updated_at::text AS updated_at \
     FROM comments WHERE post_id = ANY($1)";

const INSERT_CLIENT: &str = "INSERT INTO clients \
     (name, email, last_name, birthday, address, created_at) \
     VALUES ($1, $2, $3, $4::date, $5, $6::timestamp) RETURNING id";

pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn begin(&self) -> Result<TxHandle, StorageError> {
        let tx = self.pool.begin().await?;
        Ok(Arc::new(PgTransaction { inner: Mutex::new(Some(tx)) }))
    }
}

/// One sqlx transaction. Statements on it are serialized, since they share one connection.
///
/// If it is dropped while still open, sqlx rolls it back.
pub struct PgTransaction {
    inner: Mutex<Option<sqlx::Transaction<'static, Postgres>>>,
}

impl PgTransaction {
    async fn take(&self) -> Result<sqlx::Transaction<'static, Postgres>, StorageError> {
        self.inner.lock().await.take().ok_or(StorageError::TransactionFinished)
    }
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn posts_by_user_ids(&self, user_ids: &[i32]) -> Result<Vec<Post>, StorageError> {
        let mut guard = self.inner.lock().await;
        let tx = guard.as_mut().ok_or(StorageError::TransactionFinished)?;
        Ok(sqlx::query_as::<_, Post>(POSTS_BY_USER_IDS).bind(user_ids).fetch_all(&mut **tx).await?)
    }

    async fn comments_by_post_ids(&self, post_ids: &[i32]) -> Result<Vec<Comment>, StorageError> {
        let mut guard = self.inner.lock().await;
        let tx = guard.as_mut().ok_or(StorageError::TransactionFinished)?;
        Ok(sqlx::query_as::<_, Comment>(COMMENTS_BY_POST_IDS)
            .bind(post_ids)
            .fetch_all(&mut **tx)
            .await?)
    }

    async fn list_users(
        &self,
        columns: &[&'static Column],
        limit: i64,
    ) -> Result<Vec<User>, StorageError> {
        let select = columns.iter().map(|column| column.expr).collect::<Vec<_>>().join(", ");
        let sql = format!("SELECT {} FROM users ORDER BY id ASC LIMIT $1", select);
        let mut guard = self.inner.lock().await;
        let tx = guard.as_mut().ok_or(StorageError::TransactionFinished)?;
        Ok(sqlx::query_as::<_, User>(&sql).bind(limit).fetch_all(&mut **tx).await?)
    }

    async fn insert_client(&self, client: &ClientInput) -> Result<i32, StorageError> {
        let mut guard = self.inner.lock().await;
        let tx = guard.as_mut().ok_or(StorageError::TransactionFinished)?;
        let id = sqlx::query_scalar::<_, i32>(INSERT_CLIENT)
            .bind(&client.name)
            .bind(&client.email)
            .bind(&client.last_name)
            .bind(&client.birthday)
            .bind(&client.address)
            .bind(&client.created_at)
            .fetch_one(&mut **tx)
            .await?;
        Ok(id)
    }

    async fn commit(&self) -> Result<(), StorageError> {
        Ok(self.take().await?.commit().await?)
    }

    async fn rollback(&self) -> Result<(), StorageError> {
        Ok(self.take().await?.rollback().await?)
    }
}
