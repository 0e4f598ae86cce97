//! Batch functions for the parent -> children relations of the blog schema.
//!
//! Each batch is split into chunks that stay under the storage engine's parameter limits. The
//! chunks are queried concurrently, and the rows are grouped back under their parent key.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::future;

use crate::batch_function::BatchFunction;
use crate::error::{Error, Result, StorageError};
use crate::model::{Comment, Post};
use crate::storage::TxHandle;

pub const POST_CHUNK_SIZE: usize = 50_000;
pub const COMMENT_CHUNK_SIZE: usize = 60_000;

/// Context handed to a relation batch function: the request's transaction and how many parent
/// keys go into one query.
pub struct RelationContext {
    tx: TxHandle,
    chunk_size: usize,
}

impl RelationContext {
    pub fn new(tx: TxHandle, chunk_size: usize) -> Self {
        Self { tx, chunk_size: chunk_size.max(1) }
    }
}

/// Loads the posts of each user id.
pub struct PostsByUser;

#[async_trait]
impl BatchFunction<i32, Vec<Post>> for PostsByUser {
    type Context = RelationContext;

    async fn load(user_ids: &[i32], context: &RelationContext) -> Result<Vec<Vec<Post>>> {
        load_children(
            "posts",
            user_ids,
            context.chunk_size,
            |chunk| context.tx.posts_by_user_ids(chunk),
            |post: &Post| post.user_id,
        )
        .await
    }
}

/// Loads the comments of each post id.
pub struct CommentsByPost;

#[async_trait]
impl BatchFunction<i32, Vec<Comment>> for CommentsByPost {
    type Context = RelationContext;

    async fn load(post_ids: &[i32], context: &RelationContext) -> Result<Vec<Vec<Comment>>> {
        load_children(
            "comments",
            post_ids,
            context.chunk_size,
            |chunk| context.tx.comments_by_post_ids(chunk),
            |comment: &Comment| comment.post_id,
        )
        .await
    }
}

async fn load_children<'a, T, F, Fut>(
    relation: &'static str,
    keys: &'a [i32],
    chunk_size: usize,
    fetch: F,
    parent_key: fn(&T) -> Option<i32>,
) -> Result<Vec<Vec<T>>>
where
    T: Clone,
    F: Fn(&'a [i32]) -> Fut,
    Fut: Future<Output = Result<Vec<T>, StorageError>>,
{
    if keys.is_empty() {
        return Ok(Vec::new());
    }
    // Every key gets an entry up front so parents without children resolve to an empty list.
    let mut children: HashMap<i32, Vec<T>> = keys.iter().map(|key| (*key, Vec::new())).collect();

    let queries = keys.chunks(chunk_size).map(&fetch).collect::<Vec<_>>();
    tracing::debug!(relation, keys = keys.len(), chunks = queries.len(), "dispatching bulk fetch");
    let started = Instant::now();

    let rows = future::try_join_all(queries).await.map_err(|error| {
        tracing::error!(relation, %error, "bulk fetch failed");
        Error::BulkFetch { relation, source: Arc::new(error) }
    })?;

    let mut row_count = 0usize;
    for row in rows.into_iter().flatten() {
        row_count += 1;
        match parent_key(&row).and_then(|key| children.get_mut(&key)) {
            Some(group) => group.push(row),
            None => tracing::trace!(relation, "skipping row outside the batch"),
        }
    }
    tracing::debug!(
        relation,
        rows = row_count,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "bulk fetch complete"
    );

    Ok(keys.iter().map(|key| children.get(key).cloned().unwrap_or_default()).collect())
}
