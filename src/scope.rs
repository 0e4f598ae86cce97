use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_graphql::Response;

use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::loader::Loader;
use crate::model::{Comment, Post};
use crate::relations::{CommentsByPost, PostsByUser, RelationContext};
use crate::storage::{Storage, Transaction, TxHandle};

/// How a request's transaction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Commit,
    Rollback,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Commit => f.write_str("commit"),
            Outcome::Rollback => f.write_str("rollback"),
        }
    }
}

/// Per-request state handed to resolvers through the GraphQL request data.
///
/// Holds the request's transaction and a fresh pair of relation loaders bound to it. Nothing in
/// here outlives the request.
pub struct RequestContext {
    tx: TxHandle,
    posts: Loader<i32, Vec<Post>>,
    comments: Loader<i32, Vec<Comment>>,
}

impl RequestContext {
    pub fn tx(&self) -> &dyn Transaction {
        self.tx.as_ref()
    }

    pub async fn load_child_posts(&self, user_id: i32) -> Result<Vec<Post>> {
        self.posts.load(user_id).await
    }

    pub async fn load_child_comments(&self, post_id: i32) -> Result<Vec<Comment>> {
        self.comments.load(post_id).await
    }
}

/// Owns the single commit-or-rollback decision for one request's transaction.
///
/// [`TransactionScope::finish`] and [`TransactionScope::complete`] take the scope by value, so a
/// transaction can only be ended once.
pub struct TransactionScope {
    tx: TxHandle,
    started: Instant,
    finished: bool,
}

impl TransactionScope {
    /// Opens a transaction and builds the request context that shares it.
    pub async fn begin(
        storage: &dyn Storage,
        config: &GatewayConfig,
    ) -> Result<(Self, RequestContext)> {
        let tx = storage.begin().await.map_err(|error| {
            tracing::error!(%error, "failed to open transaction");
            Error::Begin(Arc::new(error))
        })?;
        tracing::debug!("transaction opened");

        let context = RequestContext {
            posts: Loader::with_batch_window(
                PostsByUser,
                RelationContext::new(tx.clone(), config.post_chunk_size),
                config.batch_window,
            ),
            comments: Loader::with_batch_window(
                CommentsByPost,
                RelationContext::new(tx.clone(), config.comment_chunk_size),
                config.batch_window,
            ),
            tx: tx.clone(),
        };
        Ok((Self { tx, started: Instant::now(), finished: false }, context))
    }

    /// Rolls back if the response carries any error, commits otherwise.
    pub async fn finish(self, response: &Response) -> Result<Outcome> {
        let outcome = if response.is_err() { Outcome::Rollback } else { Outcome::Commit };
        self.complete(outcome).await
    }

    pub async fn complete(mut self, outcome: Outcome) -> Result<Outcome> {
        self.finished = true;
        let ended = match outcome {
            Outcome::Commit => self.tx.commit().await,
            Outcome::Rollback => self.tx.rollback().await,
        };
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        match ended {
            Ok(()) => {
                tracing::info!(%outcome, elapsed_ms, "transaction finished");
                Ok(outcome)
            }
            Err(error) => {
                tracing::error!(%outcome, elapsed_ms, %error, "transaction failed to finish");
                Err(Error::TransactionState { outcome, source: Arc::new(error) })
            }
        }
    }
}

impl Drop for TransactionScope {
    fn drop(&mut self) {
        if !self.finished {
            tracing::error!("transaction scope dropped without commit or rollback");
        }
    }
}
