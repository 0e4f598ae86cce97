use std::sync::Arc;

use async_graphql::{Request, Response};

use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::schema::{build_schema, BlogSchema};
use crate::scope::{Outcome, TransactionScope};
use crate::storage::Storage;

/// Serves GraphQL requests, each inside its own transaction.
///
/// Per request: open a transaction, build fresh loaders bound to it, execute, then commit if the
/// response is error-free and roll back otherwise. Failures of the transaction itself (open,
/// commit, rollback) and timeouts are returned as `Err` rather than folded into the response.
pub struct Gateway {
    schema: BlogSchema,
    storage: Arc<dyn Storage>,
    config: GatewayConfig,
}

impl Gateway {
    pub fn new(storage: Arc<dyn Storage>, config: GatewayConfig) -> Self {
        Self { schema: build_schema(), storage, config }
    }

    pub fn schema(&self) -> &BlogSchema {
        &self.schema
    }

    pub async fn execute(&self, request: impl Into<Request>) -> Result<Response> {
        let (scope, context) = TransactionScope::begin(self.storage.as_ref(), &self.config).await?;
        let request = request.into().data(context);

        match tokio::time::timeout(self.config.request_timeout, self.schema.execute(request)).await
        {
            Ok(response) => {
                scope.finish(&response).await?;
                Ok(response)
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.config.request_timeout, "request timed out");
                scope.complete(Outcome::Rollback).await?;
                Err(Error::Timeout(self.config.request_timeout))
            }
        }
    }
}
