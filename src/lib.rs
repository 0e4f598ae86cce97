mod batch_function;
mod columns;
mod config;
mod error;
mod gateway;
mod load_request;
mod loader;
mod loader_worker;
mod model;
mod postgres;
mod queries;
mod relations;
mod schema;
mod scope;
mod storage;
#[cfg(feature = "stats")]
mod worker_stats;

pub use batch_function::BatchFunction;
pub use columns::{select_user_columns, Column, USER_COLUMNS, USER_PRIMARY_KEY};
pub use config::{Config, DatabaseConfig, GatewayConfig};
pub use error::{Error, Result, StorageError};
pub use gateway::Gateway;
pub use loader::Loader;
pub use model::{Client, ClientInput, Comment, Post, User};
pub use postgres::{PgStorage, PgTransaction};
pub use queries::{insert_client, list_users, DEFAULT_USER_LIMIT};
pub use relations::{
    CommentsByPost, PostsByUser, RelationContext, COMMENT_CHUNK_SIZE, POST_CHUNK_SIZE,
};
pub use schema::{build_schema, BlogSchema, Mutation, Query};
pub use scope::{Outcome, RequestContext, TransactionScope};
pub use storage::{Storage, Transaction, TxHandle};
