use std::sync::Arc;

use anyhow::Context;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use blog_gateway::{Config, Gateway, PgStorage};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

async fn graphql_handler(
    State(gateway): State<Arc<Gateway>>,
    request: GraphQLRequest,
) -> Response {
    match gateway.execute(request.into_inner()).await {
        Ok(response) => GraphQLResponse::from(response).into_response(),
        Err(error) => {
            tracing::error!(%error, "request failed outside GraphQL execution");
            (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()).into_response()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "blog_gateway=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let storage =
        PgStorage::connect(&config.database).await.context("Failed to connect to database")?;
    let gateway = Arc::new(Gateway::new(Arc::new(storage), config.gateway.clone()));

    let app = Router::new().route("/graphql", post(graphql_handler)).with_state(gateway);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server ready");
    axum::serve(listener, app).await?;
    Ok(())
}
