use crate::gateway::QueryGateway;
use crate::protocol::{GatewayResult, QueryRequest};
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, info};

pub struct ServerConfig {
    pub listen: String,
}

type ServerResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

pub async fn run(config: ServerConfig, gateway: Arc<QueryGateway>) -> ServerResult<()> {
    let app = build_app(gateway);

    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    info!(listen = %listener.local_addr()?, "railmadad gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("railmadad gateway stopped");
    Ok(())
}

pub fn build_app(gateway: Arc<QueryGateway>) -> Router {
    Router::new()
        .route("/query", post(query))
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(gateway)
}

// Both outcomes are a 200: the body is the result the panel renders.
// Bodies that cannot be read keep the extractor's status but still answer
// in the `{"error"}` shape.
async fn query(
    State(gateway): State<Arc<QueryGateway>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> (StatusCode, Json<GatewayResult>) {
    match payload {
        Ok(Json(request)) => (StatusCode::OK, Json(gateway.handle(&request.query).await)),
        Err(rejection) => {
            debug!(status = %rejection.status(), error = %rejection, "rejected query body");
            (
                rejection.status(),
                Json(GatewayResult::error(rejection.body_text())),
            )
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(GatewayResult::error("Not found")))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
