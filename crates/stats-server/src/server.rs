use crate::aggregator::Aggregator;
use crate::error::ServerError;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Build the HTTP routes around a shared aggregator.
pub fn router(aggregator: Arc<Aggregator>) -> Router {
    Router::new()
        .route("/", get(handle_snapshot))
        .route("/stats", post(handle_ingest))
        .route("/healthz", get(handle_health))
        .with_state(aggregator)
}

/// Bind the listening socket, reporting the address on failure.
pub async fn bind(address: &str) -> Result<TcpListener, ServerError> {
    TcpListener::bind(address)
        .await
        .map_err(|source| ServerError::Bind {
            address: address.to_string(),
            source,
        })
}

/// Serve until `shutdown` fires, then give in-flight requests up to `grace`
/// to finish. New connections are refused as soon as shutdown starts.
pub async fn serve(
    listener: TcpListener,
    aggregator: Arc<Aggregator>,
    shutdown: CancellationToken,
    grace: Duration,
) -> Result<(), ServerError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Stats server listening on {addr}");
    }

    let server = axum::serve(listener, router(aggregator))
        .with_graceful_shutdown(shutdown.clone().cancelled_owned())
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result?,
        _ = async {
            shutdown.cancelled().await;
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!("Grace period of {grace:?} elapsed with requests still in flight");
        }
    }

    tracing::info!("Stats server stopped");
    Ok(())
}

async fn handle_ingest(State(aggregator): State<Arc<Aggregator>>, body: Bytes) -> Response {
    match aggregator.ingest_json(&body).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            tracing::warn!("Rejected stats payload: {e}");
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

async fn handle_snapshot(State(aggregator): State<Arc<Aggregator>>) -> Response {
    Json(aggregator.snapshot().await).into_response()
}

async fn handle_health() -> &'static str {
    "ok"
}
