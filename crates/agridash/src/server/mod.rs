//! HTTP API server.
//!
//! Routes:
//! - `POST /api/data` stores an observation and broadcasts it (201, or 400
//!   for an invalid submission)
//! - `GET /api/data` lists every observation (200, or 500 if the store fails)
//! - `GET /api/events` streams a `newData` Server-Sent Event per new
//!   observation

mod error;

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::sse::{Event, KeepAlive};
use axum::response::Sse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};

pub use error::{ApiError, ApiErrorCode, ErrorBody, ErrorPayload};

use crate::config::{Config, ServerConfig};
use crate::error::Result;
use crate::ingest::Ingestor;
use crate::notify::{Broadcaster, NEW_DATA_EVENT};
use crate::observation::{NewObservation, Observation};
use crate::storage::{SqliteStore, Storage};

/// Path of the observation resource.
pub const DATA_PATH: &str = "/api/data";

/// Path of the event stream.
pub const EVENTS_PATH: &str = "/api/events";

#[derive(Debug, Clone)]
struct AppState {
    ingestor: Ingestor,
    keep_alive: Duration,
}

/// Build the API router over an ingestor.
pub fn router(ingestor: Ingestor, server: &ServerConfig) -> Router {
    let state = AppState {
        ingestor,
        keep_alive: server.keep_alive(),
    };

    Router::new()
        .route(DATA_PATH, get(list_observations).post(create_observation))
        .route(EVENTS_PATH, get(event_stream))
        .layer(cors_layer(&server.allowed_origin))
        .with_state(state)
}

/// Open the configured database and serve the API until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the listen address
/// cannot be bound.
pub async fn serve(config: &Config) -> Result<()> {
    let store = SqliteStore::new(Storage::open(config.database_path())?);
    let stats = store.stats().await?;
    info!(
        path = %config.database_path().display(),
        observations = stats.total_observations,
        size_bytes = stats.db_size_bytes,
        "Database opened"
    );

    let ingestor = Ingestor::new(
        Arc::new(store),
        Broadcaster::new(config.server.broadcast_capacity),
    );

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(
        url = %format!("http://{addr}"),
        allowed_origin = %config.server.allowed_origin,
        "agridash server ready"
    );

    axum::serve(listener, router(ingestor, &config.server))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("agridash server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if allowed_origin == "*" {
        return layer.allow_origin(Any);
    }
    match HeaderValue::from_str(allowed_origin) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            warn!(origin = %allowed_origin, "Ignoring invalid allowed origin");
            layer
        }
    }
}

async fn create_observation(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> std::result::Result<(StatusCode, Json<Observation>), ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        debug!(error = %rejection.body_text(), "Unreadable observation payload");
        ApiError::validation(rejection.body_text())
    })?;

    let new = NewObservation::from_json(&payload)?;
    let stored = state.ingestor.ingest(new).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn list_observations(
    State(state): State<AppState>,
) -> std::result::Result<Json<Vec<Observation>>, ApiError> {
    let observations = state.ingestor.list_all().await?;
    debug!(count = observations.len(), "Listed observations");
    Ok(Json(observations))
}

async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let rx = state.ingestor.broadcaster().subscribe();
    info!(
        subscribers = state.ingestor.broadcaster().subscriber_count(),
        "Event stream client connected"
    );

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(observation) => match Event::default()
            .event(NEW_DATA_EVENT)
            .json_data(&observation)
        {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                warn!(id = observation.id, error = %e, "Failed to encode observation event");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            warn!(skipped, "Event stream client lagged; observations skipped");
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(state.keep_alive))
}
