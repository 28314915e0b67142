//! HTTP transport for registration and validation.
//!
//! | Method | Route | Body | Success |
//! |--------|-------|------|---------|
//! | `PUT` | `/v1/model` | registration payload | `200 null` |
//! | `POST` | `/v1/validate` | validate request | `200` report, or `null` when no schema is registered |
//!
//! Malformed payloads and failed registrations are `400` with a JSON error
//! body. Mismatches in a report are data, never a transport error.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{post, put};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tower_http::trace::TraceLayer;

use crate::engine::ValidationEngine;
use crate::error::LoadError;
use crate::loader::{registrations_from_value, request_from_value};
use crate::registry::{MemoryStore, SchemaRegistry, SchemaStore};
use crate::types::ValidateOptions;
use crate::validators::ValidatorTable;

pub const MODEL_ROUTE: &str = "/v1/model";
pub const VALIDATE_ROUTE: &str = "/v1/validate";

/// Shared state handed to every handler.
#[derive(Debug)]
pub struct AppState<S = MemoryStore> {
    pub registry: Arc<SchemaRegistry<S>>,
    pub engine: Arc<ValidationEngine<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            engine: Arc::clone(&self.engine),
        }
    }
}

impl AppState<MemoryStore> {
    /// State over a fresh in-memory registry.
    pub fn in_memory(options: ValidateOptions) -> Self {
        Self::with_registry(Arc::new(SchemaRegistry::in_memory()), options)
    }
}

impl<S: SchemaStore> AppState<S> {
    /// State over an existing registry, using the built-in validator table.
    pub fn with_registry(registry: Arc<SchemaRegistry<S>>, options: ValidateOptions) -> Self {
        let engine = ValidationEngine::with_table(
            Arc::clone(&registry),
            ValidatorTable::builtin(),
            options,
        );
        Self {
            registry,
            engine: Arc::new(engine),
        }
    }
}

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: &'static str,
    pub message: String,
}

/// Errors returned by the HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed payload or failed registration (400).
    #[error("{0}")]
    BadRequest(String),

    /// Internal failure (500). The message is logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl From<LoadError> for AppError {
    fn from(err: LoadError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => {
                tracing::error!(error = %self, "internal server error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

fn parse_body(body: &Bytes) -> Result<Value, AppError> {
    serde_json::from_slice(body)
        .map_err(|source| LoadError::InvalidJson { source })
        .map_err(AppError::from)
}

async fn register_models<S: SchemaStore + 'static>(
    State(state): State<AppState<S>>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let definitions = registrations_from_value(parse_body(&body)?)?;
    let count = state
        .registry
        .register_all(definitions)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    tracing::info!(count, "registered schemas");
    Ok(Json(Value::Null))
}

async fn validate_request<S: SchemaStore + 'static>(
    State(state): State<AppState<S>>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let request = request_from_value(parse_body(&body)?)?;
    let outcome = state.engine.validate(&request);
    let body = serde_json::to_value(&outcome)
        .map_err(|e| AppError::Internal(format!("failed to construct report: {}", e)))?;
    Ok(Json(body))
}

/// Build the router over `state`.
pub fn router<S: SchemaStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route(MODEL_ROUTE, put(register_models::<S>))
        .route(VALIDATE_ROUTE, post(validate_request::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `state` on `addr` until Ctrl-C.
pub async fn serve<S: SchemaStore + 'static>(
    addr: SocketAddr,
    state: AppState<S>,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("api-validator listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
    tracing::info!("shutting down");
}
