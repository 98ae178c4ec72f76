//! Health check endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use elastic_builder::FieldMap;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct HealthApiState {
    pub fields: Arc<FieldMap>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Number of configured fields
    pub fields: usize,
}

pub fn routes(fields: Arc<FieldMap>) -> Router<()> {
    Router::new()
        .route("/", get(health))
        .with_state(HealthApiState { fields })
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<HealthApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        fields: state.fields.len(),
    })
}
