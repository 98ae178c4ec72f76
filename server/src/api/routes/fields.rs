//! Field map endpoints

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use elastic_builder::{FieldDescriptor, FieldMap};

use crate::api::types::ApiError;

#[derive(Clone)]
pub struct FieldsApiState {
    pub fields: Arc<FieldMap>,
}

pub fn routes(fields: Arc<FieldMap>) -> Router<()> {
    Router::new()
        .route("/", get(list_fields))
        .route("/{name}", get(get_field))
        .with_state(FieldsApiState { fields })
}

/// Configured FieldMap, in display order
#[utoipa::path(
    get,
    path = "/api/v1/fields",
    tag = "fields",
    responses(
        (status = 200, description = "Configured field map")
    )
)]
pub async fn list_fields(State(state): State<FieldsApiState>) -> Json<FieldMap> {
    Json(state.fields.as_ref().clone())
}

/// One field descriptor
#[utoipa::path(
    get,
    path = "/api/v1/fields/{name}",
    tag = "fields",
    params(("name" = String, Path, description = "Field name")),
    responses(
        (status = 200, description = "Field descriptor"),
        (status = 404, description = "Field not configured")
    )
)]
pub async fn get_field(
    State(state): State<FieldsApiState>,
    Path(name): Path<String>,
) -> Result<Json<FieldDescriptor>, ApiError> {
    state
        .fields
        .get(&name)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("FIELD_NOT_FOUND", format!("Unknown field: {}", name)))
}
