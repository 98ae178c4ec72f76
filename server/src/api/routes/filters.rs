//! Decode and encode endpoints
//!
//! Both take an optional per-request FieldMap that replaces the configured
//! one for that request only.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use elastic_builder::{FieldMap, FilterNode, Query};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::types::ApiError;
use crate::core::constants::{MAX_FILTER_NODES, MAX_QUERY_CLAUSES};

#[derive(Clone)]
pub struct FiltersApiState {
    pub fields: Arc<FieldMap>,
    /// Log every converted document
    pub debug: bool,
}

impl FiltersApiState {
    fn fields_for<'a>(&'a self, requested: Option<&'a FieldMap>) -> &'a FieldMap {
        requested.unwrap_or(self.fields.as_ref())
    }
}

pub fn routes(fields: Arc<FieldMap>, debug: bool) -> Router<()> {
    Router::new()
        .route("/decode", post(decode_query))
        .route("/encode", post(encode_filters))
        .with_state(FiltersApiState { fields, debug })
}

// ============================================================================
// Request/response types
// ============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DecodeRequest {
    /// Top-level query clauses, implicitly AND-ed
    #[validate(length(max = MAX_QUERY_CLAUSES))]
    #[schema(value_type = Vec<Object>)]
    pub query: Vec<Query>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub fields: Option<FieldMap>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DecodeResponse {
    #[schema(value_type = Vec<Object>)]
    pub filters: Vec<FilterNode>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EncodeRequest {
    /// Top-level filter nodes, implicitly AND-ed
    #[validate(length(max = MAX_FILTER_NODES))]
    #[schema(value_type = Vec<Object>)]
    pub filters: Vec<FilterNode>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub fields: Option<FieldMap>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EncodeResponse {
    #[schema(value_type = Vec<Object>)]
    pub query: Vec<Query>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Rebuild a filter tree from a query
#[utoipa::path(
    post,
    path = "/api/v1/filters/decode",
    tag = "filters",
    request_body = DecodeRequest,
    responses(
        (status = 200, description = "Decoded filter tree", body = DecodeResponse),
        (status = 400, description = "Malformed request body"),
        (status = 422, description = "Query negates a clause with no filter-tree form")
    )
)]
pub async fn decode_query(
    State(state): State<FiltersApiState>,
    ValidatedJson(req): ValidatedJson<DecodeRequest>,
) -> Result<Json<DecodeResponse>, ApiError> {
    let fields = state.fields_for(req.fields.as_ref());
    let filters = elastic_builder::decode(&req.query, fields)?;

    tracing::debug!(
        clauses = req.query.len(),
        nodes = filters.len(),
        "Decoded query"
    );
    if state.debug {
        log_document("decode", &filters);
    }

    Ok(Json(DecodeResponse { filters }))
}

/// Build a query from a filter tree
#[utoipa::path(
    post,
    path = "/api/v1/filters/encode",
    tag = "filters",
    request_body = EncodeRequest,
    responses(
        (status = 200, description = "Encoded query", body = EncodeResponse),
        (status = 400, description = "Malformed request body"),
        (status = 422, description = "Rule names an unknown field or an unsupported subtype")
    )
)]
pub async fn encode_filters(
    State(state): State<FiltersApiState>,
    ValidatedJson(req): ValidatedJson<EncodeRequest>,
) -> Result<Json<EncodeResponse>, ApiError> {
    let fields = state.fields_for(req.fields.as_ref());
    let query = elastic_builder::encode(&req.filters, fields)?;

    tracing::debug!(
        nodes = req.filters.len(),
        clauses = query.len(),
        "Encoded filters"
    );
    if state.debug {
        log_document("encode", &query);
    }

    Ok(Json(EncodeResponse { query }))
}

fn log_document<T: Serialize>(direction: &str, document: &T) {
    match serde_json::to_string_pretty(document) {
        Ok(pretty) => tracing::info!("[{}]\n{}", direction, pretty),
        Err(e) => tracing::warn!(error = %e, direction, "Failed to render document"),
    }
}
