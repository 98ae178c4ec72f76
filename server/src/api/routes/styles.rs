//! Nesting-level style lookup

use axum::Json;
use axum::Router;
use axum::routing::get;
use elastic_builder::{GROUP_STYLES, color_for};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::extractors::LevelPath;

#[derive(Debug, Serialize, ToSchema)]
pub struct StyleResponse {
    pub level: usize,
    /// CSS class, empty for level zero
    pub class: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaletteResponse {
    pub styles: Vec<&'static str>,
}

pub fn routes() -> Router<()> {
    Router::new()
        .route("/", get(palette))
        .route("/{level}", get(style_for_level))
}

/// The cycling style palette
#[utoipa::path(
    get,
    path = "/api/v1/styles",
    tag = "styles",
    responses((status = 200, description = "Style palette", body = PaletteResponse))
)]
pub async fn palette() -> Json<PaletteResponse> {
    Json(PaletteResponse {
        styles: GROUP_STYLES.to_vec(),
    })
}

/// Style class for a nesting level
#[utoipa::path(
    get,
    path = "/api/v1/styles/{level}",
    tag = "styles",
    params(("level" = usize, Path, description = "Nesting level")),
    responses(
        (status = 200, description = "Style class", body = StyleResponse),
        (status = 400, description = "Level is not a small non-negative integer")
    )
)]
pub async fn style_for_level(LevelPath { level }: LevelPath) -> Json<StyleResponse> {
    Json(StyleResponse {
        level,
        class: color_for(level),
    })
}
