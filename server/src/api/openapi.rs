//! OpenAPI document and Swagger UI

use axum::http::header;
use axum::response::{Html, IntoResponse, Json};
use utoipa::OpenApi;

use crate::api::routes::{fields, filters, health, styles};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Elastic Builder API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Filter tree and search query conversion"
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "fields", description = "Configured field map"),
        (name = "filters", description = "Query decoding and filter encoding"),
        (name = "styles", description = "Nesting-level style classes")
    ),
    paths(
        health::health,
        fields::list_fields,
        fields::get_field,
        filters::decode_query,
        filters::encode_filters,
        styles::palette,
        styles::style_for_level,
    ),
    components(schemas(
        health::HealthResponse,
        filters::DecodeRequest,
        filters::DecodeResponse,
        filters::EncodeRequest,
        filters::EncodeResponse,
        styles::StyleResponse,
        styles::PaletteResponse,
    ))
)]
pub struct ApiDoc;

/// Serve the OpenAPI JSON document
pub async fn openapi_json() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        Json(ApiDoc::openapi()),
    )
}

/// Serve Swagger UI from CDN
pub async fn swagger_ui_html() -> Html<&'static str> {
    Html(SWAGGER_UI_HTML)
}

const SWAGGER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Elastic Builder API Documentation</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        html { box-sizing: border-box; overflow-y: scroll; }
        *, *:before, *:after { box-sizing: inherit; }
        body { margin: 0; background: #fafafa; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = () => {
            window.ui = SwaggerUIBundle({
                url: "/api/openapi.json",
                dom_id: '#swagger-ui',
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: "StandaloneLayout",
                deepLinking: true,
                showExtensions: true,
                showCommonExtensions: true
            });
        };
    </script>
</body>
</html>"#;
