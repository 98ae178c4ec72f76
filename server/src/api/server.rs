//! API server initialization

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::response::Redirect;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use super::middleware::{self, AllowedOrigins};
use super::openapi::{openapi_json, swagger_ui_html};
use super::routes::{fields, filters, health, styles};
use crate::core::CoreApp;
use crate::core::config::AppConfig;

pub struct ApiServer {
    app: CoreApp,
    allowed_origins: AllowedOrigins,
}

impl ApiServer {
    pub fn new(app: CoreApp) -> Self {
        let allowed_origins = AllowedOrigins::new(&app.config.server.host, app.config.server.port);
        Self {
            app,
            allowed_origins,
        }
    }

    /// Returns CoreApp for graceful shutdown
    pub async fn start(self) -> Result<CoreApp> {
        let Self {
            app,
            allowed_origins,
        } = self;

        let shutdown = app.shutdown.clone();
        let addr = SocketAddr::new(app.config.server.host.parse()?, app.config.server.port);

        let router = router(&app.config).layer(middleware::cors(&allowed_origins));

        let listener = TcpListener::bind(addr).await?;
        tracing::debug!(%addr, "Listening");
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown.wait())
        .await?;

        Ok(app)
    }
}

/// All API routes, without CORS
pub fn router(config: &AppConfig) -> Router {
    let fields = Arc::new(config.fields.clone());

    Router::new()
        .route("/", get(|| async { Redirect::temporary("/api/docs") }))
        .route("/api/openapi.json", get(openapi_json))
        .route("/api/docs", get(swagger_ui_html))
        .route("/api/docs/", get(swagger_ui_html))
        .nest("/api/v1/health", health::routes(fields.clone()))
        .nest("/api/v1/fields", fields::routes(fields.clone()))
        .nest("/api/v1/filters", filters::routes(fields, config.debug))
        .nest("/api/v1/styles", styles::routes())
        .fallback(middleware::handle_404)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(config.limits.max_body_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use elastic_builder::{FieldDescriptor, FieldMap};
    use serde_json::{Value as JsonValue, json};
    use tower::ServiceExt;

    use crate::core::config::{LimitsConfig, ServerConfig};

    fn config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5390,
            },
            fields: FieldMap::new()
                .with("status", FieldDescriptor::term())
                .with("tier", FieldDescriptor::multi(["gold", "silver"])),
            limits: LimitsConfig {
                max_body_bytes: 1024,
            },
            debug: false,
            sources: Vec::new(),
        }
    }

    async fn send(request: Request<Body>) -> (StatusCode, JsonValue) {
        let response = router(&config()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_field_count() {
        let (status, body) = send(get("/api/v1/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["fields"], 2);
    }

    #[tokio::test]
    async fn test_fields_in_display_order() {
        let (status, body) = send(get("/api/v1/fields")).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&String> = body.as_object().unwrap().keys().collect();
        assert_eq!(names, ["status", "tier"]);
        assert_eq!(body["tier"]["choices"], json!(["gold", "silver"]));
    }

    #[tokio::test]
    async fn test_unknown_field_is_404() {
        let (status, body) = send(get("/api/v1/fields/ghost")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "FIELD_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_style_for_level() {
        let (status, body) = send(get("/api/v1/styles/0")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["class"], "");

        let (_, body) = send(get("/api/v1/styles/6")).await;
        assert_eq!(body["class"], "list-group-item-info");
    }

    #[tokio::test]
    async fn test_style_level_validation() {
        let (status, body) = send(get("/api/v1/styles/-1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "PATH_PARSE_ERROR");

        let (status, body) = send(get("/api/v1/styles/65")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_LEVEL");
    }

    #[tokio::test]
    async fn test_body_limit() {
        let padding = "x".repeat(2048);
        let body = json!({"query": [{"term": {"status": padding}}]}).to_string();
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/filters/decode")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"], "payload_too_large");
    }

    #[tokio::test]
    async fn test_openapi_lists_filter_paths() {
        let (status, body) = send(get("/api/openapi.json")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/api/v1/filters/decode"].is_object());
        assert!(body["paths"]["/api/v1/filters/encode"].is_object());
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (status, body) = send(get("/api/v1/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }
}
