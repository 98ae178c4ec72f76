//! Path and validation extractors for API routes

use std::ops::Deref;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use validator::Validate;

use super::types::ApiError;
use crate::core::constants::MAX_STYLE_LEVEL;

/// Nesting level from the URL path, bounded by `MAX_STYLE_LEVEL`
#[derive(Debug)]
pub struct LevelPath {
    pub level: usize,
}

impl<S> FromRequestParts<S> for LevelPath
where
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(level) = Path::<usize>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::Path)?;

        if level > MAX_STYLE_LEVEL {
            return Err(ValidationRejection::InvalidLevel);
        }

        Ok(Self { level })
    }
}

/// Rejection for path or body validation failures
#[derive(Debug)]
pub enum ValidationRejection {
    Path(PathRejection),
    InvalidLevel,
    Json(JsonRejection),
    Validation(validator::ValidationErrors),
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        let error = match self {
            Self::Path(rejection) => {
                ApiError::bad_request("PATH_PARSE_ERROR", rejection.body_text())
            }
            Self::InvalidLevel => ApiError::bad_request(
                "INVALID_LEVEL",
                format!("Invalid level: must be at most {}", MAX_STYLE_LEVEL),
            ),
            Self::Json(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                ApiError::payload_too_large(rejection.body_text())
            }
            // Syntax and data errors alike are a malformed body
            Self::Json(rejection) => {
                ApiError::bad_request("JSON_PARSE_ERROR", rejection.body_text())
            }
            Self::Validation(errors) => {
                ApiError::bad_request("VALIDATION_ERROR", format_validation_errors(&errors))
            }
        };
        tracing::debug!(error = ?error, "Rejected request");
        error.into_response()
    }
}

fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{}: validation failed", field))
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// JSON body extractor with automatic validation.
///
/// Any body the codec types cannot represent, or that fails `validator`
/// rules, is a 400 before the handler runs.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ValidationRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidationRejection::Json)?;
        value.validate().map_err(ValidationRejection::Validation)?;
        Ok(Self(value))
    }
}
