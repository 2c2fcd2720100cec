//! Error types for the gallery listing API

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use s3_listing_client::UpstreamError;
use serde_json::json;
use std::fmt;

/// Errors that stop the process from starting
#[derive(Debug)]
pub enum GalleryError {
    Config(String),
    Io(Box<std::io::Error>),
}

impl fmt::Display for GalleryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GalleryError::Config(msg) => write!(f, "Configuration error: {}", msg),
            GalleryError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for GalleryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GalleryError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GalleryError {
    fn from(err: std::io::Error) -> Self {
        GalleryError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for GalleryError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        GalleryError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GalleryError>;

/// Per-request failures of the listing endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingError {
    MethodNotAllowed,
    /// Required settings are missing; never cached, never retried
    Config(String),
    /// Malformed caller input, rejected before any upstream call
    Validation(String),
    NotFound(String),
    AccessDenied(String),
    /// Timeout or network failure talking to the store
    Transient(String),
    Unknown(String),
}

const NOT_FOUND_MESSAGE: &str = "Namespace not found";
const CONFIG_MESSAGE: &str = "Server is not configured";
const FETCH_FAILED_MESSAGE: &str = "Failed to fetch images";

impl ListingError {
    pub fn status(&self) -> StatusCode {
        match self {
            ListingError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ListingError::Validation(_) => StatusCode::BAD_REQUEST,
            ListingError::NotFound(_) | ListingError::AccessDenied(_) => StatusCode::NOT_FOUND,
            ListingError::Config(_) | ListingError::Transient(_) | ListingError::Unknown(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Render the error; `expose_detail` adds internal detail to 500 bodies
    pub fn into_response_with_detail(self, expose_detail: bool) -> Response {
        let status = self.status();
        let message = match self {
            ListingError::MethodNotAllowed => {
                let mut response = status.into_response();
                response
                    .headers_mut()
                    .insert(header::ALLOW, HeaderValue::from_static("GET"));
                return response;
            }
            ListingError::Validation(msg) => msg,
            // Access denied is reported as missing so callers cannot probe
            // for namespaces that exist.
            ListingError::NotFound(detail) | ListingError::AccessDenied(detail) => {
                tracing::warn!(error = %detail, "Namespace unavailable upstream");
                NOT_FOUND_MESSAGE.to_string()
            }
            ListingError::Config(detail) => {
                tracing::error!(error = %detail, "Configuration error");
                with_detail(CONFIG_MESSAGE, &detail, expose_detail)
            }
            ListingError::Transient(detail) | ListingError::Unknown(detail) => {
                tracing::error!(error = %detail, "Listing failed");
                with_detail(FETCH_FAILED_MESSAGE, &detail, expose_detail)
            }
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

fn with_detail(message: &str, detail: &str, expose_detail: bool) -> String {
    if expose_detail {
        format!("{}: {}", message, detail)
    } else {
        message.to_string()
    }
}

impl fmt::Display for ListingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingError::MethodNotAllowed => write!(f, "Method not allowed"),
            ListingError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ListingError::Validation(msg) => write!(f, "Invalid request: {}", msg),
            ListingError::NotFound(msg) => write!(f, "Upstream not found: {}", msg),
            ListingError::AccessDenied(msg) => write!(f, "Upstream access denied: {}", msg),
            ListingError::Transient(msg) => write!(f, "Upstream unavailable: {}", msg),
            ListingError::Unknown(msg) => write!(f, "Unknown error: {}", msg),
        }
    }
}

impl std::error::Error for ListingError {}

impl From<UpstreamError> for ListingError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Config(msg) => ListingError::Config(msg),
            UpstreamError::NotFound(msg) => ListingError::NotFound(msg),
            UpstreamError::AccessDenied(msg) => ListingError::AccessDenied(msg),
            UpstreamError::Transient(msg) => ListingError::Transient(msg),
            UpstreamError::Other(msg) => ListingError::Unknown(msg),
        }
    }
}

impl IntoResponse for ListingError {
    fn into_response(self) -> Response {
        self.into_response_with_detail(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn test_config_error_display() {
        let err = GalleryError::Config("missing S3_BUCKET_NAME".to_string());
        assert_eq!(
            format!("{}", err),
            "Configuration error: missing S3_BUCKET_NAME"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ListingError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            ListingError::Validation(String::new()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ListingError::NotFound(String::new()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ListingError::AccessDenied(String::new()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ListingError::Config(String::new()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ListingError::Transient(String::new()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ListingError::Unknown(String::new()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_from_upstream_error() {
        assert_eq!(
            ListingError::from(UpstreamError::Other("x".to_string())),
            ListingError::Unknown("x".to_string())
        );
        assert_eq!(
            ListingError::from(UpstreamError::Config("x".to_string())),
            ListingError::Config("x".to_string())
        );
        assert_eq!(
            ListingError::from(UpstreamError::Transient("x".to_string())),
            ListingError::Transient("x".to_string())
        );
    }

    #[tokio::test]
    async fn test_unknown_detail_suppressed() {
        let response = ListingError::Unknown("secret bucket layout".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Failed to fetch images");
    }

    #[tokio::test]
    async fn test_unknown_detail_exposed_in_development() {
        let response = ListingError::Unknown("socket closed".to_string())
            .into_response_with_detail(true);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Failed to fetch images: socket closed");
    }

    #[tokio::test]
    async fn test_access_denied_looks_like_not_found() {
        let response = ListingError::AccessDenied("AccessDenied".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Namespace not found");
    }

    #[tokio::test]
    async fn test_method_not_allowed_has_no_body() {
        let response = ListingError::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_validation_message_passed_through() {
        let response =
            ListingError::Validation("maxKeys must be between 1 and 1000".to_string())
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "maxKeys must be between 1 and 1000");
    }
}
