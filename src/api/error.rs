//! API error types with structured JSON responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::clinical::CdsError;

/// Error envelope: `{ "success": false, "error": { code, message } }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Reference lookup failed: {0}")]
    LookupFailed(String),
    #[error("Unsupported unit conversion: {message}")]
    UnsupportedConversion { message: String, status: StatusCode },
    #[error("Invalid dose format: {0}")]
    InvalidDoseFormat(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Mapping for the unit-conversion utility, where conversion failures are
    /// the caller's fault.
    pub fn from_conversion(err: CdsError) -> Self {
        match err {
            CdsError::UnsupportedConversion { .. } => ApiError::UnsupportedConversion {
                message: err.to_string(),
                status: StatusCode::BAD_REQUEST,
            },
            other => other.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::LookupFailed(detail) => {
                tracing::error!(detail, "Reference lookup failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LOOKUP_FAILED",
                    "Reference data lookup failed".to_string(),
                )
            }
            ApiError::UnsupportedConversion { message, status } => {
                (*status, "UNSUPPORTED_UNIT_CONVERSION", message.clone())
            }
            ApiError::InvalidDoseFormat(detail) => (
                StatusCode::BAD_REQUEST,
                "INVALID_DOSE_FORMAT",
                format!("Invalid dose format: {detail}"),
            ),
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            success: false,
            error: ErrorDetail { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<CdsError> for ApiError {
    fn from(err: CdsError) -> Self {
        match err {
            CdsError::Lookup(_) | CdsError::Timeout { .. } | CdsError::TaskFailed { .. } => {
                ApiError::LookupFailed(err.to_string())
            }
            CdsError::UnsupportedConversion { .. } => ApiError::UnsupportedConversion {
                message: err.to_string(),
                status: StatusCode::INTERNAL_SERVER_ERROR,
            },
            CdsError::InvalidDoseFormat(detail) => ApiError::InvalidDoseFormat(detail),
            CdsError::ReferenceDataLoad(..) | CdsError::ReferenceDataParse(..) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    use crate::clinical::LookupError;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn lookup_errors_return_500_without_details() {
        let err: ApiError =
            CdsError::Lookup(LookupError::Unavailable("db on fire".into())).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "LOOKUP_FAILED");
        assert!(!json["error"]["message"].as_str().unwrap().contains("fire"));
    }

    #[tokio::test]
    async fn timeouts_map_to_lookup_failed() {
        let err: ApiError = CdsError::Timeout {
            check: "dose",
            timeout_ms: 10,
        }
        .into();
        let json = body_json(err.into_response()).await;
        assert_eq!(json["error"]["code"], "LOOKUP_FAILED");
    }

    #[tokio::test]
    async fn conversion_status_depends_on_context() {
        let inside_check: ApiError = CdsError::UnsupportedConversion {
            from: "ml".into(),
            to: "mg".into(),
        }
        .into();
        assert_eq!(
            inside_check.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let utility = ApiError::from_conversion(CdsError::UnsupportedConversion {
            from: "ml".into(),
            to: "mg".into(),
        });
        let response = utility.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "UNSUPPORTED_UNIT_CONVERSION");
    }

    #[tokio::test]
    async fn invalid_dose_format_returns_400() {
        let err: ApiError = CdsError::InvalidDoseFormat("lots".into()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "INVALID_DOSE_FORMAT");
    }

    #[tokio::test]
    async fn internal_returns_500() {
        let response = ApiError::Internal("something broke".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        // Internal errors hide details from client
        assert_eq!(json["error"]["message"], "An internal error occurred");
    }
}
