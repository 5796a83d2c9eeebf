use crate::archive::ArchiveError;
use crate::utils::validation::ValidationError;
use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt::Display;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: String,
    pub message: String,
}

/// Error type for API handlers. Always rendered as `{ok:false, error, message}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, message)
    }

    pub fn not_configured(reason: impl Display) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "API not configured",
            reason.to_string(),
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::bad_request(e.title(), e.to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request("Invalid query", rejection.body_text())
    }
}

impl From<ArchiveError> for ApiError {
    fn from(e: ArchiveError) -> Self {
        let status = match &e {
            ArchiveError::NotFound(_) => StatusCode::NOT_FOUND,
            ArchiveError::Read { .. } | ArchiveError::Parse { .. } => {
                warn!("Archive error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        };
        Self::new(status, e.title(), e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            ok: false,
            error: self.error,
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_bad_requests() {
        let err: ApiError = ValidationError::Date("2024-13-01".to_string()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error, "Invalid date format");
        assert!(err.message.contains("2024-13-01"));
    }

    #[test]
    fn test_archive_error_statuses() {
        let cases = [
            (ArchiveError::MissingFile, StatusCode::BAD_REQUEST),
            (ArchiveError::InvalidPath("../x".into()), StatusCode::BAD_REQUEST),
            (ArchiveError::NotFound("x.json".into()), StatusCode::NOT_FOUND),
            (ArchiveError::UnsupportedType("x.csv".into()), StatusCode::BAD_REQUEST),
            (
                ArchiveError::Read {
                    path: "x.txt".into(),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(ApiError::from(error).status(), expected);
        }
    }

    #[test]
    fn test_not_configured() {
        let err = ApiError::not_configured("Football API key is missing");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error, "API not configured");
    }
}
