//! # Error Handling for the Catalog API
//!
//! Engine errors ([`QueryError`]) and store errors ([`DbErr`]) are mapped to
//! HTTP responses here:
//! - caller mistakes become `400 Bad Request` naming the offending field
//! - missing records become `404 Not Found`
//! - `mine=true` without a caller identity becomes `401 Unauthorized`
//! - store failures become `500`/`503` with a generic message; the details are
//!   logged through `tracing` and never sent to the client.

use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use utoipa::ToSchema;

use crate::filtering::QueryError;

/// API error type with automatic logging and sanitized responses
#[derive(Debug)]
pub enum ApiError {
    /// 404 Not Found - Resource doesn't exist
    NotFound {
        /// Resource type (e.g., "site", "result")
        resource: String,
        /// Optional ID that wasn't found
        id: Option<String>,
    },

    /// 400 Bad Request - Invalid listing parameters
    BadRequest {
        /// User-facing error message
        message: String,
        /// Parameter or expression at fault
        field: Option<String>,
    },

    /// 401 Unauthorized - Authentication required
    Unauthorized {
        /// User-facing error message
        message: String,
    },

    /// 500 Internal Server Error - Database error (details logged, not exposed)
    Database {
        /// User-facing generic message
        message: String,
        /// Internal error (logged, not sent to user)
        internal: DbErr,
    },

    /// 503 Service Unavailable - The store did not answer in time
    Unavailable {
        /// User-facing generic message
        message: String,
        /// Internal error details (logged, not sent to user)
        internal: String,
    },
}

impl ApiError {
    pub fn not_found(resource: impl Into<String>, id: Option<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id,
        }
    }

    pub fn bad_request(message: impl Into<String>, field: Option<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            field,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a 500 Internal Server Error from a database error
    ///
    /// The database error details are logged but NOT sent to the user.
    #[must_use]
    pub fn database(err: DbErr) -> Self {
        Self::Database {
            message: "A database error occurred".to_string(),
            internal: err,
        }
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get the user-facing error message (sanitized)
    fn user_message(&self) -> String {
        match self {
            Self::NotFound { resource, id } => match id {
                Some(id) => format!("{resource} with ID '{id}' not found"),
                None => format!("{resource} not found"),
            },
            Self::BadRequest { message, .. }
            | Self::Unauthorized { message }
            | Self::Database { message, .. }
            | Self::Unavailable { message, .. } => message.clone(),
        }
    }

    /// Log internal error details (not sent to user)
    fn log_internal(&self) {
        match self {
            Self::Database { internal, .. } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            Self::Unavailable { internal, .. } => {
                tracing::error!(details = %internal, "Store unavailable");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "API error"
                );
            }
        }
    }
}

/// Error response sent to users (sanitized)
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Parameter or expression at fault
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let response = ErrorResponse {
            error: self.user_message(),
            field: match &self {
                Self::BadRequest { field, .. } => field.clone(),
                _ => None,
            },
        };

        (status, Json(response)).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for ApiError {}

/// Convert `SeaORM` `DbErr` to `ApiError`
///
/// - `DbErr::RecordNotFound` → 404 Not Found
/// - All other `DbErr` variants → 500 Internal Server Error
impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::RecordNotFound(msg) => Self::NotFound {
                resource: msg,
                id: None,
            },
            _ => Self::database(err),
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        let message = err.to_string();
        match err {
            QueryError::Validation { field, .. }
            | QueryError::UnknownField { field }
            | QueryError::TypeMismatch { field, .. } => Self::bad_request(message, Some(field)),
            QueryError::MalformedPredicate { predicate, .. } => {
                Self::bad_request(message, Some(predicate))
            }
            QueryError::UnsupportedPredicateType { path, .. } => {
                Self::bad_request(message, Some(path))
            }
            QueryError::IdentityRequired { .. } => Self::unauthorized(message),
            QueryError::StoreUnavailable(internal) => Self::database(internal),
            QueryError::Timeout(limit) => Self::Unavailable {
                message: "The service is temporarily unavailable".to_string(),
                internal: format!("query exceeded {limit:?}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn test_not_found_message() {
        let err = ApiError::not_found("site", Some("123".to_string()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "site with ID '123' not found");
    }

    #[test]
    fn test_caller_errors_are_bad_requests() {
        for err in [
            QueryError::validation("page", "must be at least 1"),
            QueryError::unknown_field("nonexistent_field"),
            QueryError::malformed("cpu.count ~ 4", "unsupported operator '~'"),
            QueryError::TypeMismatch {
                field: "id".into(),
                value: "abc".into(),
            },
            QueryError::UnsupportedPredicateType {
                path: "cpu.count".into(),
                operator: ">".into(),
                literal: "number",
            },
        ] {
            assert_eq!(ApiError::from(err).status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_identity_required_is_unauthorized() {
        let err = ApiError::from(QueryError::IdentityRequired {
            field: "mine".into(),
        });
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_store_errors_are_server_errors() {
        let err = ApiError::from(QueryError::StoreUnavailable(DbErr::Custom("boom".into())));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let err = ApiError::from(QueryError::Timeout(Duration::from_secs(5)));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_unknown_field_response_names_the_field() {
        let (status, body) =
            body_json(QueryError::unknown_field("nonexistent_field").into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "nonexistent_field");
        assert_eq!(body["error"], "unknown field 'nonexistent_field'");
    }

    #[tokio::test]
    async fn test_database_error_response_hides_details() {
        let err = DbErr::Custom("password authentication failed for user admin".into());
        let (status, body) = body_json(ApiError::from(err)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "A database error occurred");
        assert!(body.get("field").is_none());
        assert!(!body.to_string().contains("password"));
    }

    #[test]
    fn test_record_not_found_maps_to_404() {
        let err = ApiError::from(DbErr::RecordNotFound("site".into()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
