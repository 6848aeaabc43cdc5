/// Unified error types for the MO26 portal
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the portal
#[derive(Error, Debug)]
pub enum PortalError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration errors
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Authentication errors
    #[error("{0}")]
    Authentication(String),

    /// Authorization errors
    #[error("{0}")]
    Authorization(String),

    /// Validation errors not tied to a single field
    #[error("{0}")]
    Validation(String),

    /// Validation errors for a named request field
    #[error("{message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (duplicate team name, coupon code)
    #[error("{message}")]
    Conflict {
        message: String,
        field: Option<&'static str>,
    },

    /// A table the request needs has not been created yet
    #[error("{message}")]
    SchemaMissing { message: String, fix: String },

    /// Operator setup is incomplete (e.g. no admin user exists)
    #[error("{message}")]
    Setup { message: String, fix: String },

    /// Email building or delivery errors
    #[error("Email error: {0}")]
    Email(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PortalError {
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        PortalError::InvalidField {
            field,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>, field: Option<&'static str>) -> Self {
        PortalError::Conflict {
            message: message.into(),
            field,
        }
    }

    /// Missing-table error pointing the operator at the migration command
    pub fn schema_missing(table: &str) -> Self {
        PortalError::SchemaMissing {
            message: format!("Database is not initialized ({} table is missing).", table),
            fix: "Run `mo26-portal migrate` against the same DATABASE_URL used by the server."
                .to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PortalError::Authentication(_) => StatusCode::UNAUTHORIZED,
            PortalError::Authorization(_) => StatusCode::FORBIDDEN,
            PortalError::Validation(_) | PortalError::InvalidField { .. } => {
                StatusCode::BAD_REQUEST
            }
            PortalError::NotFound(_) => StatusCode::NOT_FOUND,
            PortalError::Conflict { .. } => StatusCode::CONFLICT,
            PortalError::Email(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for PortalError {
    fn from(rejection: JsonRejection) -> Self {
        PortalError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for PortalError {
    fn from(rejection: QueryRejection) -> Self {
        PortalError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for PortalError {
    fn from(rejection: PathRejection) -> Self {
        PortalError::Validation(rejection.body_text())
    }
}

/// JSON error body returned by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
}

/// Convert PortalError to HTTP response
impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (error, field, fix) = match &self {
            PortalError::InvalidField { field, message } => {
                (message.clone(), Some(field.to_string()), None)
            }
            PortalError::Conflict { message, field } => {
                (message.clone(), field.map(str::to_string), None)
            }
            PortalError::SchemaMissing { message, fix } | PortalError::Setup { message, fix } => {
                tracing::error!("{}", message);
                (message.clone(), None, Some(fix.clone()))
            }
            PortalError::Email(message) => {
                tracing::warn!("{}", message);
                (message.clone(), None, None)
            }
            PortalError::Database(_)
            | PortalError::Migration(_)
            | PortalError::Internal(_)
            | PortalError::Io(_) => {
                tracing::error!(error = %self, "request failed");
                // Don't leak details
                ("Internal server error".to_string(), None, None)
            }
            _ => (self.to_string(), None, None),
        };

        let body = Json(ErrorResponse {
            success: false,
            error,
            field,
            fix,
        });

        (status, body).into_response()
    }
}

/// Result type alias for portal operations
pub type PortalResult<T> = Result<T, PortalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            PortalError::Authentication("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            PortalError::Authorization("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            PortalError::invalid_field("teamName", "bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PortalError::conflict("dup", Some("teamName")).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            PortalError::schema_missing("coupons").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_schema_missing_carries_fix() {
        match PortalError::schema_missing("admin_sessions") {
            PortalError::SchemaMissing { message, fix } => {
                assert!(message.contains("admin_sessions"));
                assert!(fix.contains("migrate"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
