//! Error taxonomy for the auth surface.
//!
//! `AuthError` is the single error type every handler, extractor and repo
//! function returns. `IntoResponse` renders the `{status, message}` envelope
//! with the mapped HTTP status (DESIGN.md §7). 5xx causes are logged and
//! replaced by a generic client-facing message so internal detail never
//! escapes the handler boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Everything that can go wrong across the auth surface, each mapped to a
/// single HTTP status by `IntoResponse`.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed or missing input — 400.
    #[error("{0}")]
    Validation(String),

    /// Uniqueness conflict, e.g. duplicate email — 409.
    #[error("{0}")]
    Conflict(String),

    /// Addressed resource does not exist — 404.
    #[error("{0}")]
    NotFound(String),

    /// Bad credentials — 401.
    #[error("{0}")]
    Authentication(String),

    /// Reset code absent or not matching — 400.
    #[error("Invalid OTP")]
    InvalidOtp,

    /// Reset code matched but past its deadline — 400.
    #[error("OTP expired")]
    ExpiredOtp,

    /// Missing/invalid/expired bearer token — 401.
    #[error("{0}")]
    InvalidToken(String),

    /// Outbound notification (email) failed — 502.
    #[error("{0}")]
    Notifier(String),

    /// Datastore failure — 500.
    #[error("database error")]
    Store(sqlx::Error),

    /// Internal failure (hash/sign) — 500.
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

/// Datastore errors cross the repo boundary through `?`. A unique-constraint
/// violation (Postgres `23505`) is intercepted and reported as a `Conflict`
/// (the only UNIQUE column is `users.email`); anything else is an opaque 500
/// `Store` failure. (DESIGN.md §7.)
impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.code().as_deref() == Some("23505") {
                return Self::Conflict("Email already registered".into());
            }
        }
        Self::Store(err)
    }
}

impl AuthError {
    /// 400 validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// 409 conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// 404 not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// 401 authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    /// 401 invalid-token error.
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken(message.into())
    }

    /// HTTP status this error maps to.
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidOtp | Self::ExpiredOtp => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Authentication(_) | Self::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            Self::Notifier(_) => StatusCode::BAD_GATEWAY,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Wire shape for every failure: `{"status":"Fail","message":"..."}`.
#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    status: &'static str,
    message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();

        // 5xx: log the real cause, return a generic message to the client.
        let message = if status.is_server_error() {
            error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorEnvelope {
                status: "Fail",
                message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            AuthError::validation("x").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::conflict("x").status(), StatusCode::CONFLICT);
        assert_eq!(AuthError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AuthError::authentication("x").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::invalid_token("x").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::InvalidOtp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::ExpiredOtp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::Notifier("x".into()).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn envelope_shape() {
        let json = serde_json::to_string(&ErrorEnvelope {
            status: "Fail",
            message: "boom".into(),
        })
        .unwrap();
        assert!(json.contains("\"status\":\"Fail\""));
        assert!(json.contains("\"message\":\"boom\""));
    }
}
