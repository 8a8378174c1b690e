//! Error types for the attendance and payroll engine.
//!
//! Every engine operation returns [`EngineError`]. Each variant has a stable
//! machine code and HTTP status so client UIs can branch on the failure kind
//! ("outside allowed area" vs. "already clocked in").

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::model::break_slot::BreakKind;

#[derive(Debug, Error)]
pub enum EngineError {
    /// An exclusive-state precondition was violated (double time-in).
    #[error("{message}")]
    Conflict { message: String },

    /// A referenced session, user or record does not exist.
    #[error("{what} not found")]
    Lookup { what: String },

    /// The punch coordinate is outside every allowed location of the user.
    #[error("Location ({latitude}, {longitude}) is outside the allowed area")]
    LocationDenied { latitude: f64, longitude: f64 },

    /// The break slot sequence for this session is exhausted.
    #[error("No {kind} break slots left for this session")]
    BreakLimit { kind: BreakKind },

    /// The requester may not access the target user's data.
    #[error("Access to the requested user is forbidden")]
    Forbidden,

    /// Payroll inputs (pay rate or payroll settings) are not configured.
    #[error("{what} is not configured")]
    MissingConfiguration { what: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Storage failure: {0}")]
    Store(#[from] sqlx::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn conflict(message: impl Into<String>) -> Self {
        EngineError::Conflict {
            message: message.into(),
        }
    }

    pub fn lookup(what: impl Into<String>) -> Self {
        EngineError::Lookup { what: what.into() }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        EngineError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        EngineError::Internal {
            message: message.into(),
        }
    }

    /// Stable machine-readable code returned to clients.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Conflict { .. } => "CONFLICT",
            EngineError::Lookup { .. } => "NOT_FOUND",
            EngineError::LocationDenied { .. } => "LOCATION_DENIED",
            EngineError::BreakLimit { .. } => "BREAK_LIMIT",
            EngineError::Forbidden => "FORBIDDEN",
            EngineError::MissingConfiguration { .. } => "MISSING_CONFIGURATION",
            EngineError::InvalidInput { .. } => "INVALID_INPUT",
            EngineError::Internal { .. } | EngineError::Store(_) => "INTERNAL",
        }
    }
}

impl ResponseError for EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::Conflict { .. } => StatusCode::CONFLICT,
            EngineError::Lookup { .. } => StatusCode::NOT_FOUND,
            EngineError::LocationDenied { .. } => StatusCode::FORBIDDEN,
            EngineError::BreakLimit { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::Forbidden => StatusCode::FORBIDDEN,
            EngineError::MissingConfiguration { .. } => StatusCode::NOT_FOUND,
            EngineError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            EngineError::Internal { .. } | EngineError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            // never echo driver or internal text back to the client
            EngineError::Internal { .. } | EngineError::Store(_) => {
                error!(code = self.code(), error = %self, "Request failed with internal error");
                json!({
                    "code": self.code(),
                    "message": "Internal Server Error",
                })
            }
            EngineError::LocationDenied {
                latitude,
                longitude,
            } => json!({
                "code": self.code(),
                "message": self.to_string(),
                "latitude": latitude,
                "longitude": longitude,
            }),
            _ => json!({
                "code": self.code(),
                "message": self.to_string(),
            }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
