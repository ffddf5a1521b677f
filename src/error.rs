use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{repository::StoreError, storage::StorageError, textgen::TextGenError};

/// ApiError
///
/// The single error type returned by every handler and extractor. Each variant maps to
/// exactly one status code and is rendered as `{status: false, message, data?}`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Malformed or missing input; the caller must resubmit.
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Uniqueness violation; the caller must choose a different value.
    #[error("{message}")]
    Conflict {
        field: &'static str,
        message: String,
    },

    #[error("{0}")]
    NotFound(String),

    /// Known path, unsupported method.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Authenticated, but not the owner (or wrong role) for the target resource.
    #[error("{0}")]
    Forbidden(String),

    /// Authenticated and authorized, but the resource state refuses the operation.
    #[error("{0}")]
    Policy(String),

    #[error("Provide token")]
    MissingCredential,

    #[error("Token is invalid or expired")]
    InvalidCredential,

    #[error("Incorrect password")]
    IncorrectPassword,

    /// Store or text-generation collaborator failure. The detail is logged, not returned.
    #[error("Upstream service failure")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn conflict(field: &'static str, message: impl Into<String>) -> Self {
        ApiError::Conflict {
            field,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Forbidden(_) | ApiError::Policy(_) => StatusCode::FORBIDDEN,
            ApiError::MissingCredential
            | ApiError::InvalidCredential
            | ApiError::IncorrectPassword => StatusCode::UNAUTHORIZED,
            ApiError::Upstream(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The offending input field, for validation and conflict rejections.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ApiError::Validation { field, .. } | ApiError::Conflict { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            // The database constraint is the authoritative uniqueness signal.
            StoreError::UniqueViolation { constraint } => conflict_for_constraint(&constraint),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl From<TextGenError> for ApiError {
    fn from(err: TextGenError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

/// Maps a unique-index name from the schema back to the user-facing conflict message.
fn conflict_for_constraint(constraint: &str) -> ApiError {
    match constraint {
        "companies_company_email_key" => {
            ApiError::conflict("companyEmail", "The provided email already exists")
        }
        "companies_contact_number_key" => {
            ApiError::conflict("contactNumber", "Provided contact number already exists")
        }
        "students_email_key" => ApiError::conflict("email", "The provided email already exists"),
        "students_mobile_number_key" => {
            ApiError::conflict("mobileNumber", "Provided mobile number already exists")
        }
        "internships_company_id_position_key" => ApiError::conflict(
            "position",
            "An internship with the same position already exists for this company",
        ),
        "applications_student_id_internship_id_key" => ApiError::conflict(
            "internshipId",
            "You have already applied to this internship",
        ),
        _ => ApiError::conflict("unknown", "Resource already exists"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            ApiError::Upstream(detail) => tracing::error!("upstream failure: {}", detail),
            ApiError::Internal(detail) => tracing::error!("internal failure: {}", detail),
            ApiError::Validation { field, .. } | ApiError::Conflict { field, .. } => {
                tracing::debug!(field = %field, status = %status, "request rejected: {}", self)
            }
            _ => tracing::debug!(status = %status, "request rejected: {}", self),
        }

        let body = match self.field() {
            Some(field) => json!({
                "status": false,
                "message": self.to_string(),
                "data": { "field": field },
            }),
            None => json!({
                "status": false,
                "message": self.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}
