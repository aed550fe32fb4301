//! Error handling - RFC 7807 problem responses and redirects.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;

use blogicum_core::error::{DomainError, RepoError};
use blogicum_core::forms::FieldErrors;
use blogicum_shared::ErrorResponse;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing and hidden resources look the same to the client.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Validation errors: {errors}")]
    Validation {
        form: serde_json::Value,
        errors: FieldErrors,
    },
}

impl AppError {
    /// Validation failure echoing the submitted form.
    pub fn invalid<F: Serialize>(form: &F, errors: FieldErrors) -> Self {
        AppError::Validation {
            form: serde_json::to_value(form).unwrap_or(serde_json::Value::Null),
            errors,
        }
    }

    /// Map a domain error, attaching `form` if it turns out to be a
    /// validation failure.
    pub fn with_form<F: Serialize>(form: &F) -> impl FnOnce(DomainError) -> AppError + '_ {
        move |err| match err {
            DomainError::Validation(errors) => AppError::invalid(form, errors),
            other => other.into(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::NotFound(detail) => {
                tracing::debug!("{}", detail);
                ErrorResponse::not_found()
            }
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Unauthorized => ErrorResponse::unauthorized(),
            AppError::Conflict(detail) => ErrorResponse::new(409, "Conflict").with_detail(detail),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
            AppError::Validation { form, errors } => ErrorResponse::validation(
                form.clone(),
                serde_json::to_value(errors).unwrap_or(serde_json::Value::Null),
            ),
        };

        HttpResponse::build(self.status_code()).json(error)
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, key } => {
                AppError::NotFound(format!("{} {} not found", entity_type, key))
            }
            DomainError::Validation(errors) => AppError::Validation {
                form: serde_json::Value::Null,
                errors,
            },
            DomainError::Duplicate(msg) => AppError::Conflict(msg),
            DomainError::Unauthorized => AppError::Unauthorized,
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => AppError::Conflict(msg),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_hidden_and_missing_render_identically() {
        let hidden = AppError::from(DomainError::not_found("post", "a"));
        let missing = AppError::from(RepoError::NotFound);
        assert_eq!(hidden.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_store_failures_are_internal() {
        let err = AppError::from(DomainError::from(RepoError::Query("boom".into())));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn test_validation_echoes_form() {
        let mut errors = FieldErrors::new();
        errors.add("text", "This field is required.");
        let err = AppError::with_form(&serde_json::json!({"text": ""}))(DomainError::Validation(errors));

        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["form"]["text"], "");
        assert_eq!(json["errors"]["text"][0], "This field is required.");
    }
}
