//! Problem responses (RFC 7807) for every request that does not end in a
//! page or a redirect.

use serde::{Deserialize, Serialize};

/// RFC 7807 Problem Details for HTTP APIs.
///
/// See: https://datatracker.ietf.org/doc/html/rfc7807
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type")]
    pub error_type: String,

    /// A short, human-readable summary of the problem type.
    pub title: String,

    /// The HTTP status code.
    pub status: u16,

    /// A human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Submitted form values, echoed back on validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<serde_json::Value>,

    /// Field-level messages keyed by form field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(status: u16, title: impl Into<String>) -> Self {
        Self {
            error_type: "about:blank".to_string(),
            title: title.into(),
            status,
            detail: None,
            form: None,
            errors: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    // Common error constructors
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(400, "Bad Request").with_detail(detail)
    }

    pub fn unauthorized() -> Self {
        Self::new(401, "Unauthorized")
    }

    pub fn not_found() -> Self {
        Self::new(404, "Not Found")
    }

    pub fn internal_error() -> Self {
        Self::new(500, "Internal Server Error")
    }

    /// A form that has to be resubmitted.
    pub fn validation(form: serde_json::Value, errors: serde_json::Value) -> Self {
        let mut response = Self::new(422, "Validation Failed");
        response.form = Some(form);
        response.errors = Some(errors);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_has_no_detail() {
        let json = serde_json::to_value(ErrorResponse::not_found()).unwrap();
        assert_eq!(json["status"], 404);
        assert_eq!(json["type"], "about:blank");
        assert!(json.get("detail").is_none());
    }

    #[test]
    fn test_validation_carries_form_and_errors() {
        let response = ErrorResponse::validation(
            serde_json::json!({"text": ""}),
            serde_json::json!({"text": ["This field is required."]}),
        );
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["status"], 422);
        assert_eq!(json["errors"]["text"][0], "This field is required.");
        assert!(json.get("detail").is_none());
    }
}
