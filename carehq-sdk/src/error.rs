//! Typed failures for non-success API responses.
//!
//! Every status code other than 200/204 maps to exactly one [`ApiErrorKind`].
//! The resulting [`ApiError`] keeps the status code, the fixed category
//! message of its kind and whatever diagnostics the service returned in the
//! response body (`hint` and `arg_errors`).

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

/// Per-argument validation messages, keyed by field name.
pub type ArgErrors = IndexMap<String, Vec<String>>;

/// The closed set of API failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// 400
    InvalidRequest,
    /// 401
    Unauthorized,
    /// 403 and 405
    Forbidden,
    /// 404
    NotFound,
    /// 429
    RateLimitExceeded,
    /// Any other non-success status.
    Unhandled,
}

impl ApiErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::InvalidRequest,
            401 => Self::Unauthorized,
            403 | 405 => Self::Forbidden,
            404 => Self::NotFound,
            429 => Self::RateLimitExceeded,
            _ => Self::Unhandled,
        }
    }

    /// Human-readable category message shared by every error of this kind.
    pub fn message(self) -> &'static str {
        match self {
            Self::InvalidRequest => {
                "Not a valid request, most likely a missing or invalid parameter."
            }
            Self::Unauthorized => "The API credentials provided are not valid.",
            Self::Forbidden => {
                "The request is not allowed — wrong HTTP method or insufficient permission."
            }
            Self::NotFound => "The endpoint or referenced resource does not exist.",
            Self::RateLimitExceeded => {
                "You have exceeded the number of API requests allowed per second."
            }
            Self::Unhandled => "Unhandled Exception",
        }
    }
}

/// The error body of a failed response did not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed error body: {0}")]
pub struct MalformedErrorBody(pub String);

/// A non-success response from the API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    kind: ApiErrorKind,
    status: u16,
    hint: Option<Value>,
    arg_errors: Option<ArgErrors>,
}

impl ApiError {
    /// Map a status code and its diagnostics to an error.
    pub fn new(status: u16, hint: Option<Value>, arg_errors: Option<ArgErrors>) -> Self {
        Self {
            kind: ApiErrorKind::from_status(status),
            status,
            hint,
            arg_errors,
        }
    }

    /// Build an error from a parsed response body.
    ///
    /// `hint` and `arg_errors` are read as optional properties; a JSON `null`
    /// counts as absent. An `arg_errors` value that is not an object of
    /// string arrays is rejected.
    pub fn from_body(status: u16, body: &Value) -> Result<Self, MalformedErrorBody> {
        let hint = optional_field(body, "hint").cloned();
        let arg_errors = optional_field(body, "arg_errors")
            .map(|value| {
                serde_json::from_value::<ArgErrors>(value.clone())
                    .map_err(|e| MalformedErrorBody(format!("arg_errors: {e}")))
            })
            .transpose()?;
        Ok(Self::new(status, hint, arg_errors))
    }

    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn message(&self) -> &'static str {
        self.kind.message()
    }

    pub fn hint(&self) -> Option<&Value> {
        self.hint.as_ref()
    }

    pub fn arg_errors(&self) -> Option<&ArgErrors> {
        self.arg_errors.as_ref()
    }
}

/// Read a property of a JSON object, treating `null` and non-objects as absent.
pub(crate) fn optional_field<'a>(doc: &'a Value, name: &str) -> Option<&'a Value> {
    doc.get(name).filter(|value| !value.is_null())
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}\n---", self.status, self.message())?;
        if let Some(hint) = &self.hint {
            match hint {
                Value::String(s) => write!(f, "\nHint: {s}")?,
                other => write!(f, "\nHint: {other}")?,
            }
        }
        if let Some(arg_errors) = &self.arg_errors {
            for (field, messages) in arg_errors {
                write!(f, "\n- {}: {}", field, messages.join(" "))?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (400, ApiErrorKind::InvalidRequest),
            (401, ApiErrorKind::Unauthorized),
            (403, ApiErrorKind::Forbidden),
            (404, ApiErrorKind::NotFound),
            (405, ApiErrorKind::Forbidden),
            (429, ApiErrorKind::RateLimitExceeded),
            (418, ApiErrorKind::Unhandled),
            (500, ApiErrorKind::Unhandled),
            (201, ApiErrorKind::Unhandled),
        ];
        for (status, kind) in cases {
            assert_eq!(ApiErrorKind::from_status(status), kind, "status {status}");
        }
    }

    #[test]
    fn test_unhandled_message() {
        assert_eq!(ApiErrorKind::Unhandled.message(), "Unhandled Exception");
        assert_eq!(
            ApiError::new(502, None, None).message(),
            "Unhandled Exception"
        );
    }

    #[test]
    fn test_from_body_extracts_hint_and_arg_errors() {
        let body = json!({
            "hint": "check the email field",
            "arg_errors": { "email": ["is required"], "name": ["too short", "invalid"] }
        });
        let err = ApiError::from_body(400, &body).unwrap();

        assert_eq!(err.kind(), ApiErrorKind::InvalidRequest);
        assert_eq!(err.status(), 400);
        assert_eq!(err.hint(), Some(&json!("check the email field")));
        let arg_errors = err.arg_errors().unwrap();
        assert_eq!(arg_errors["email"], vec!["is required".to_string()]);
        assert_eq!(arg_errors["name"].len(), 2);
    }

    #[test]
    fn test_from_body_treats_null_as_absent() {
        let body = json!({ "hint": null, "arg_errors": null });
        let err = ApiError::from_body(404, &body).unwrap();

        assert!(err.hint().is_none());
        assert!(err.arg_errors().is_none());
    }

    #[test]
    fn test_from_body_ignores_non_object_documents() {
        let err = ApiError::from_body(500, &json!(["unexpected"])).unwrap();

        assert_eq!(err.kind(), ApiErrorKind::Unhandled);
        assert!(err.hint().is_none());
    }

    #[test]
    fn test_from_body_rejects_malformed_arg_errors() {
        assert!(ApiError::from_body(400, &json!({ "arg_errors": "nope" })).is_err());
        assert!(ApiError::from_body(400, &json!({ "arg_errors": { "a": "b" } })).is_err());
    }

    #[test]
    fn test_display_renders_diagnostics() {
        let body = json!({
            "hint": "not there",
            "arg_errors": { "email": ["is required", "must be valid"] }
        });
        let err = ApiError::from_body(404, &body).unwrap();

        assert_eq!(
            err.to_string(),
            "[404] The endpoint or referenced resource does not exist.\n---\n\
             Hint: not there\n- email: is required must be valid"
        );

        let structured = ApiError::from_body(500, &json!({ "hint": { "x": 1 } })).unwrap();
        assert_eq!(structured.to_string(), "[500] Unhandled Exception\n---\nHint: {\"x\":1}");

        let numeric = ApiError::from_body(429, &json!({ "hint": 3 })).unwrap();
        assert!(numeric.to_string().ends_with("\nHint: 3"));
    }

    #[test]
    fn test_display_without_diagnostics() {
        let err = ApiError::new(401, None, None);

        assert_eq!(
            err.to_string(),
            "[401] The API credentials provided are not valid.\n---"
        );
    }
}
