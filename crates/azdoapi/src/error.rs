//! Error types for Azure DevOps REST operations.
//!
//! Errors are categorized to drive retry and propagation policy. The server
//! reports structured failures as a JSON payload carrying a `typeKey` and an
//! error-code prefix in the message (for example `TF401349`); the two known
//! eventual-consistency markers are classified as transient.

use declarative::ContextError;
use thiserror::Error;

/// The `TF` code the server emits for eventual-consistency failures after
/// structural edits to work-item processes.
pub const UNEXPECTED_EXCEPTION_CODE: &str = "TF401349";

/// The `VS` code emitted while a freshly installed contribution is still
/// propagating.
pub const CONTRIBUTION_MISSING_CODE: &str = "VS403120";

/// Categories of remote errors for retry and propagation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Entity absent (HTTP 404 or a "does not exist" payload)
    NotFound,
    /// Inherited/custom variant mismatch detected before a write
    WrongVariant,
    /// Known eventual-consistency marker, worth retrying
    Transient,
    /// Context cancellation or deadline expiry
    Canceled,
    /// Everything else
    Other,
}

impl ErrorCategory {
    /// Whether this category is transient and worth retrying by default.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient)
    }
}

/// Errors from the Azure DevOps REST surface.
#[derive(Debug, Error)]
pub enum Error {
    /// Entity not found (HTTP 404 or equivalent payload)
    #[error("not found: {message}")]
    NotFound {
        /// What was missing, including the remote message when available
        message: String,
    },

    /// The addressed node is the other customization variant
    #[error("{resource} is {actual}; this resource manages the {expected} variant")]
    WrongVariant {
        /// Description of the addressed node
        resource: String,
        /// Variant this resource manages ("inherited" or "custom")
        expected: &'static str,
        /// Variant the server reported
        actual: &'static str,
    },

    /// Structured API failure returned by the server
    #[error("azure devops api error (HTTP {status}): {message}")]
    Api {
        status: u16,
        /// Server `typeKey`, e.g. `UnexpectedException`
        type_key: Option<String>,
        /// Remote message verbatim
        message: String,
    },

    /// Transport-level failure
    #[error("http error: {message}")]
    Http {
        message: String,
        status: Option<u16>,
    },

    /// Malformed request or response body
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The operation context was canceled or timed out
    #[error(transparent)]
    Interrupted(#[from] ContextError),

    /// Error annotated with the operation being performed
    #[error("{operation}: {source}")]
    Op {
        operation: String,
        #[source]
        source: Box<Error>,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build an error from a non-success REST response body.
    ///
    /// The server payload shape is `{"message": ..., "typeKey": ...}`; bodies
    /// that are not JSON are carried verbatim.
    pub fn from_response(status: u16, body: &str) -> Self {
        #[derive(serde::Deserialize)]
        struct Payload {
            message: Option<String>,
            #[serde(rename = "typeKey")]
            type_key: Option<String>,
        }

        let payload: Option<Payload> = serde_json::from_str(body).ok();
        let (message, type_key) = match payload {
            Some(p) => (p.message.unwrap_or_else(|| body.to_string()), p.type_key),
            None => (body.to_string(), None),
        };

        if status == 404 {
            return Self::NotFound { message };
        }
        Self::Api {
            status,
            type_key,
            message,
        }
    }

    /// Annotate this error with the operation being performed
    /// (`"creating control"`, `"deleting group x"`, ...).
    pub fn while_doing(self, operation: impl Into<String>) -> Self {
        Self::Op {
            operation: operation.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, unwrapping operation annotations.
    pub fn root(&self) -> &Self {
        match self {
            Self::Op { source, .. } => source.root(),
            other => other,
        }
    }

    /// HTTP status when one is known.
    pub fn status(&self) -> Option<u16> {
        match self.root() {
            Self::Api { status, .. } => Some(*status),
            Self::Http { status, .. } => *status,
            Self::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// Whether the remote entity was absent.
    ///
    /// Covers HTTP 404 and the "does not exist" message some endpoints
    /// return with a 400-level status instead.
    pub fn is_not_found(&self) -> bool {
        match self.root() {
            Self::NotFound { .. } => true,
            Self::Api { message, .. } => message.contains("does not exist"),
            _ => false,
        }
    }

    fn message_has_code(&self, code: &str) -> bool {
        match self.root() {
            Self::Api {
                message, type_key, ..
            } => {
                message.contains(code)
                    || type_key
                        .as_deref()
                        .is_some_and(|k| k.eq_ignore_ascii_case("UnexpectedException"))
                        && code == UNEXPECTED_EXCEPTION_CODE
            }
            _ => false,
        }
    }

    /// Whether this is the post-edit eventual-consistency failure.
    pub fn is_unexpected_exception(&self) -> bool {
        self.message_has_code(UNEXPECTED_EXCEPTION_CODE)
    }

    /// Whether this is the contribution-still-propagating failure.
    pub fn is_contribution_missing(&self) -> bool {
        self.message_has_code(CONTRIBUTION_MISSING_CODE)
    }

    /// Get the error category for retry and propagation policy.
    pub fn category(&self) -> ErrorCategory {
        match self.root() {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::WrongVariant { .. } => ErrorCategory::WrongVariant,
            Self::Interrupted(_) => ErrorCategory::Canceled,
            _ if self.is_not_found() => ErrorCategory::NotFound,
            _ if self.is_unexpected_exception() || self.is_contribution_missing() => {
                ErrorCategory::Transient
            }
            _ => ErrorCategory::Other,
        }
    }

    /// Whether this error is transient and worth retrying by default.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Http {
                message: format!("HTTP {code}"),
                status: Some(code),
            },
            other => Self::Http {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

/// Result type for Azure DevOps REST operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_response_maps_404_to_not_found() {
        let err = Error::from_response(404, r#"{"message":"Page page-x does not exist"}"#);
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(!err.is_retryable());
    }

    #[test]
    fn does_not_exist_message_counts_as_not_found() {
        let err = Error::from_response(400, r#"{"message":"Check 42 does not exist."}"#);
        assert!(err.is_not_found());
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn tf401349_is_transient() {
        let err = Error::from_response(
            500,
            r#"{"message":"TF401349: An unexpected error has occurred","typeKey":"UnexpectedException"}"#,
        );
        assert!(err.is_unexpected_exception());
        assert_eq!(err.category(), ErrorCategory::Transient);
        assert!(err.is_retryable());
    }

    #[test]
    fn vs403120_is_transient() {
        let err = Error::from_response(
            404,
            r#"{"message":"VS403120: The contribution abc could not be found"}"#,
        );
        // 404 wins the NotFound mapping; code detection still works on Api
        // payloads surfaced with non-404 statuses.
        assert!(err.is_not_found());

        let err = Error::from_response(400, r#"{"message":"VS403120: contribution missing"}"#);
        assert!(err.is_contribution_missing());
        assert!(err.is_retryable());
    }

    #[test]
    fn operation_annotation_preserves_category() {
        let err = Error::from_response(404, "{}").while_doing("reading control");
        assert!(err.to_string().starts_with("reading control:"));
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn wrong_variant_is_not_retryable() {
        let err = Error::WrongVariant {
            resource: "page page-1".to_string(),
            expected: "inherited",
            actual: "custom",
        };
        assert_eq!(err.category(), ErrorCategory::WrongVariant);
        assert!(!err.is_retryable());
    }
}
