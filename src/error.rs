//! Error types for the social client
//!
//! Network-related failures (transport, non-2xx status, malformed responses)
//! all surface as [`ServiceError`]. Contract errors made by the caller
//! (reading a field with the wrong type, invoking an action a resource does
//! not offer) are raised directly as their own [`Error`] variants.

use thiserror::Error;

use crate::service::Operation;

/// Failure while turning JSON text into records or back
#[derive(Debug, Error)]
pub enum CodecError {
    /// The document is not well-formed JSON of the expected shape
    #[error("malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A record could not be serialized
    #[error("failed to encode {record}: {source}")]
    Encode {
        record: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Why a remote call failed
#[derive(Debug, Error)]
pub enum ServiceErrorKind {
    /// The server answered 404
    #[error("resource not found (HTTP 404)")]
    NotFound { body: Option<String> },

    /// The server answered with any other non-2xx status
    #[error("request failed with HTTP {status}")]
    Status { status: u16, body: Option<String> },

    /// Sending the request or reading the response failed
    #[error("transport failure: {0}")]
    Transport(#[source] reqwest::Error),

    /// The response body could not be decoded
    #[error("malformed response: {0}")]
    Parse(#[source] CodecError),

    /// A request URL could not be built from the configured server root
    #[error("invalid request URL: {0}")]
    InvalidUrl(#[source] url::ParseError),

    /// An id cannot be placed in a URL path without changing its meaning
    #[error("invalid path segment `{0}`")]
    InvalidSegment(String),

    /// The response was well-formed but did not say what was expected
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

/// A failed remote operation, tagged with the service that issued it
#[derive(Debug, Error)]
#[error("{service}: {kind}")]
pub struct ServiceError {
    pub service: &'static str,
    #[source]
    pub kind: ServiceErrorKind,
}

impl ServiceError {
    pub fn new(service: &'static str, kind: ServiceErrorKind) -> Self {
        Self { service, kind }
    }

    pub fn transport(service: &'static str, err: reqwest::Error) -> Self {
        Self::new(service, ServiceErrorKind::Transport(err))
    }

    pub fn parse(service: &'static str, err: CodecError) -> Self {
        Self::new(service, ServiceErrorKind::Parse(err))
    }

    pub fn invalid_response(service: &'static str, message: impl Into<String>) -> Self {
        Self::new(service, ServiceErrorKind::InvalidResponse(message.into()))
    }

    /// HTTP status code, when the failure came from a server response
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ServiceErrorKind::NotFound { .. } => Some(404),
            ServiceErrorKind::Status { status, .. } => Some(*status),
            ServiceErrorKind::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Response body returned alongside a failure status
    pub fn body(&self) -> Option<&str> {
        match &self.kind {
            ServiceErrorKind::NotFound { body } | ServiceErrorKind::Status { body, .. } => {
                body.as_deref()
            }
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, ServiceErrorKind::NotFound { .. })
    }
}

/// Top-level error returned by every public operation
#[derive(Debug, Error)]
pub enum Error {
    /// Remote call failed (transport, status or malformed payload)
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// A typed accessor found a value of an incompatible kind
    #[error("field `{field}` holds {found}, expected {expected}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// The remote API does not offer this operation for the resource
    #[error("{resource}: {operation} is not supported")]
    UnsupportedOperation {
        resource: &'static str,
        operation: Operation,
    },

    /// A field needed to address the remote resource is not set
    #[error("{resource}: missing required field `{field}`")]
    MissingField {
        resource: &'static str,
        field: &'static str,
    },
}

impl Error {
    pub fn type_mismatch(field: &'static str, expected: &'static str, found: &'static str) -> Self {
        Error::TypeMismatch {
            field,
            expected,
            found,
        }
    }

    pub fn unsupported(resource: &'static str, operation: Operation) -> Self {
        Error::UnsupportedOperation {
            resource,
            operation,
        }
    }

    pub fn missing_field(resource: &'static str, field: &'static str) -> Self {
        Error::MissingField { resource, field }
    }

    /// The wrapped service error, if this is a remote failure
    pub fn as_service(&self) -> Option<&ServiceError> {
        match self {
            Error::Service(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.as_service().is_some_and(ServiceError::is_not_found)
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::UnsupportedOperation { .. })
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_accessors() {
        let err = ServiceError::new(
            "activity",
            ServiceErrorKind::NotFound {
                body: Some("{\"error\":\"not found\"}".to_string()),
            },
        );
        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
        assert_eq!(err.body(), Some("{\"error\":\"not found\"}"));

        let err = ServiceError::new(
            "activity",
            ServiceErrorKind::Status {
                status: 403,
                body: None,
            },
        );
        assert_eq!(err.status(), Some(403));
        assert!(!err.is_not_found());
        assert_eq!(err.body(), None);
    }

    #[test]
    fn test_display_includes_service_name() {
        let err: Error = ServiceError::invalid_response("activity", "like flag missing").into();
        assert_eq!(err.to_string(), "activity: unexpected response: like flag missing");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_unsupported_display() {
        let err = Error::unsupported("activity", Operation::Update);
        assert!(err.is_unsupported());
        assert_eq!(err.to_string(), "activity: update is not supported");
    }
}
