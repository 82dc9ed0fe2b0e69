//! Error types for the RFI client.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing credentials, bad base URL, unparsable date.
    #[error("configuration error: {0}")]
    Config(String),

    /// A request argument was rejected before anything was sent.
    #[error("invalid argument: {0}")]
    Validation(String),

    /// Token exchange failed, or the API still answered 401 after a refresh.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Any other non-2xx answer from the API.
    #[error("API error {status}: {message}")]
    Api {
        status: u16,
        message: String,
        body: Option<serde_json::Value>,
    },

    #[error("connection error: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Coarse classification of an [`Error::Api`] by status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    BadRequest,
    PermissionDenied,
    NotFound,
    Conflict,
    RateLimited,
    ServerError,
    Other,
}

impl ApiErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ApiErrorKind::BadRequest,
            403 => ApiErrorKind::PermissionDenied,
            404 => ApiErrorKind::NotFound,
            409 => ApiErrorKind::Conflict,
            429 => ApiErrorKind::RateLimited,
            s if s >= 500 => ApiErrorKind::ServerError,
            _ => ApiErrorKind::Other,
        }
    }
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Status code carried by the error, if it came from an HTTP answer.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Connection(e) | Error::Timeout(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// `None` for anything that is not an [`Error::Api`].
    pub fn kind(&self) -> Option<ApiErrorKind> {
        match self {
            Error::Api { status, .. } => Some(ApiErrorKind::from_status(*status)),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == Some(ApiErrorKind::NotFound)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout(err)
        } else {
            Error::Connection(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_status_code() {
        assert_eq!(ApiErrorKind::from_status(400), ApiErrorKind::BadRequest);
        assert_eq!(ApiErrorKind::from_status(403), ApiErrorKind::PermissionDenied);
        assert_eq!(ApiErrorKind::from_status(404), ApiErrorKind::NotFound);
        assert_eq!(ApiErrorKind::from_status(409), ApiErrorKind::Conflict);
        assert_eq!(ApiErrorKind::from_status(429), ApiErrorKind::RateLimited);
        assert_eq!(ApiErrorKind::from_status(500), ApiErrorKind::ServerError);
        assert_eq!(ApiErrorKind::from_status(503), ApiErrorKind::ServerError);
        assert_eq!(ApiErrorKind::from_status(418), ApiErrorKind::Other);
    }

    #[test]
    fn api_error_exposes_status() {
        let err = Error::Api {
            status: 404,
            message: "Question not found".into(),
            body: None,
        };
        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "API error 404: Question not found");
    }

    #[test]
    fn non_api_errors_have_no_kind() {
        let err = Error::validation("question_id must be non-zero");
        assert_eq!(err.kind(), None);
        assert_eq!(err.status(), None);
        assert!(!err.is_not_found());
    }

    #[test]
    fn decode_error_converts_from_serde() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{nope");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Decode(_)));
    }
}
