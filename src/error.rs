//! Error type shared by the clients, the configuration loader and the runner.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Structured error carried by a non-2xx Upbit response body:
/// `{"error": {"name": ..., "message": ...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorPayload {
    /// Machine-readable error name, e.g. `invalid_query_payload`.
    pub name: String,
    /// Human-readable message.
    pub message: String,
}

/// Every failure the pipeline can surface.
///
/// Fetch errors abort a run; nothing here is retried.
#[derive(Debug, Error)]
pub enum Error {
    /// The request never produced a response (DNS, connect, timeout, TLS).
    #[error("network error calling {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} from {url}: {}", describe_http(.payload.as_ref(), .body.as_deref()))]
    Http {
        status: u16,
        payload: Option<ApiErrorPayload>,
        body: Option<String>,
        url: String,
    },

    /// The body was not JSON or did not match the expected shape.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Client-side misuse, e.g. missing credentials or an invalid order body.
    #[error("usage error: {0}")]
    Usage(String),

    /// Configuration values that parse but make no sense.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Configuration file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration document is not valid YAML for [`AppConfig`](crate::AppConfig).
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A value could not be serialized, e.g. an event payload.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The request could not be signed.
    #[error("failed to sign request: {0}")]
    Signing(String),
}

impl Error {
    pub(crate) fn network(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            url: url.into(),
            source: Box::new(source),
        }
    }

    /// HTTP status for [`Error::Http`], `None` otherwise.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn describe_http(payload: Option<&ApiErrorPayload>, body: Option<&str>) -> String {
    match (payload, body) {
        (Some(p), _) => format!("{}: {}", p.name, p.message),
        (None, Some(body)) if !body.is_empty() => body.to_owned(),
        _ => "HTTP error".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_prefers_structured_payload() {
        let err = Error::Http {
            status: 401,
            payload: Some(ApiErrorPayload {
                name: "jwt_verification".into(),
                message: "Failed to verify Jwt token.".into(),
            }),
            body: Some("{...}".into()),
            url: "https://api.upbit.com/v1/accounts".into(),
        };

        assert_eq!(
            err.to_string(),
            "HTTP 401 from https://api.upbit.com/v1/accounts: jwt_verification: Failed to verify Jwt token."
        );
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn http_error_falls_back_to_body_then_generic() {
        let with_body = Error::Http {
            status: 502,
            payload: None,
            body: Some("Bad Gateway".into()),
            url: "u".into(),
        };
        let empty = Error::Http {
            status: 500,
            payload: None,
            body: Some(String::new()),
            url: "u".into(),
        };

        assert_eq!(with_body.to_string(), "HTTP 502 from u: Bad Gateway");
        assert_eq!(empty.to_string(), "HTTP 500 from u: HTTP error");
    }

    #[test]
    fn non_http_errors_have_no_status() {
        assert_eq!(Error::Usage("x".into()).status(), None);
    }
}
