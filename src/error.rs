//! Error types for the Cove SDK.

use std::time::Duration;

/// Convenience result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the Cove SDK.
///
/// HTTP failures are split by status class so callers can match on the
/// condition they care about (`Unauthorized` is only surfaced after the
/// single 401 retry is exhausted). The transport itself never produces
/// `NotFound` - a 404 response is handed back to the caller as a normal
/// response, and only service-level code that requires the resource to
/// exist converts it into this variant.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// 400 Bad Request.
    #[error("HTTP 400 for {method} {url}: {message}")]
    BadRequest {
        method: String,
        url: String,
        message: String,
    },

    /// 401 Unauthorized, after the credential-refresh retry was spent.
    #[error("HTTP 401 for {method} {url}: {message}")]
    Unauthorized {
        method: String,
        url: String,
        message: String,
    },

    /// 403 Forbidden.
    #[error("HTTP 403 for {method} {url}: {message}")]
    Forbidden {
        method: String,
        url: String,
        message: String,
    },

    /// 404 Not Found, raised only by callers that require the resource.
    #[error("resource not found at {method} {url}")]
    NotFound { method: String, url: String },

    /// 409 Conflict.
    #[error("HTTP 409 for {method} {url}: {message}")]
    Conflict {
        method: String,
        url: String,
        message: String,
    },

    /// 429 Too Many Requests.
    #[error("HTTP 429 for {method} {url}: {message}")]
    TooManyRequests {
        method: String,
        url: String,
        message: String,
        retry_after: Option<Duration>,
    },

    /// Any 5xx response.
    #[error("HTTP {status} for {method} {url}: {message}")]
    InternalServer {
        status: u16,
        method: String,
        url: String,
        message: String,
    },

    /// Catch-all for error statuses without a dedicated variant.
    #[error("HTTP {status} for {method} {url}: {message}")]
    Api {
        status: u16,
        method: String,
        url: String,
        message: String,
    },

    /// Transport-level failure (connection reset, DNS, TLS, ...).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Transport-level timeout.
    #[error("request timed out")]
    Timeout,

    /// A credential provider failed to produce a secret.
    #[error("credential exchange failed via {endpoint}: {message}")]
    CredentialExchange { endpoint: String, message: String },

    /// Storage-node session initialization (locator resolution) failed.
    #[error("failed to initialize storage session: {message}")]
    SessionInit { message: String },

    /// Every login strategy failed; `attempts` lists each strategy outcome.
    #[error("all login strategies failed: {}", attempts.join("; "))]
    LoginFailed { attempts: Vec<String> },

    /// A required credential field was absent.
    #[error("missing credential: {0}")]
    MissingCredential(String),

    /// Invalid SDK configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Map a terminal HTTP error status onto the taxonomy.
    ///
    /// Callers must not pass success statuses or 404 - those are valid
    /// responses at the transport layer.
    pub(crate) fn from_status(
        status: u16,
        method: &str,
        url: &str,
        message: String,
        retry_after: Option<Duration>,
    ) -> Self {
        let method = method.to_string();
        let url = url.to_string();
        match status {
            400 => Error::BadRequest {
                method,
                url,
                message,
            },
            401 => Error::Unauthorized {
                method,
                url,
                message,
            },
            403 => Error::Forbidden {
                method,
                url,
                message,
            },
            409 => Error::Conflict {
                method,
                url,
                message,
            },
            429 => Error::TooManyRequests {
                method,
                url,
                message,
                retry_after,
            },
            500..=599 => Error::InternalServer {
                status,
                method,
                url,
                message,
            },
            _ => Error::Api {
                status,
                method,
                url,
                message,
            },
        }
    }

    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::BadRequest { .. } => Some(400),
            Error::Unauthorized { .. } => Some(401),
            Error::Forbidden { .. } => Some(403),
            Error::NotFound { .. } => Some(404),
            Error::Conflict { .. } => Some(409),
            Error::TooManyRequests { .. } => Some(429),
            Error::InternalServer { status, .. } | Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_mapping() {
        let cases: &[(u16, Option<u16>)] = &[
            (400, Some(400)),
            (401, Some(401)),
            (403, Some(403)),
            (409, Some(409)),
            (429, Some(429)),
            (500, Some(500)),
            (503, Some(503)),
            (418, Some(418)),
        ];
        for (status, expected) in cases {
            let err = Error::from_status(*status, "GET", "https://c.example.com/api", String::new(), None);
            assert_eq!(err.status(), *expected, "status {}", status);
        }
    }

    #[test]
    fn test_catch_all_for_unmapped_status() {
        let err = Error::from_status(418, "GET", "https://c.example.com/api", "teapot".into(), None);
        assert!(matches!(err, Error::Api { status: 418, .. }));
    }

    #[test]
    fn test_error_message_includes_context() {
        let err = Error::from_status(403, "POST", "https://c.example.com/api/User", "denied".into(), None);
        let text = err.to_string();
        assert!(text.contains("403"));
        assert!(text.contains("POST"));
        assert!(text.contains("/api/User"));
    }
}
