//! Endpoint paths, auth scheme constants, and transport defaults.

use std::time::Duration;

/// v3 JWT issuance endpoint. `useBody=true` asks the server to put the token
/// in the response body; legacy servers ignore it and set a cookie instead.
pub const JWT_AUTH_PATH: &str = "/c42api/v3/auth/jwt?useBody=true";

/// v1 legacy auth-token exchange endpoint.
pub const V1_AUTH_PATH: &str = "/api/AuthToken";

/// Login-token endpoint for device-scoped storage locators.
pub const LOGIN_TOKEN_PATH: &str = "/api/LoginToken";

/// Storage-auth-token endpoint for plan-scoped storage locators.
pub const STORAGE_AUTH_TOKEN_PATH: &str = "/api/StorageAuthToken";

/// Authorization scheme prefix for v3 JWT credentials.
pub const V3_TOKEN_SCHEME: &str = "v3_user_token";

/// Authorization scheme prefix for v1 composite tokens.
pub const V1_TOKEN_SCHEME: &str = "token";

/// Authorization scheme prefix for temporary storage login tokens.
pub const LOGIN_TOKEN_SCHEME: &str = "login_token";

/// Cookie some legacy servers require the v3 JWT to be mirrored into.
pub const JWT_COOKIE_NAME: &str = "C42_JWT_API_TOKEN";

/// Connect timeout for HTTP requests.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default total timeout for requests; overridable via the client builder.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Total attempts per logical request. A 401 response consumes the single
/// retry; no other status is retried.
pub const MAX_ATTEMPTS: u32 = 2;

/// Normalize a host address into a base URL.
///
/// Bare hosts get an `https://` prefix; trailing slashes are stripped so
/// paths can be appended verbatim.
pub fn normalize_host(host: &str) -> crate::Result<String> {
    let trimmed = host.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(crate::Error::Config("host address is empty".into()));
    }
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let parsed = url::Url::parse(&with_scheme)
        .map_err(|e| crate::Error::Config(format!("invalid host address '{}': {}", host, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(with_scheme),
        other => Err(crate::Error::Config(format!(
            "unsupported scheme '{}' in host address",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_bare_host() {
        assert_eq!(
            normalize_host("console.cove.example.com").unwrap(),
            "https://console.cove.example.com"
        );
    }

    #[test]
    fn test_normalize_strips_trailing_slash() {
        assert_eq!(
            normalize_host("https://console.cove.example.com/").unwrap(),
            "https://console.cove.example.com"
        );
    }

    #[test]
    fn test_normalize_keeps_http() {
        assert_eq!(
            normalize_host("http://localhost:4200").unwrap(),
            "http://localhost:4200"
        );
    }

    #[test]
    fn test_normalize_rejects_empty_and_bad_scheme() {
        assert!(normalize_host("").is_err());
        assert!(normalize_host("   ").is_err());
        assert!(normalize_host("ftp://example.com").is_err());
    }
}
