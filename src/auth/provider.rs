//! The credential provider seam and the credential value type.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, COOKIE};

use crate::error::{Error, Result};

/// A bearer-style credential ready to attach to an outgoing request.
///
/// Holds the full `Authorization` header value (scheme prefix included) and,
/// for v3 JWTs, the cookie legacy servers expect the token mirrored into.
/// Credentials live only in memory: created lazily on first use, dropped on
/// invalidation, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    authorization: String,
    cookie: Option<(&'static str, String)>,
}

impl Credential {
    /// Build a credential from a scheme prefix and secret.
    pub fn new(scheme: &str, secret: &str) -> Self {
        Self {
            authorization: format!("{} {}", scheme, secret),
            cookie: None,
        }
    }

    /// Additionally mirror the secret into a named cookie.
    pub fn with_cookie(mut self, name: &'static str, value: String) -> Self {
        self.cookie = Some((name, value));
        self
    }

    /// The full `Authorization` header value.
    pub fn authorization(&self) -> &str {
        &self.authorization
    }

    /// Write the credential into a request header map.
    pub fn apply(&self, headers: &mut HeaderMap) -> Result<()> {
        let value = HeaderValue::from_str(&self.authorization)
            .map_err(|_| Error::MissingCredential("credential is not header-safe".into()))?;
        headers.insert(AUTHORIZATION, value);

        if let Some((name, token)) = &self.cookie {
            let cookie = HeaderValue::from_str(&format!("{}={}", name, token))
                .map_err(|_| Error::MissingCredential("credential is not cookie-safe".into()))?;
            headers.insert(COOKIE, cookie);
        }
        Ok(())
    }
}

/// Produces a credential on demand.
///
/// `force_refresh` tells providers that hold an exchange result (the
/// temporary storage-login provider) to discard it and re-exchange; the
/// stateless providers ignore the flag.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn get_secret_value(&self, force_refresh: bool) -> Result<Credential>;

    /// Name of this provider, used in login diagnostics.
    fn name(&self) -> &str {
        "unknown"
    }
}

/// Blanket impl for `Arc<T>`.
#[async_trait]
impl<T: CredentialProvider + ?Sized> CredentialProvider for std::sync::Arc<T> {
    async fn get_secret_value(&self, force_refresh: bool) -> Result<Credential> {
        (**self).get_secret_value(force_refresh).await
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Blanket impl for `Box<T>`.
#[async_trait]
impl<T: CredentialProvider + ?Sized> CredentialProvider for Box<T> {
    async fn get_secret_value(&self, force_refresh: bool) -> Result<Credential> {
        (**self).get_secret_value(force_refresh).await
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_value() {
        let cred = Credential::new("v3_user_token", "abc.def.ghi");
        assert_eq!(cred.authorization(), "v3_user_token abc.def.ghi");
    }

    #[test]
    fn test_apply_sets_header_and_cookie() {
        let cred = Credential::new("v3_user_token", "abc").with_cookie("C42_JWT_API_TOKEN", "abc".into());
        let mut headers = HeaderMap::new();
        cred.apply(&mut headers).unwrap();

        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "v3_user_token abc");
        assert_eq!(headers.get(COOKIE).unwrap(), "C42_JWT_API_TOKEN=abc");
    }

    #[test]
    fn test_apply_without_cookie_leaves_cookie_unset() {
        let cred = Credential::new("token", "AAA-BBB");
        let mut headers = HeaderMap::new();
        cred.apply(&mut headers).unwrap();

        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "token AAA-BBB");
        assert!(headers.get(COOKIE).is_none());
    }

    #[test]
    fn test_apply_rejects_non_header_safe_secret() {
        let cred = Credential::new("token", "bad\nvalue");
        let mut headers = HeaderMap::new();
        assert!(cred.apply(&mut headers).is_err());
    }
}
