//! Basic (username/password) credentials.

use async_trait::async_trait;
use base64::Engine;

use super::provider::{Credential, CredentialProvider};
use crate::error::Result;

/// Precomputed `Basic` credential.
///
/// The base64 value is computed once at construction; `force_refresh` is a
/// no-op because there is nothing to re-exchange.
pub struct BasicAuthProvider {
    encoded: String,
}

impl BasicAuthProvider {
    pub fn new(username: &str, password: &str) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", username, password));
        Self { encoded }
    }

    /// The raw base64 payload, used by the exchange providers that perform
    /// their authority calls under Basic auth.
    pub fn header_value(&self) -> String {
        format!("Basic {}", self.encoded)
    }
}

#[async_trait]
impl CredentialProvider for BasicAuthProvider {
    async fn get_secret_value(&self, _force_refresh: bool) -> Result<Credential> {
        Ok(Credential::new("Basic", &self.encoded))
    }

    fn name(&self) -> &str {
        "basic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_basic_credential_is_precomputed_base64() {
        let provider = BasicAuthProvider::new("alice", "s3cret");
        let cred = provider.get_secret_value(false).await.unwrap();
        // base64("alice:s3cret")
        assert_eq!(cred.authorization(), "Basic YWxpY2U6czNjcmV0");
    }

    #[tokio::test]
    async fn test_force_refresh_is_noop() {
        let provider = BasicAuthProvider::new("alice", "s3cret");
        let first = provider.get_secret_value(false).await.unwrap();
        let second = provider.get_secret_value(true).await.unwrap();
        assert_eq!(first, second);
    }
}
