//! Main client entry point.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::auth::{
    BasicAuthProvider, Credential, CredentialProvider, JwtProvider, RenewableAuth, V1TokenProvider,
};
use crate::config::{normalize_host, CONNECT_TIMEOUT, REQUEST_TIMEOUT};
use crate::error::{Error, Result};
use crate::services::{SecurityEventsService, UsersService};
use crate::storage::StorageConnectionManager;
use crate::transport::headers::default_headers;
use crate::transport::Connection;

/// Login strategies probed in order at client construction.
///
/// Each strategy is tried once and yields an explicit success/failure
/// result; the first success selects the authority credential provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStrategy {
    /// v3 JWT issuance (current servers).
    V3Jwt,
    /// v1 legacy token exchange (older servers).
    V1Legacy,
}

impl std::fmt::Display for LoginStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V3Jwt => write!(f, "v3"),
            Self::V1Legacy => write!(f, "v1"),
        }
    }
}

/// Cove platform client.
///
/// Owns the authority connection and the storage-node connection cache;
/// both are constructed per client instance, never shared process-wide.
///
/// # Examples
///
/// ```rust,no_run
/// use cove_sdk::{CoveClient, Result};
///
/// # async fn example() -> Result<()> {
/// let client = CoveClient::builder()
///     .host("console.cove.example.com")
///     .local_account("alice", "s3cret")
///     .build()
///     .await?;
///
/// let users = client.users().get_page(1, 100).await?;
/// println!("{} users", users.total_count);
/// # Ok(())
/// # }
/// ```
pub struct CoveClient {
    authority: Arc<Connection>,
    storage: Arc<StorageConnectionManager>,
}

impl CoveClient {
    /// Create a builder for configuring the client.
    pub fn builder() -> CoveClientBuilder {
        CoveClientBuilder::new()
    }

    /// The authority (control-plane) connection.
    pub fn authority(&self) -> &Connection {
        &self.authority
    }

    /// The storage-node connection manager.
    pub fn storage(&self) -> &StorageConnectionManager {
        &self.storage
    }

    /// User resource on the authority.
    pub fn users(&self) -> UsersService {
        UsersService::new(Arc::clone(&self.authority))
    }

    /// Security-event search across storage destinations.
    pub fn security_events(&self) -> SecurityEventsService {
        SecurityEventsService::new(Arc::clone(&self.storage))
    }
}

impl std::fmt::Debug for CoveClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoveClient")
            .field("authority", &self.authority.base_url())
            .finish()
    }
}

/// Builder for [`CoveClient`].
pub struct CoveClientBuilder {
    host: Option<String>,
    username: Option<String>,
    password: Option<String>,
    proxy: Option<String>,
    timeout: Option<Duration>,
    strategies: Vec<LoginStrategy>,
}

impl CoveClientBuilder {
    pub fn new() -> Self {
        Self {
            host: None,
            username: None,
            password: None,
            proxy: None,
            timeout: None,
            strategies: vec![LoginStrategy::V3Jwt, LoginStrategy::V1Legacy],
        }
    }

    /// Authority host address; a bare host gets an `https://` prefix.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Authenticate with a local account (username/password).
    pub fn local_account(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Authenticate with an API client id/secret pair. The pair is carried
    /// as Basic credentials exactly like a local account.
    pub fn api_client(self, client_id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.local_account(client_id, secret)
    }

    /// Route all requests through an HTTP(S) proxy.
    pub fn proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy = Some(proxy_url.into());
        self
    }

    /// Total per-request timeout (default 60s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the login strategy order.
    pub fn login_strategies(mut self, strategies: Vec<LoginStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Build the client: construct the shared transport, then probe the
    /// login strategies in order until one produces a credential.
    pub async fn build(self) -> Result<CoveClient> {
        let host = self
            .host
            .as_deref()
            .ok_or_else(|| Error::Config("host address is required".into()))?;
        let base_url = normalize_host(host)?;

        let username = self
            .username
            .ok_or_else(|| Error::MissingCredential("username or client id".into()))?;
        let password = self
            .password
            .ok_or_else(|| Error::MissingCredential("password or secret".into()))?;

        let mut client_builder = reqwest::Client::builder()
            .default_headers(default_headers())
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(self.timeout.unwrap_or(REQUEST_TIMEOUT));
        if let Some(proxy_url) = &self.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| Error::Config(format!("invalid proxy '{}': {}", proxy_url, e)))?;
            client_builder = client_builder.proxy(proxy);
        }
        let client = client_builder.build()?;

        if self.strategies.is_empty() {
            return Err(Error::Config("no login strategies configured".into()));
        }

        let basic = BasicAuthProvider::new(&username, &password);
        let basic_header = basic.header_value();

        let auth = probe_strategies(&self.strategies, &client, &base_url, &basic_header).await?;

        let authority = Arc::new(Connection::new(client.clone(), base_url, Arc::new(auth)));
        let storage = Arc::new(StorageConnectionManager::new(
            client,
            Arc::clone(&authority),
        ));

        info!(authority = authority.base_url(), "CoveClient initialized");
        Ok(CoveClient { authority, storage })
    }
}

/// Try each strategy once, recording a result per strategy; the first
/// success wins. Failures are values, not exceptions probed by catching.
async fn probe_strategies(
    strategies: &[LoginStrategy],
    client: &reqwest::Client,
    base_url: &str,
    basic_header: &str,
) -> Result<RenewableAuth> {
    let mut attempts: Vec<String> = Vec::new();

    for strategy in strategies {
        let outcome: Result<(Box<dyn CredentialProvider>, Credential)> = match strategy {
            LoginStrategy::V3Jwt => {
                let provider = JwtProvider::new(
                    client.clone(),
                    base_url.to_string(),
                    basic_header.to_string(),
                );
                match provider.get_secret_value(false).await {
                    Ok(credential) => Ok((Box::new(provider), credential)),
                    Err(e) => Err(e),
                }
            }
            LoginStrategy::V1Legacy => {
                let provider = V1TokenProvider::new(
                    client.clone(),
                    base_url.to_string(),
                    basic_header.to_string(),
                );
                match provider.get_secret_value(false).await {
                    Ok(credential) => Ok((Box::new(provider), credential)),
                    Err(e) => Err(e),
                }
            }
        };

        match outcome {
            Ok((provider, credential)) => {
                info!(strategy = %strategy, "Login strategy selected");
                return Ok(RenewableAuth::with_credential(provider, credential));
            }
            Err(e) => {
                warn!(strategy = %strategy, "Login strategy failed");
                attempts.push(format!("{}: {}", strategy, e));
            }
        }
    }

    Err(Error::LoginFailed { attempts })
}

impl Default for CoveClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_requires_host() {
        let err = CoveClient::builder()
            .local_account("alice", "pw")
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_build_requires_credentials() {
        let err = CoveClient::builder()
            .host("console.cove.example.com")
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingCredential(_)));
    }

    #[tokio::test]
    async fn test_build_rejects_invalid_proxy() {
        let err = CoveClient::builder()
            .host("console.cove.example.com")
            .local_account("alice", "pw")
            .proxy("not a proxy url")
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
