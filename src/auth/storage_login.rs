//! Temporary storage-login credentials.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::provider::{Credential, CredentialProvider};
use crate::config::LOGIN_TOKEN_SCHEME;
use crate::error::Result;
use crate::storage::{resolve, StorageLocator, StorageLoginInfo};
use crate::transport::Connection;

/// Credential provider for storage-node connections.
///
/// Exchanges the locator at the authority for login info (server URL plus a
/// temporary token) and caches the full response; subsequent fetches serve
/// the cached token until `force_refresh` demands a re-exchange, which is
/// what the renewal adapter does after a storage node rejects the token
/// with a 401.
pub struct StorageLoginProvider {
    authority: Arc<Connection>,
    locator: StorageLocator,
    cached: Mutex<Option<StorageLoginInfo>>,
}

impl StorageLoginProvider {
    pub fn new(authority: Arc<Connection>, locator: StorageLocator) -> Self {
        Self {
            authority,
            locator,
            cached: Mutex::new(None),
        }
    }

    /// Seed the cache with a resolution result already in hand, so the
    /// first storage request does not repeat the authority round-trip.
    pub fn preseeded(
        authority: Arc<Connection>,
        locator: StorageLocator,
        info: StorageLoginInfo,
    ) -> Self {
        Self {
            authority,
            locator,
            cached: Mutex::new(Some(info)),
        }
    }

    /// Current login info, exchanging at the authority when absent or when
    /// `force_refresh` is set.
    pub async fn login_info(&self, force_refresh: bool) -> Result<StorageLoginInfo> {
        let mut cached = self.cached.lock().await;
        if force_refresh || cached.is_none() {
            debug!(locator = %self.locator, force_refresh, "Exchanging storage login token");
            *cached = Some(resolve(&self.authority, &self.locator).await?);
        }
        Ok(cached.as_ref().expect("login info was just stored").clone())
    }
}

#[async_trait]
impl CredentialProvider for StorageLoginProvider {
    async fn get_secret_value(&self, force_refresh: bool) -> Result<Credential> {
        let info = self.login_info(force_refresh).await?;
        Ok(Credential::new(LOGIN_TOKEN_SCHEME, &info.login_token))
    }

    fn name(&self) -> &str {
        "storage_login"
    }
}
