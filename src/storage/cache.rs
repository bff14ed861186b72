//! Per-storage-node connection cache.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::auth::{RenewableAuth, StorageLoginProvider};
use crate::error::Result;
use crate::storage::locator::{resolve, StorageLocator};
use crate::transport::Connection;

/// Resolves locators to storage-node connections and caches them by URL.
///
/// Entries are keyed by the lower-cased resolved server URL, created once
/// under a write lock (check-then-create), never mutated afterwards, and
/// never evicted for the process lifetime. Owned by the client instance;
/// there are no process-wide singletons.
pub struct StorageConnectionManager {
    client: reqwest::Client,
    authority: Arc<Connection>,
    cache: RwLock<HashMap<String, Arc<Connection>>>,
}

impl StorageConnectionManager {
    pub fn new(client: reqwest::Client, authority: Arc<Connection>) -> Self {
        Self {
            client,
            authority,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve `locator` at the authority and return the connection for the
    /// resulting storage node, creating and caching it on first sight.
    ///
    /// Resolution failures surface as [`crate::Error::SessionInit`]; trying
    /// the next destination candidate on failure is the caller's policy.
    pub async fn resolve_and_get(&self, locator: &StorageLocator) -> Result<Arc<Connection>> {
        let login = resolve(&self.authority, locator).await?;
        let key = cache_key(&login.server_url);

        {
            let cache = self.cache.read().await;
            if let Some(connection) = cache.get(&key) {
                return Ok(Arc::clone(connection));
            }
        }

        let mut cache = self.cache.write().await;
        // Double-check: another task may have created this connection while
        // we waited for the write lock.
        if let Some(connection) = cache.get(&key) {
            return Ok(Arc::clone(connection));
        }

        let base_url = login.server_url.trim_end_matches('/').to_string();
        let provider =
            StorageLoginProvider::preseeded(Arc::clone(&self.authority), locator.clone(), login);
        let connection = Arc::new(Connection::new(
            self.client.clone(),
            base_url,
            Arc::new(RenewableAuth::new(provider)),
        ));

        info!(url = connection.base_url(), "Storage-node session created");
        cache.insert(key, Arc::clone(&connection));
        Ok(connection)
    }

    /// Pure cache lookup by server URL; never triggers resolution.
    pub async fn get_if_cached(&self, url: &str) -> Option<Arc<Connection>> {
        self.cache.read().await.get(&cache_key(url)).cloned()
    }

    /// Number of cached storage-node connections.
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }
}

fn cache_key(url: &str) -> String {
    url.trim_end_matches('/').to_lowercase()
}

impl std::fmt::Debug for StorageConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConnectionManager")
            .field("authority", &self.authority.base_url())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_case_insensitive() {
        assert_eq!(
            cache_key("https://Node-1.Cove.Example.com"),
            cache_key("https://node-1.cove.example.com")
        );
    }

    #[test]
    fn test_cache_key_ignores_trailing_slash() {
        assert_eq!(
            cache_key("https://node-1.cove.example.com/"),
            cache_key("https://node-1.cove.example.com")
        );
    }
}
