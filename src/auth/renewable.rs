//! Renewal adapter between credential providers and the transport.

use reqwest::header::HeaderMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::provider::{Credential, CredentialProvider};
use crate::error::Result;

/// Credential slot state. Starts empty so the first attach fetches;
/// `invalidated` records that the emptiness came from an explicit
/// `invalidate`, which is what forces providers to re-exchange rather than
/// serve their own cached result.
#[derive(Default)]
struct Slot {
    credential: Option<Credential>,
    invalidated: bool,
}

/// Wraps a [`CredentialProvider`] behind "attach current credential;
/// invalidate on demand".
///
/// Thread-safe: the write lock serializes renewal so that when several
/// tasks observe an empty slot at once, exactly one performs the network
/// fetch and the rest proceed with its result.
pub struct RenewableAuth {
    provider: Box<dyn CredentialProvider>,
    slot: RwLock<Slot>,
}

impl RenewableAuth {
    pub fn new(provider: impl CredentialProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            slot: RwLock::new(Slot::default()),
        }
    }

    /// Start in the valid state with a credential already in hand (e.g. the
    /// one produced while probing login strategies).
    pub fn with_credential(
        provider: impl CredentialProvider + 'static,
        credential: Credential,
    ) -> Self {
        Self {
            provider: Box::new(provider),
            slot: RwLock::new(Slot {
                credential: Some(credential),
                invalidated: false,
            }),
        }
    }

    /// Attach the current credential to `headers`, fetching from the
    /// provider first if the slot is empty.
    pub async fn attach(&self, headers: &mut HeaderMap) -> Result<()> {
        // Fast path: valid credential, shared read access only.
        {
            let slot = self.slot.read().await;
            if let Some(credential) = &slot.credential {
                return credential.apply(headers);
            }
        }

        let mut slot = self.slot.write().await;
        // Double-check: another task may have renewed while we waited.
        if slot.credential.is_none() {
            let force_refresh = slot.invalidated;
            debug!(provider = self.provider.name(), force_refresh, "Fetching credential");
            let credential = self.provider.get_secret_value(force_refresh).await?;
            slot.credential = Some(credential);
            slot.invalidated = false;
        }
        slot.credential
            .as_ref()
            .expect("credential was just stored")
            .apply(headers)
    }

    /// Drop the cached credential; the next attach re-fetches with
    /// `force_refresh = true`.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.write().await;
        slot.credential = None;
        slot.invalidated = true;
        debug!(provider = self.provider.name(), "Credential invalidated");
    }

    /// Whether a credential is currently cached.
    pub async fn is_valid(&self) -> bool {
        self.slot.read().await.credential.is_some()
    }
}

impl std::fmt::Debug for RenewableAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenewableAuth")
            .field("provider", &self.provider.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use reqwest::header::AUTHORIZATION;

    use super::*;

    /// Provider that counts fetches and returns a sequence of secrets.
    struct CountingProvider {
        fetches: Arc<AtomicUsize>,
        secrets: Vec<&'static str>,
        forced: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CredentialProvider for CountingProvider {
        async fn get_secret_value(&self, force_refresh: bool) -> Result<Credential> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst);
            if force_refresh {
                self.forced.fetch_add(1, Ordering::SeqCst);
            }
            let secret = self.secrets[n.min(self.secrets.len() - 1)];
            Ok(Credential::new("token", secret))
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn counting_auth(secrets: Vec<&'static str>) -> (RenewableAuth, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let fetches = Arc::new(AtomicUsize::new(0));
        let forced = Arc::new(AtomicUsize::new(0));
        let auth = RenewableAuth::new(CountingProvider {
            fetches: Arc::clone(&fetches),
            secrets,
            forced: Arc::clone(&forced),
        });
        (auth, fetches, forced)
    }

    #[tokio::test]
    async fn test_credential_fetched_lazily_and_reused() {
        let (auth, fetches, _) = counting_auth(vec!["AAA-BBB"]);
        assert!(!auth.is_valid().await);

        let mut headers = HeaderMap::new();
        auth.attach(&mut headers).await.unwrap();
        auth.attach(&mut headers).await.unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "token AAA-BBB");
    }

    #[tokio::test]
    async fn test_invalidate_forces_refresh_with_new_secret() {
        let (auth, fetches, forced) = counting_auth(vec!["AAA-BBB", "CCC-DDD"]);

        let mut headers = HeaderMap::new();
        auth.attach(&mut headers).await.unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "token AAA-BBB");
        // First fetch fills an empty slot that was never invalidated.
        assert_eq!(forced.load(Ordering::SeqCst), 0);

        auth.invalidate().await;
        assert!(!auth.is_valid().await);

        auth.attach(&mut headers).await.unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "token CCC-DDD");
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
        assert_eq!(forced.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_does_not_affect_other_adapters() {
        let (first, _, _) = counting_auth(vec!["AAA-BBB", "CCC-DDD"]);
        let (second, second_fetches, _) = counting_auth(vec!["EEE-FFF"]);

        let mut headers = HeaderMap::new();
        first.attach(&mut headers).await.unwrap();
        second.attach(&mut headers).await.unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "token EEE-FFF");

        first.invalidate().await;

        // The second adapter still serves its cached credential.
        second.attach(&mut headers).await.unwrap();
        assert!(second.is_valid().await);
        assert_eq!(second_fetches.load(Ordering::SeqCst), 1);
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "token EEE-FFF");
    }

    #[tokio::test]
    async fn test_concurrent_attach_fetches_once() {
        let (auth, fetches, _) = counting_auth(vec!["AAA-BBB"]);
        let auth = Arc::new(auth);

        let mut handles = Vec::new();
        for _ in 0..16 {
            let auth = Arc::clone(&auth);
            handles.push(tokio::spawn(async move {
                let mut headers = HeaderMap::new();
                auth.attach(&mut headers).await.unwrap();
                headers.get(AUTHORIZATION).unwrap().to_str().unwrap().to_string()
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), "token AAA-BBB");
        }
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }
}
