//! HTTP connection with the platform's bounded retry protocol.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::Method;
use tracing::{debug, warn};

use crate::auth::RenewableAuth;
use crate::config::MAX_ATTEMPTS;
use crate::error::{Error, Result};

/// A connection to one Cove host (the authority or a storage node).
///
/// Owns the base URL and the renewal adapter; the `reqwest` client is
/// shared across connections so they draw from one socket pool.
///
/// Retry protocol, per logical request:
/// - at most [`MAX_ATTEMPTS`] transport calls;
/// - only a 401 consumes the retry, after invalidating the cached
///   credential - 5xx and other 4xx are terminal;
/// - transport failures (connect, timeout) are wrapped and returned
///   immediately, never retried;
/// - 404 is a valid response handed back to the caller, because several
///   polling-style endpoints use it to mean "no data yet".
pub struct Connection {
    client: reqwest::Client,
    base_url: String,
    auth: Arc<RenewableAuth>,
}

impl Connection {
    pub fn new(client: reqwest::Client, base_url: String, auth: Arc<RenewableAuth>) -> Self {
        Self {
            client,
            base_url,
            auth,
        }
    }

    /// The base URL this connection is bound to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The renewal adapter guarding this connection's credential.
    pub fn auth(&self) -> &RenewableAuth {
        &self.auth
    }

    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        self.request(Method::GET, path, None, None).await
    }

    pub async fn get_with_query(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response> {
        self.request(Method::GET, path, Some(query), None).await
    }

    pub async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response> {
        self.request(Method::POST, path, None, Some(body)).await
    }

    pub async fn put_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response> {
        self.request(Method::PUT, path, None, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<reqwest::Response> {
        self.request(Method::DELETE, path, None, None).await
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, String)]>,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt = 0u32;

        loop {
            let mut headers = HeaderMap::new();
            self.auth.attach(&mut headers).await?;

            let mut request = self.client.request(method.clone(), &url).headers(headers);
            if let Some(query) = query {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!(method = %method, url = url.as_str(), attempt, "Sending request");

            let response = request.send().await.map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout
                } else {
                    Error::Network(e)
                }
            })?;

            let status = response.status().as_u16();

            if status == 401 && attempt + 1 < MAX_ATTEMPTS {
                warn!(url = url.as_str(), "Got 401 - invalidating credential and retrying");
                self.auth.invalidate().await;
                attempt += 1;
                continue;
            }

            // 404 is not an error at this layer; callers distinguish
            // "not found" from transport failure themselves.
            if status >= 400 && status != 404 {
                let retry_after = retry_after(&response);
                let message = response.text().await.unwrap_or_default();
                return Err(Error::from_status(
                    status,
                    method.as_str(),
                    &url,
                    message,
                    retry_after,
                ));
            }

            return Ok(response);
        }
    }
}

fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .finish()
    }
}
