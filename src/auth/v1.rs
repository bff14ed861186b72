//! v1 legacy auth-token exchange.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::provider::{Credential, CredentialProvider};
use crate::config::{V1_AUTH_PATH, V1_TOKEN_SCHEME};
use crate::error::{Error, Result};

/// Response from the v1 auth-token endpoint: a two-element token array
/// inside the platform's `data` envelope.
#[derive(Debug, Deserialize)]
struct V1TokenResponse {
    #[serde(default)]
    data: Vec<String>,
}

/// Exchange Basic credentials for a v1 composite token.
///
/// POST `/api/AuthToken` under Basic auth. The two returned elements joined
/// by a hyphen form the secret for `Authorization: token <a>-<b>`.
pub async fn exchange_v1_token(
    client: &reqwest::Client,
    base_url: &str,
    basic_header: &str,
) -> Result<String> {
    let url = format!("{}{}", base_url, V1_AUTH_PATH);
    info!("Exchanging credentials for v1 token");

    let response = client
        .post(&url)
        .header(reqwest::header::AUTHORIZATION, basic_header)
        .send()
        .await
        .map_err(|e| Error::CredentialExchange {
            endpoint: url.clone(),
            message: format!("v1 token request failed: {}", e),
        })?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::CredentialExchange {
            endpoint: url,
            message: format!("v1 token endpoint returned {}: {}", status, body),
        });
    }

    let data: V1TokenResponse = response.json().await.map_err(|e| Error::CredentialExchange {
        endpoint: url.clone(),
        message: format!("failed to parse v1 token response: {}", e),
    })?;

    if data.data.len() < 2 {
        return Err(Error::CredentialExchange {
            endpoint: url,
            message: format!("expected a two-element token array, got {} elements", data.data.len()),
        });
    }

    debug!("v1 token exchange complete");
    Ok(format!("{}-{}", data.data[0], data.data[1]))
}

/// v1 legacy credential provider.
pub struct V1TokenProvider {
    client: reqwest::Client,
    base_url: String,
    basic_header: String,
}

impl V1TokenProvider {
    pub fn new(client: reqwest::Client, base_url: String, basic_header: String) -> Self {
        Self {
            client,
            base_url,
            basic_header,
        }
    }
}

#[async_trait]
impl CredentialProvider for V1TokenProvider {
    async fn get_secret_value(&self, _force_refresh: bool) -> Result<Credential> {
        let secret = exchange_v1_token(&self.client, &self.base_url, &self.basic_header).await?;
        Ok(Credential::new(V1_TOKEN_SCHEME, &secret))
    }

    fn name(&self) -> &str {
        "v1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v1_response_parses_envelope() {
        let body = r#"{"data": ["AAA", "BBB"]}"#;
        let parsed: V1TokenResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data, vec!["AAA", "BBB"]);
    }

    #[test]
    fn test_v1_response_tolerates_missing_data_key() {
        let parsed: V1TokenResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.data.is_empty());
    }
}
