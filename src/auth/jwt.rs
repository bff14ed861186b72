//! v3 JWT issuance.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::provider::{Credential, CredentialProvider};
use crate::config::{JWT_AUTH_PATH, JWT_COOKIE_NAME, V3_TOKEN_SCHEME};
use crate::error::{Error, Result};

#[derive(Debug, Default, Deserialize)]
struct JwtBody {
    #[serde(default)]
    data: JwtData,
}

#[derive(Debug, Default, Deserialize)]
struct JwtData {
    #[serde(default)]
    v3_user_token: Option<String>,
}

/// Fetch a v3 JWT from the issuance endpoint under Basic auth.
///
/// GET `/c42api/v3/auth/jwt?useBody=true`. The token arrives in the JSON
/// body; legacy servers leave the body empty and set the
/// `C42_JWT_API_TOKEN` cookie instead, so the response cookies are the
/// fallback source.
pub async fn fetch_jwt(
    client: &reqwest::Client,
    base_url: &str,
    basic_header: &str,
) -> Result<String> {
    let url = format!("{}{}", base_url, JWT_AUTH_PATH);
    info!("Fetching v3 JWT");

    let response = client
        .get(&url)
        .header(reqwest::header::AUTHORIZATION, basic_header)
        .send()
        .await
        .map_err(|e| Error::CredentialExchange {
            endpoint: url.clone(),
            message: format!("JWT request failed: {}", e),
        })?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::CredentialExchange {
            endpoint: url,
            message: format!("JWT endpoint returned {}: {}", status, body),
        });
    }

    // The cookie fallback must be read off the response before the body
    // consumes it.
    let cookie_token = token_from_cookies(&response);

    let text = response.text().await.unwrap_or_default();
    if !text.is_empty() {
        if let Ok(body) = serde_json::from_str::<JwtBody>(&text) {
            if let Some(token) = body.data.v3_user_token.filter(|t| !t.is_empty()) {
                debug!("JWT issued via response body");
                return Ok(token);
            }
        }
    }

    if let Some(token) = cookie_token {
        warn!("JWT endpoint returned an empty body, using {} cookie", JWT_COOKIE_NAME);
        return Ok(token);
    }

    Err(Error::CredentialExchange {
        endpoint: url,
        message: "JWT response contained neither a body token nor the legacy cookie".into(),
    })
}

fn token_from_cookies(response: &reqwest::Response) -> Option<String> {
    let prefix = format!("{}=", JWT_COOKIE_NAME);
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|cookie| {
            let value = cookie.strip_prefix(&prefix)?;
            let token = value.split(';').next().unwrap_or(value).trim();
            (!token.is_empty()).then(|| token.to_string())
        })
}

/// v3 JWT credential provider.
///
/// The issued credential carries the token both in the `Authorization`
/// header and mirrored into the legacy cookie; modern servers ignore the
/// cookie and legacy servers require it, so attaching both avoids probing
/// server capabilities.
pub struct JwtProvider {
    client: reqwest::Client,
    base_url: String,
    basic_header: String,
}

impl JwtProvider {
    pub fn new(client: reqwest::Client, base_url: String, basic_header: String) -> Self {
        Self {
            client,
            base_url,
            basic_header,
        }
    }
}

#[async_trait]
impl CredentialProvider for JwtProvider {
    async fn get_secret_value(&self, _force_refresh: bool) -> Result<Credential> {
        let token = fetch_jwt(&self.client, &self.base_url, &self.basic_header).await?;
        Ok(Credential::new(V3_TOKEN_SCHEME, &token).with_cookie(JWT_COOKIE_NAME, token.clone()))
    }

    fn name(&self) -> &str {
        "v3"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_body_parses_token() {
        let body: JwtBody =
            serde_json::from_str(r#"{"data": {"v3_user_token": "abc.def.ghi"}}"#).unwrap();
        assert_eq!(body.data.v3_user_token.as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_jwt_body_tolerates_empty_envelope() {
        let body: JwtBody = serde_json::from_str(r#"{"data": {}}"#).unwrap();
        assert!(body.data.v3_user_token.is_none());
    }
}
