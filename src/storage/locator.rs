//! Storage-node locators and authority-side resolution.

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::{LOGIN_TOKEN_PATH, STORAGE_AUTH_TOKEN_PATH};
use crate::error::{Error, Result};
use crate::transport::Connection;

/// Indirect identifier for a storage node.
///
/// Archive data lives on dynamically-discovered storage nodes; a locator
/// names the data (by device or by plan) and the authority translates it
/// into a concrete server URL plus a temporary login token. The resolved
/// server URL is stable for the locator's lifetime and serves as the
/// connection-cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocator {
    /// Backup archive for one device at one destination.
    Device {
        user_id: String,
        device_guid: String,
        destination_guid: String,
    },
    /// Security-event/archive data for a plan at one destination.
    Plan {
        plan_uid: String,
        destination_guid: String,
    },
}

impl StorageLocator {
    /// Authority endpoint that resolves this locator kind.
    pub(crate) fn path(&self) -> &'static str {
        match self {
            StorageLocator::Device { .. } => LOGIN_TOKEN_PATH,
            StorageLocator::Plan { .. } => STORAGE_AUTH_TOKEN_PATH,
        }
    }

    pub(crate) fn body(&self) -> serde_json::Value {
        match self {
            StorageLocator::Device {
                user_id,
                device_guid,
                destination_guid,
            } => json!({
                "userId": user_id,
                "sourceGuid": device_guid,
                "destinationGuid": destination_guid,
            }),
            StorageLocator::Plan {
                plan_uid,
                destination_guid,
            } => json!({
                "planUid": plan_uid,
                "destinationGuid": destination_guid,
            }),
        }
    }

    pub fn destination_guid(&self) -> &str {
        match self {
            StorageLocator::Device {
                destination_guid, ..
            }
            | StorageLocator::Plan {
                destination_guid, ..
            } => destination_guid,
        }
    }
}

impl std::fmt::Display for StorageLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageLocator::Device {
                device_guid,
                destination_guid,
                ..
            } => write!(f, "device {} @ {}", device_guid, destination_guid),
            StorageLocator::Plan {
                plan_uid,
                destination_guid,
            } => write!(f, "plan {} @ {}", plan_uid, destination_guid),
        }
    }
}

/// Resolution result: where the node lives and a short-lived token to log
/// into it with.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StorageLoginInfo {
    pub server_url: String,
    pub login_token: String,
}

#[derive(Debug, Deserialize)]
struct StorageLoginEnvelope {
    data: StorageLoginInfo,
}

/// Ask the authority to translate a locator into login info.
///
/// Any failure - transport, HTTP error, a 404 for an unknown
/// plan/destination, or a malformed body - wraps into the dedicated
/// session-initialization error so callers can fall back to the next
/// destination candidate.
pub async fn resolve(authority: &Connection, locator: &StorageLocator) -> Result<StorageLoginInfo> {
    let response = authority
        .post_json(locator.path(), &locator.body())
        .await
        .map_err(|e| Error::SessionInit {
            message: format!("resolution of {} failed: {}", locator, e),
        })?;

    if !response.status().is_success() {
        return Err(Error::SessionInit {
            message: format!(
                "authority returned {} resolving {}",
                response.status().as_u16(),
                locator
            ),
        });
    }

    let envelope: StorageLoginEnvelope =
        response.json().await.map_err(|e| Error::SessionInit {
            message: format!("malformed resolution response for {}: {}", locator, e),
        })?;

    debug!(server_url = envelope.data.server_url.as_str(), "Resolved {}", locator);
    Ok(envelope.data)
}
