//! Security-event search over storage-node connections.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::storage::{StorageConnectionManager, StorageLocator};

const DETECTION_EVENT_PATH: &str = "/api/SecurityDetectionEvent";

/// Query parameters for the detection-event endpoint.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub plan_uid: Option<String>,
    pub cursor: Option<String>,
    pub min_timestamp: Option<String>,
    pub max_timestamp: Option<String>,
    pub include_files: bool,
}

impl EventQuery {
    fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(plan_uid) = &self.plan_uid {
            pairs.push(("planUid", plan_uid.clone()));
        }
        if let Some(cursor) = &self.cursor {
            pairs.push(("cursor", cursor.clone()));
        }
        if let Some(min) = &self.min_timestamp {
            pairs.push(("minTs", min.clone()));
        }
        if let Some(max) = &self.max_timestamp {
            pairs.push(("maxTs", max.clone()));
        }
        pairs.push(("incFiles", self.include_files.to_string()));
        pairs
    }
}

/// One page of detection events. Event bodies are passed through as raw
/// JSON; their schema varies by event type and server version.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub events: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct EventPageEnvelope {
    data: EventPage,
}

/// Detection-event search across candidate storage destinations.
///
/// The connection cache reports resolution failures per locator; the
/// failover policy - try the next destination candidate - lives here, not
/// in the cache.
pub struct SecurityEventsService {
    manager: Arc<StorageConnectionManager>,
}

impl SecurityEventsService {
    pub(crate) fn new(manager: Arc<StorageConnectionManager>) -> Self {
        Self { manager }
    }

    /// Query detection events, trying each candidate locator in order until
    /// one yields a storage session.
    ///
    /// A 404 from the storage node means no event data has landed yet and
    /// produces an empty page, not an error.
    pub async fn query_events(
        &self,
        candidates: &[StorageLocator],
        query: &EventQuery,
    ) -> Result<EventPage> {
        if candidates.is_empty() {
            return Err(Error::SessionInit {
                message: "no candidate storage destinations supplied".into(),
            });
        }

        let mut attempts: Vec<String> = Vec::new();

        for locator in candidates {
            let connection = match self.manager.resolve_and_get(locator).await {
                Ok(connection) => connection,
                Err(e) => {
                    warn!(locator = %locator, "Storage session failed, trying next candidate");
                    attempts.push(format!("{}: {}", locator, e));
                    continue;
                }
            };

            let response = connection
                .get_with_query(DETECTION_EVENT_PATH, &query.to_pairs())
                .await?;

            if response.status().as_u16() == 404 {
                debug!(locator = %locator, "No event data yet");
                return Ok(EventPage::default());
            }

            let envelope: EventPageEnvelope = response.json().await?;
            return Ok(envelope.data);
        }

        Err(Error::SessionInit {
            message: format!("all storage destinations failed: {}", attempts.join("; ")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs_include_set_fields_only() {
        let query = EventQuery {
            plan_uid: Some("55".into()),
            cursor: None,
            min_timestamp: Some("2026-01-01T00:00:00Z".into()),
            max_timestamp: None,
            include_files: true,
        };
        let pairs = query.to_pairs();
        assert!(pairs.contains(&("planUid", "55".to_string())));
        assert!(pairs.contains(&("minTs", "2026-01-01T00:00:00Z".to_string())));
        assert!(pairs.contains(&("incFiles", "true".to_string())));
        assert!(!pairs.iter().any(|(k, _)| *k == "cursor" || *k == "maxTs"));
    }

    #[test]
    fn test_event_page_parses_envelope() {
        let body = r#"{"data": {"cursor": "c-2", "events": [{"eventType": "CREATED"}]}}"#;
        let envelope: EventPageEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.data.cursor.as_deref(), Some("c-2"));
        assert_eq!(envelope.data.events.len(), 1);
    }

    #[test]
    fn test_event_page_defaults_are_empty() {
        let page = EventPage::default();
        assert!(page.cursor.is_none());
        assert!(page.events.is_empty());
    }
}
