//! User listing with the platform pagination convention.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::transport::Connection;

const USER_PATH: &str = "/api/User";

/// Default page size when walking the full listing.
pub const DEFAULT_PAGE_SIZE: u32 = 500;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: u64,
    pub user_uid: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub active: bool,
}

/// One page of the user listing: the platform envelope carries the overall
/// `totalCount` next to the page's items.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    pub total_count: u64,
    #[serde(default)]
    pub users: Vec<User>,
}

#[derive(Debug, Deserialize)]
struct UserPageEnvelope {
    data: UserPage,
}

/// Typed access to the user resource on the authority.
pub struct UsersService {
    authority: Arc<Connection>,
}

impl UsersService {
    pub(crate) fn new(authority: Arc<Connection>) -> Self {
        Self { authority }
    }

    /// Fetch one page. `pg_num` is 1-based per the platform convention.
    pub async fn get_page(&self, pg_num: u32, pg_size: u32) -> Result<UserPage> {
        let query = [
            ("pgNum", pg_num.to_string()),
            ("pgSize", pg_size.to_string()),
        ];
        let response = self.authority.get_with_query(USER_PATH, &query).await?;

        // The user listing always exists; a 404 here means the caller's
        // deployment lacks the resource and is an error at this level.
        if response.status().as_u16() == 404 {
            return Err(Error::NotFound {
                method: "GET".into(),
                url: format!("{}{}", self.authority.base_url(), USER_PATH),
            });
        }

        let envelope: UserPageEnvelope = response.json().await?;
        Ok(envelope.data)
    }

    /// Walk every page until `totalCount` is exhausted or a page comes back
    /// empty.
    pub async fn get_all(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = Vec::new();
        let mut pg_num = 1u32;

        loop {
            let page = self.get_page(pg_num, DEFAULT_PAGE_SIZE).await?;
            if page.users.is_empty() {
                break;
            }
            debug!(pg_num, fetched = page.users.len(), total = page.total_count, "User page");
            users.extend(page.users);
            if users.len() as u64 >= page.total_count {
                break;
            }
            pg_num += 1;
        }

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_page_parses_envelope() {
        let body = r#"{
            "data": {
                "totalCount": 2,
                "users": [
                    {"userId": 1, "userUid": "u-1", "username": "alice", "email": "a@example.com", "active": true},
                    {"userId": 2, "userUid": "u-2", "username": "bob", "active": false}
                ]
            }
        }"#;
        let envelope: UserPageEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.data.total_count, 2);
        assert_eq!(envelope.data.users.len(), 2);
        assert_eq!(envelope.data.users[0].username, "alice");
        assert_eq!(envelope.data.users[1].email, None);
    }

    #[test]
    fn test_user_page_tolerates_missing_users_key() {
        let envelope: UserPageEnvelope =
            serde_json::from_str(r#"{"data": {"totalCount": 0}}"#).unwrap();
        assert!(envelope.data.users.is_empty());
    }
}
