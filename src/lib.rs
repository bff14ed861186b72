//! # cove-sdk
//!
//! Rust client library for the Cove security and compliance platform
//! (device backup, legal hold, security-event search, alerts).
//!
//! The crate centers on the platform's session layer: lazily acquired
//! bearer credentials behind a renewal adapter, a connection that retries
//! exactly once after a 401, and a cache of per-storage-node connections
//! keyed by resolved server URL.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cove_sdk::{CoveClient, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = CoveClient::builder()
//!         .host("console.cove.example.com")
//!         .local_account("alice", "s3cret")
//!         .build()
//!         .await?;
//!
//!     let users = client.users().get_all().await?;
//!     println!("{} users", users.len());
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod services;
pub mod storage;
pub mod transport;

// Re-exports for ergonomic usage
pub use auth::{Credential, CredentialProvider, RenewableAuth};
pub use client::{CoveClient, CoveClientBuilder, LoginStrategy};
pub use error::{Error, Result};
pub use services::{EventPage, EventQuery, SecurityEventsService, User, UserPage, UsersService};
pub use storage::{StorageConnectionManager, StorageLocator, StorageLoginInfo};
pub use transport::Connection;
