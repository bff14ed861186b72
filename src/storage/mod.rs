//! Storage-node routing: locators, authority resolution, and the
//! per-node connection cache.

mod cache;
mod locator;

pub use cache::StorageConnectionManager;
pub use locator::{resolve, StorageLocator, StorageLoginInfo};
