//! HTTP transport: default headers and the retrying connection.

pub mod headers;
mod http;

pub use http::Connection;
