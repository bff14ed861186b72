//! Credential acquisition and renewal.
//!
//! A [`CredentialProvider`] knows how to produce one kind of bearer
//! credential (Basic, v1 legacy exchange, v3 JWT, temporary storage login);
//! [`RenewableAuth`] wraps a provider behind "attach current credential,
//! invalidate on demand" with renewal serialized under a lock.

mod basic;
mod jwt;
mod provider;
mod renewable;
mod storage_login;
mod v1;

pub use basic::BasicAuthProvider;
pub use jwt::{fetch_jwt, JwtProvider};
pub use provider::{Credential, CredentialProvider};
pub use renewable::RenewableAuth;
pub use storage_login::StorageLoginProvider;
pub use v1::{exchange_v1_token, V1TokenProvider};
