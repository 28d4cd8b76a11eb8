//! Authentication module
//!
//! The core never stores or prompts for credentials itself: a
//! [`CredentialProvider`] is an injected capability supplying a username and
//! password (or an already-issued API token). The [`Authenticator`] exchanges
//! those credentials for a session token at the login endpoint and caches it
//! for the lifetime of the session.

mod authenticator;
mod provider;

pub use authenticator::Authenticator;
pub use provider::{CredentialProvider, Credentials, StaticCredentials};

#[cfg(test)]
mod tests;
