//! Credential provider boundary
//!
//! Interactive prompting and OS keyring storage live outside this crate;
//! callers inject whatever provider suits their environment. Tests substitute
//! a fake.

use crate::error::Result;
use async_trait::async_trait;

/// Credentials handed to the authenticator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Username/password pair exchanged for a session token at login
    Login { username: String, password: String },
    /// A pre-issued API token, used as-is
    Token(String),
}

/// Source of credentials for a session.
///
/// Implementations may read environment variables, consult an OS keyring,
/// or prompt interactively; the core only calls [`credentials`] and treats
/// any failure as an authentication error.
///
/// [`credentials`]: CredentialProvider::credentials
#[async_trait]
pub trait CredentialProvider: Send + Sync + std::fmt::Debug {
    /// Produce credentials for the session.
    async fn credentials(&self) -> Result<Credentials>;
}

/// Fixed credentials supplied up front
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    credentials: Credentials,
}

impl StaticCredentials {
    /// Create a provider from a username/password pair
    pub fn login(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::Login {
                username: username.into(),
                password: password.into(),
            },
        }
    }

    /// Create a provider from a pre-issued API token
    pub fn token(token: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::Token(token.into()),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn credentials(&self) -> Result<Credentials> {
        Ok(self.credentials.clone())
    }
}
