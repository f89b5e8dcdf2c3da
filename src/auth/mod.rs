//! Bearer credentials for backend requests
//!
//! The identity provider is external; this crate only needs a way to ask
//! for the current token. [`CredentialProvider`] is that seam. The
//! controller treats both `Ok(None)` and `Err(_)` from `/chat` lookups as
//! "send without a credential".

use crate::error::Result;
use async_trait::async_trait;

pub mod keyring_store;

pub use keyring_store::{KeyringCredentialProvider, StoredCredential};

/// Source of the bearer token attached to backend requests
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Current token, or `None` when the user is not signed in
    ///
    /// # Errors
    ///
    /// Returns error when the underlying store fails. Callers decide whether
    /// that is fatal.
    async fn get_token(&self) -> Result<Option<String>>;
}

/// Provider that always returns the same token (or none)
///
/// Used for tokens supplied through configuration or the environment, for
/// guest usage, and in tests.
///
/// # Examples
///
/// ```
/// use nexuschat::auth::{CredentialProvider, StaticCredentialProvider};
///
/// # tokio_test::block_on(async {
/// let guest = StaticCredentialProvider::anonymous();
/// assert!(guest.get_token().await.unwrap().is_none());
///
/// let signed_in = StaticCredentialProvider::new("tok");
/// assert_eq!(signed_in.get_token().await.unwrap().as_deref(), Some("tok"));
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialProvider {
    token: Option<String>,
}

impl StaticCredentialProvider {
    /// Provider that always yields `token`
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Provider that never yields a token
    pub fn anonymous() -> Self {
        Self { token: None }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn get_token(&self) -> Result<Option<String>> {
        Ok(self.token.clone())
    }
}

/// Pick the provider described by configuration
///
/// A token in `auth.token` (or `NEXUSCHAT_TOKEN`) wins; otherwise the OS
/// keyring is consulted on every request.
pub fn provider_from_config(
    config: &crate::config::AuthConfig,
) -> std::sync::Arc<dyn CredentialProvider> {
    match &config.token {
        Some(token) => {
            tracing::debug!("Using configured static token");
            std::sync::Arc::new(StaticCredentialProvider::new(token.clone()))
        }
        None => {
            tracing::debug!(account = %config.keyring_account, "Using keyring credential");
            std::sync::Arc::new(KeyringCredentialProvider::new(&config.keyring_account))
        }
    }
}
