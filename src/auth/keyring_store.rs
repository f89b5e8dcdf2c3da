//! Token persistence via OS keyring
//!
//! The bearer token is stored in the operating system's native credential
//! store (Keychain on macOS, Secret Service on Linux, Windows Credential
//! Manager on Windows), serialized as JSON so an expiry can travel with it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CredentialProvider;
use crate::error::{NexusError, Result};

/// Keyring service name all nexuschat entries live under
const SERVICE_NAME: &str = "nexuschat";

/// A bearer token as stored in the keyring
///
/// # Examples
///
/// ```
/// use nexuschat::auth::StoredCredential;
///
/// let credential = StoredCredential::new("tok", None);
/// assert!(!credential.is_expired());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    /// Token sent as `Authorization: Bearer <access_token>`
    pub access_token: String,

    /// When the token stops being accepted; `None` means never
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_seconds_option"
    )]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredCredential {
    /// Build a credential expiring at `expires_at`
    pub fn new(access_token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// Returns `true` when the token is expired or expires within 60 seconds
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            None => false,
            Some(expires_at) => Utc::now() >= expires_at - chrono::Duration::seconds(60),
        }
    }
}

/// Credential provider backed by the OS keyring
///
/// Reads the entry on every call, so a `nexuschat auth login` in another
/// terminal takes effect without restarting the chat session. Expired
/// tokens are reported as absent.
#[derive(Debug, Clone)]
pub struct KeyringCredentialProvider {
    account: String,
}

impl KeyringCredentialProvider {
    /// Provider for the given keyring account
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry> {
        keyring::Entry::new(SERVICE_NAME, &self.account).map_err(|e| NexusError::Keyring(e).into())
    }

    /// Persist a credential for this account
    ///
    /// # Errors
    ///
    /// Returns [`NexusError::Keyring`] if the OS credential store rejects
    /// the write.
    pub fn save_token(&self, credential: &StoredCredential) -> Result<()> {
        let json_str = serde_json::to_string(credential)?;
        self.entry()?
            .set_password(&json_str)
            .map_err(NexusError::Keyring)?;
        tracing::info!(account = %self.account, "Stored credential in keyring");
        Ok(())
    }

    /// Load the stored credential, if any
    ///
    /// Returns `Ok(None)` when nothing has been stored for this account.
    pub fn load_token(&self) -> Result<Option<StoredCredential>> {
        match self.entry()?.get_password() {
            Ok(json_str) => Ok(Some(serde_json::from_str(&json_str)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(NexusError::Keyring(e).into()),
        }
    }

    /// Remove the stored credential; a no-op when nothing is stored
    pub fn delete_token(&self) -> Result<()> {
        match self.entry()?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(NexusError::Keyring(e).into()),
        }
    }
}

#[async_trait]
impl CredentialProvider for KeyringCredentialProvider {
    async fn get_token(&self) -> Result<Option<String>> {
        let stored = self.load_token().map_err(|e| {
            NexusError::Credential(format!(
                "keyring lookup failed for account '{}': {}",
                self.account, e
            ))
        })?;
        match stored {
            Some(credential) if credential.is_expired() => {
                tracing::warn!(account = %self.account, "Stored credential has expired");
                Ok(None)
            }
            Some(credential) => Ok(Some(credential.access_token)),
            None => Ok(None),
        }
    }
}
