use async_trait::async_trait;
use purge_model::Credential;

use crate::errors::ClientError;

/// Account id together with the secret that acts for it.
#[derive(Debug, Clone)]
pub struct AccountCredential {
    pub account_id: String,
    pub credential: Credential,
}

/// Source of credentials for new tasks.
///
/// Capturing a credential (for example from an interactive login) happens outside this
/// workspace; the engine only needs the resulting pair.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn acquire(&self) -> Result<AccountCredential, ClientError>;
}

/// Provider that hands out a credential configured up front.
#[derive(Debug, Clone)]
pub struct StaticCredential {
    inner: AccountCredential,
}

impl StaticCredential {
    pub fn new(account_id: impl Into<String>, credential: Credential) -> Self {
        Self {
            inner: AccountCredential {
                account_id: account_id.into(),
                credential,
            },
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredential {
    async fn acquire(&self) -> Result<AccountCredential, ClientError> {
        if self.inner.credential.is_empty() {
            return Err(ClientError::Config("no credential configured".to_string()));
        }
        Ok(self.inner.clone())
    }
}
