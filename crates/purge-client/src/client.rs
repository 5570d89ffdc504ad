use async_trait::async_trait;
use purge_model::{Credential, SearchFilter, SearchPage};

use crate::errors::ClientError;

/// Remote message search and delete operations.
///
/// Implementations keep no state between calls: each call is exactly one outbound request.
#[async_trait]
pub trait SearchClient: Send + Sync + 'static {
    /// Fetch one page of messages matching `filter`.
    ///
    /// Fails with [`ClientError::PermanentDenial`] when the caller has no access to the target.
    async fn search(
        &self,
        credential: &Credential,
        filter: &SearchFilter,
    ) -> Result<SearchPage, ClientError>;

    /// Delete one message.
    ///
    /// Fails with [`ClientError::PermanentDenial`] when this particular message cannot be
    /// deleted with the credential.
    async fn delete_message(
        &self,
        credential: &Credential,
        channel_id: &str,
        message_id: &str,
    ) -> Result<(), ClientError>;
}
