use std::sync::Arc;

use tracing::{debug, warn};

use purge_model::{Credential, RetryPolicy, SearchFilter, SearchPage};

use crate::client::SearchClient;
use crate::errors::ClientError;

const INDEX_RETRY_MS: u64 = 2000;
const SEARCH_RETRY_MS: u64 = 1000;

/// Repeats a search until the remote index is ready to answer it.
///
/// A freshly requested query may come back with `documents_indexed: 0` while the server
/// builds its index; such a page carries no usable counts. Transient failures are waited out
/// too. Only a permanent denial ends the wait early.
#[derive(Clone)]
pub struct IndexPoller {
    client: Arc<dyn SearchClient>,
    index_retry: RetryPolicy,
    search_retry: RetryPolicy,
}

impl IndexPoller {
    pub fn new(client: Arc<dyn SearchClient>) -> Self {
        Self {
            client,
            index_retry: RetryPolicy::fixed(INDEX_RETRY_MS),
            search_retry: RetryPolicy::fixed(SEARCH_RETRY_MS),
        }
    }

    /// Policy applied while the index reports nothing indexed yet.
    pub fn with_index_retry(mut self, policy: RetryPolicy) -> Self {
        self.index_retry = policy;
        self
    }

    /// Policy applied after a transient search failure.
    pub fn with_search_retry(mut self, policy: RetryPolicy) -> Self {
        self.search_retry = policy;
        self
    }

    /// Search until a page arrives that is not still indexing.
    ///
    /// With the default policies this only returns on success, on
    /// [`ClientError::PermanentDenial`] or on a [`ClientError::Config`] error that no retry
    /// can fix. A capped policy gives up with a transient failure.
    pub async fn wait_for_indexed_search(
        &self,
        credential: &Credential,
        filter: &SearchFilter,
    ) -> Result<SearchPage, ClientError> {
        let mut indexing_polls: u32 = 0;
        let mut failures: u32 = 0;

        loop {
            match self.client.search(credential, filter).await {
                Ok(page) if page.is_indexing() => {
                    indexing_polls = indexing_polls.saturating_add(1);
                    if !self.index_retry.allows_retry(indexing_polls) {
                        warn!(
                            target_id = %filter.target_id,
                            polls = indexing_polls,
                            "index still not ready, giving up"
                        );
                        return Err(ClientError::TransientFailure(format!(
                            "index not ready after {indexing_polls} polls"
                        )));
                    }
                    debug!(
                        target_id = %filter.target_id,
                        polls = indexing_polls,
                        delay_ms = self.index_retry.interval_ms,
                        "index not ready yet"
                    );
                    tokio::time::sleep(self.index_retry.delay()).await;
                }
                Ok(page) => return Ok(page),
                Err(e @ (ClientError::PermanentDenial | ClientError::Config(_))) => return Err(e),
                Err(e) => {
                    failures = failures.saturating_add(1);
                    if !self.search_retry.allows_retry(failures) {
                        warn!(
                            target_id = %filter.target_id,
                            attempts = failures,
                            error = %e,
                            "search keeps failing, giving up"
                        );
                        return Err(e);
                    }
                    debug!(
                        target_id = %filter.target_id,
                        attempt = failures,
                        delay_ms = self.search_retry.interval_ms,
                        error = %e,
                        "search failed, retrying"
                    );
                    tokio::time::sleep(self.search_retry.delay()).await;
                }
            }
        }
    }
}
