//! Scripted [`SearchClient`] for engine and queue tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use purge_client::{ClientError, SearchClient};
use purge_model::{Credential, MatchGroup, MessageHit, SearchFilter, SearchPage};

type DeleteHook = Box<dyn Fn(&str) + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Search(SearchFilter),
    Delete(String),
}

/// Answers searches from a queue and deletes from per-message scripts.
///
/// Once the search script runs dry every search reports an exhausted page; unscripted
/// deletes succeed.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    searches: Mutex<VecDeque<Result<SearchPage, ClientError>>>,
    deletes: Mutex<HashMap<String, VecDeque<Result<(), ClientError>>>>,
    calls: Mutex<Vec<Call>>,
    on_delete: Mutex<Option<DeleteHook>>,
}

impl ScriptedClient {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push_search(&self, result: Result<SearchPage, ClientError>) -> &Self {
        self.searches.lock().unwrap().push_back(result);
        self
    }

    pub(crate) fn script_delete(&self, id: &str, results: Vec<Result<(), ClientError>>) -> &Self {
        self.deletes
            .lock()
            .unwrap()
            .insert(id.to_string(), results.into());
        self
    }

    /// Run `hook` with the message id after every delete call, before it returns.
    pub(crate) fn on_delete(&self, hook: impl Fn(&str) + Send + Sync + 'static) {
        *self.on_delete.lock().unwrap() = Some(Box::new(hook));
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn searched(&self) -> Vec<SearchFilter> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Search(filter) => Some(filter),
                Call::Delete(_) => None,
            })
            .collect()
    }

    pub(crate) fn deleted(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Delete(id) => Some(id),
                Call::Search(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl SearchClient for ScriptedClient {
    async fn search(
        &self,
        _credential: &Credential,
        filter: &SearchFilter,
    ) -> Result<SearchPage, ClientError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Search(filter.clone()));
        self.searches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(page(0, &[])))
    }

    async fn delete_message(
        &self,
        _credential: &Credential,
        _channel_id: &str,
        message_id: &str,
    ) -> Result<(), ClientError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Delete(message_id.to_string()));
        let result = self
            .deletes
            .lock()
            .unwrap()
            .get_mut(message_id)
            .and_then(|script| script.pop_front())
            .unwrap_or(Ok(()));
        if let Some(hook) = self.on_delete.lock().unwrap().as_ref() {
            hook(message_id);
        }
        result
    }
}

/// Page reporting `total` remaining matches, one single-hit group per id.
pub(crate) fn page(total: u64, ids: &[&str]) -> SearchPage {
    SearchPage {
        total_results: Some(total),
        documents_indexed: None,
        messages: Some(
            ids.iter()
                .map(|id| {
                    MatchGroup(vec![MessageHit {
                        id: id.to_string(),
                        channel_id: "500".to_string(),
                        hit: true,
                    }])
                })
                .collect(),
        ),
    }
}

pub(crate) fn indexing_page() -> SearchPage {
    SearchPage {
        documents_indexed: Some(0),
        ..Default::default()
    }
}
