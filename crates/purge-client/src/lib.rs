//! Remote side of the purge engine: the search/delete client and the index poller.

mod client;
pub use client::SearchClient;

mod config;
pub use config::{ClientConfig, DEFAULT_ENDPOINT};

mod credential;
pub use credential::{AccountCredential, CredentialProvider, StaticCredential};

mod errors;
pub use errors::ClientError;

mod http;
pub use http::{HttpSearchClient, classify_delete_status, classify_search_status, search_url};

mod poller;
pub use poller::IndexPoller;
