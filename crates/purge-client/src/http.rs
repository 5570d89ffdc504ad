use async_trait::async_trait;
use reqwest::{
    StatusCode, Url,
    header::{AUTHORIZATION, HeaderValue},
};
use tracing::{debug, trace};

use purge_model::{Credential, SearchFilter, SearchPage, SortOrder};

use crate::client::SearchClient;
use crate::config::ClientConfig;
use crate::errors::ClientError;

/// [`SearchClient`] backed by the platform's REST API.
#[derive(Debug, Clone)]
pub struct HttpSearchClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpSearchClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| ClientError::Config(format!("endpoint {:?}: {e}", config.endpoint)))?;
        if endpoint.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "endpoint {:?} cannot carry a path",
                config.endpoint
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        let http = builder
            .build()
            .map_err(|e| ClientError::Config(format!("http client: {e}")))?;

        Ok(Self { http, endpoint })
    }

    fn delete_url(&self, channel_id: &str, message_id: &str) -> Result<Url, ClientError> {
        with_segments(
            &self.endpoint,
            &["channels", channel_id, "messages", message_id],
        )
    }
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    async fn search(
        &self,
        credential: &Credential,
        filter: &SearchFilter,
    ) -> Result<SearchPage, ClientError> {
        let url = search_url(&self.endpoint, filter)?;
        trace!(target_id = %filter.target_id, "sending search request");

        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, authorization(credential)?)
            .send()
            .await?;

        let status = response.status();
        if let Err(e) = classify_search_status(status) {
            debug!(%status, target_id = %filter.target_id, "search rejected");
            return Err(e);
        }

        let body = response.text().await?;
        serde_json::from_str::<SearchPage>(&body).map_err(|e| {
            ClientError::TransientFailure(format!("failed to parse search response: {e}"))
        })
    }

    async fn delete_message(
        &self,
        credential: &Credential,
        channel_id: &str,
        message_id: &str,
    ) -> Result<(), ClientError> {
        let url = self.delete_url(channel_id, message_id)?;

        let response = self
            .http
            .delete(url)
            .header(AUTHORIZATION, authorization(credential)?)
            .send()
            .await?;

        let status = response.status();
        classify_delete_status(status).inspect_err(|_| {
            debug!(%status, channel_id, message_id, "delete rejected");
        })
    }
}

/// Build the search URL for `filter` under `endpoint`.
///
/// Optional constraints are appended only when set; `include_nsfw` is always sent so
/// age-gated channels are searched too.
pub fn search_url(endpoint: &Url, filter: &SearchFilter) -> Result<Url, ClientError> {
    let mut url = with_segments(
        endpoint,
        &[
            filter.scope.path_segment(),
            &filter.target_id,
            "messages",
            "search",
        ],
    )?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("include_nsfw", "true");

        if let Some(content) = &filter.content {
            query.append_pair("content", content);
        }
        if let Some(author_id) = &filter.author_id {
            query.append_pair("author_id", author_id);
        }
        if let Some(has) = filter.has {
            query.append_pair("has", has.as_str());
        }
        if let Some(channel_id) = &filter.channel_id {
            query.append_pair("channel_id", channel_id);
        }
        if let Some(mentions) = &filter.mentions {
            query.append_pair("mentions", mentions);
        }
        if let Some(min_id) = &filter.min_id {
            query.append_pair("min_id", min_id);
        }
        if let Some(max_id) = &filter.max_id {
            query.append_pair("max_id", max_id);
        }
        if filter.sort == SortOrder::Oldest {
            query.append_pair("sort_by", "timestamp");
            query.append_pair("sort_order", "asc");
        }
    }

    Ok(url)
}

/// 200 is success, 403 a permanent denial, anything else transient.
pub fn classify_search_status(status: StatusCode) -> Result<(), ClientError> {
    match status {
        StatusCode::OK => Ok(()),
        StatusCode::FORBIDDEN => Err(ClientError::PermanentDenial),
        other => Err(ClientError::TransientFailure(format!(
            "search returned HTTP {other}"
        ))),
    }
}

/// 204 is success, 403 a permanent denial, anything else transient.
pub fn classify_delete_status(status: StatusCode) -> Result<(), ClientError> {
    match status {
        StatusCode::NO_CONTENT => Ok(()),
        StatusCode::FORBIDDEN => Err(ClientError::PermanentDenial),
        other => Err(ClientError::TransientFailure(format!(
            "delete returned HTTP {other}"
        ))),
    }
}

/// Header value for `credential`, flagged sensitive so it never shows up in debug output.
fn authorization(credential: &Credential) -> Result<HeaderValue, ClientError> {
    let mut value = HeaderValue::from_str(credential.expose()).map_err(|_| {
        ClientError::Config("credential cannot be sent in a request header".to_string())
    })?;
    value.set_sensitive(true);
    Ok(value)
}

fn with_segments(base: &Url, segments: &[&str]) -> Result<Url, ClientError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ClientError::Config(format!("endpoint {base} cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
