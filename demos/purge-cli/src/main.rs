use std::env;
use std::sync::Arc;

use tracing::{info, warn};

use purge_client::{ClientConfig, CredentialProvider, HttpSearchClient, StaticCredential};
use purge_core::{DeletionEngine, EngineConfig, QueueEvent, StateSubscriber, TaskQueue};
use purge_model::{Credential, FilterScope, SearchFilter, Task, TaskId, TaskOutcome};
use purge_observe::{LoggerConfig, LoggerFormat, logger_init, spawn_queue_logger};
use purge_prometheus::PrometheusMetrics;

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn required(name: &str) -> Result<String, Box<dyn std::error::Error>> {
    var(name).ok_or_else(|| format!("{name} must be set").into())
}

fn filter_from_env() -> Result<SearchFilter, Box<dyn std::error::Error>> {
    let scope: FilterScope = var("PURGE_SCOPE")
        .as_deref()
        .unwrap_or("channel")
        .parse()?;
    let mut filter = SearchFilter::new(scope, required("PURGE_TARGET")?);

    if let Some(author) = var("PURGE_AUTHOR") {
        filter = filter.with_author(author);
    }
    if let Some(content) = var("PURGE_CONTENT") {
        filter = filter.with_content(content);
    }
    if let Some(has) = var("PURGE_HAS") {
        filter = filter.with_has(has.parse()?);
    }
    if let Some(sort) = var("PURGE_SORT") {
        filter = filter.with_sort(sort.parse()?);
    }
    Ok(filter)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1) Logger
    let mut log_cfg = LoggerConfig::default();
    if let Some(format) = var("PURGE_LOG_FORMAT") {
        log_cfg = log_cfg.with_format(format.parse::<LoggerFormat>()?);
    }
    if let Some(level) = var("PURGE_LOG_LEVEL") {
        log_cfg = log_cfg.with_level(level);
    }
    logger_init(&log_cfg)?;
    info!("logger initialized");

    // 2) Credential
    let provider = StaticCredential::new(
        var("PURGE_ACCOUNT").unwrap_or_else(|| "default".to_string()),
        Credential::new(required("PURGE_TOKEN")?),
    );
    let account = provider.acquire().await?;

    // 3) Client, engine and metrics
    let mut client_cfg = ClientConfig::default();
    if let Some(endpoint) = var("PURGE_ENDPOINT") {
        client_cfg = client_cfg.with_endpoint(endpoint);
    }
    let client = Arc::new(HttpSearchClient::new(&client_cfg)?);
    let metrics = PrometheusMetrics::new()?;
    let engine = DeletionEngine::new(client)
        .with_config(EngineConfig::default())
        .with_metrics(Arc::new(metrics.clone()));
    info!(endpoint = %client_cfg.endpoint, "client configured");

    // 4) Preview
    let filter = filter_from_env()?;
    let queue = TaskQueue::new(engine);
    match queue.count_matches(&account.credential, &filter).await? {
        Some(count) => info!(count, "messages match the filter"),
        None => info!("no messages match the filter"),
    }

    // 5) Queue
    let mut events = queue.subscribe();
    spawn_queue_logger(queue.subscribe());

    let task = Task::new(account.account_id.clone(), account.credential, filter)?
        .with_description(format!("purge for {}", account.account_id));
    let id = queue.enqueue(task);
    info!(task = %id, "press Ctrl+C to cancel");

    // 6) Wait for the task, cancelling on Ctrl+C
    let removed = wait_removed(&mut events, &id);
    tokio::pin!(removed);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    let outcome = loop {
        tokio::select! {
            outcome = &mut removed => break outcome,
            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                warn!(task = %id, "interrupted, cancelling");
                if let Err(e) = queue.cancel(&id) {
                    warn!(task = %id, error = %e, "cancel failed");
                }
            }
        }
    };

    // 7) Summary
    info!(task = %id, outcome = outcome.as_str(), "purge finished");
    info!("metrics:\n{}", metrics.encode_text()?);
    Ok(())
}

async fn wait_removed(events: &mut StateSubscriber, id: &TaskId) -> TaskOutcome {
    while let Some(event) = events.recv().await {
        if let QueueEvent::TaskRemoved {
            id: removed,
            outcome,
        } = event
            && &removed == id
        {
            return outcome;
        }
    }
    TaskOutcome::Cancelled
}
