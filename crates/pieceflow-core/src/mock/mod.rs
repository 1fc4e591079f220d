//! In-memory collaborators for testing.
//!
//! Every mock records the calls made against it. Mocks built with the same
//! [`CallLog`] append to one shared, ordered log, which lets tests assert
//! the order of side effects across collaborators.
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! pieceflow-core = { version = "...", features = ["test-utils"] }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};
use url::Url;

use crate::backend::BackendUrlProvider;
use crate::engine::{TriggerHookExecutor, TriggerHookRequest};
use crate::ids::{CollectionId, FlowVersionId};
use crate::piece::{PieceTrigger, TriggerHookContext, TriggerRunContext, TriggerStrategy};
use crate::queue::{RecurringJob, RecurringJobQueue};
use crate::store::{ContextStore, ContextStoreFactory};
use crate::{Error, Result};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Ordered log of calls shared between mocks.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one entry.
    pub fn record(&self, entry: impl Into<String>) {
        lock(&self.0).push(entry.into());
    }

    /// Returns a snapshot of all entries in call order.
    pub fn entries(&self) -> Vec<String> {
        lock(&self.0).clone()
    }
}

/// Recurring job queue backed by a map, with keyed upsert semantics.
#[derive(Debug, Clone, Default)]
pub struct MockJobQueue {
    jobs: Arc<Mutex<HashMap<FlowVersionId, RecurringJob>>>,
    calls: CallLog,
    unavailable: bool,
}

impl MockJobQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records calls into `calls`.
    pub fn with_call_log(mut self, calls: CallLog) -> Self {
        self.calls = calls;
        self
    }

    /// Makes every operation fail with a queue operation failure.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Returns the job registered under `key`.
    pub fn job(&self, key: &FlowVersionId) -> Option<RecurringJob> {
        lock(&self.jobs).get(key).cloned()
    }

    /// Returns the number of live jobs.
    pub fn len(&self) -> usize {
        lock(&self.jobs).len()
    }

    /// Returns `true` if no job is registered.
    pub fn is_empty(&self) -> bool {
        lock(&self.jobs).is_empty()
    }

    /// Returns the recorded calls.
    pub fn calls(&self) -> Vec<String> {
        self.calls.entries()
    }
}

#[async_trait::async_trait]
impl RecurringJobQueue for MockJobQueue {
    async fn add(&self, job: RecurringJob) -> Result<()> {
        self.calls.record(format!("queue:add:{}", job.key));
        if self.unavailable {
            return Err(Error::queue_operation_failure().with_message("queue unavailable"));
        }
        lock(&self.jobs).insert(job.key.clone(), job);
        Ok(())
    }

    async fn remove(&self, key: &FlowVersionId) -> Result<()> {
        self.calls.record(format!("queue:remove:{key}"));
        if self.unavailable {
            return Err(Error::queue_operation_failure().with_message("queue unavailable"));
        }
        lock(&self.jobs).remove(key);
        Ok(())
    }
}

/// Remote engine that records every hook request.
#[derive(Debug, Clone, Default)]
pub struct MockHookExecutor {
    requests: Arc<Mutex<Vec<TriggerHookRequest>>>,
    calls: CallLog,
    failing: bool,
}

impl MockHookExecutor {
    /// Creates an executor that accepts every request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records calls into `calls`.
    pub fn with_call_log(mut self, calls: CallLog) -> Self {
        self.calls = calls;
        self
    }

    /// Makes every request fail with a remote hook failure.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Returns the received requests in order.
    pub fn requests(&self) -> Vec<TriggerHookRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait::async_trait]
impl TriggerHookExecutor for MockHookExecutor {
    async fn execute_trigger_hook(&self, request: &TriggerHookRequest) -> Result<()> {
        self.calls.record(format!("engine:{}", request.hook_type));
        lock(&self.requests).push(request.clone());
        if self.failing {
            return Err(Error::remote_hook_failure().with_message("engine returned 500"));
        }
        Ok(())
    }
}

/// Context store backed by a map.
#[derive(Debug, Clone, Default)]
pub struct MockContextStore {
    values: Arc<Mutex<HashMap<String, Value>>>,
}

impl MockContextStore {
    /// Returns a snapshot of all stored values.
    pub fn values(&self) -> HashMap<String, Value> {
        lock(&self.values).clone()
    }
}

#[async_trait::async_trait]
impl ContextStore for MockContextStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(lock(&self.values).get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        lock(&self.values).insert(key.to_owned(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        lock(&self.values).remove(key);
        Ok(())
    }
}

/// Hands out one [`MockContextStore`] per collection.
#[derive(Debug, Clone, Default)]
pub struct MockContextStoreFactory {
    stores: Arc<Mutex<HashMap<CollectionId, MockContextStore>>>,
}

impl MockContextStoreFactory {
    /// Creates a factory without stores.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the store created for `collection_id`, if any.
    pub fn store(&self, collection_id: &CollectionId) -> Option<MockContextStore> {
        lock(&self.stores).get(collection_id).cloned()
    }
}

impl ContextStoreFactory for MockContextStoreFactory {
    fn create_context_store(&self, collection_id: &CollectionId) -> Arc<dyn ContextStore> {
        let store = lock(&self.stores)
            .entry(collection_id.clone())
            .or_default()
            .clone();
        Arc::new(store)
    }
}

/// Context a [`MockPieceTrigger`] was invoked with.
#[derive(Clone)]
pub struct RecordedContext {
    /// Store handed to the piece.
    pub store: Arc<dyn ContextStore>,
    /// Webhook URL handed to the piece.
    pub webhook_url: Url,
    /// Trigger properties handed to the piece.
    pub props_value: Map<String, Value>,
    /// Raw event, for `run` calls only.
    pub payload: Option<Value>,
}

impl fmt::Debug for RecordedContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordedContext")
            .field("webhook_url", &self.webhook_url.as_str())
            .field("props_value", &self.props_value)
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}

impl From<TriggerHookContext> for RecordedContext {
    fn from(context: TriggerHookContext) -> Self {
        Self {
            store: context.store,
            webhook_url: context.webhook_url,
            props_value: context.props_value,
            payload: None,
        }
    }
}

/// Piece trigger returning a fixed payload batch.
#[derive(Debug, Clone)]
pub struct MockPieceTrigger {
    name: String,
    strategy: TriggerStrategy,
    output: Option<Vec<Value>>,
    calls: CallLog,
    run_contexts: Arc<Mutex<Vec<RecordedContext>>>,
    hook_contexts: Arc<Mutex<Vec<RecordedContext>>>,
}

impl MockPieceTrigger {
    /// Creates a trigger whose `run` echoes the raw payload.
    pub fn new(name: impl Into<String>, strategy: TriggerStrategy) -> Self {
        Self {
            name: name.into(),
            strategy,
            output: None,
            calls: CallLog::default(),
            run_contexts: Arc::default(),
            hook_contexts: Arc::default(),
        }
    }

    /// Makes `run` return `output` regardless of the payload.
    pub fn with_output(mut self, output: Vec<Value>) -> Self {
        self.output = Some(output);
        self
    }

    /// Records calls into `calls`.
    pub fn with_call_log(mut self, calls: CallLog) -> Self {
        self.calls = calls;
        self
    }

    /// Returns the contexts `run` was invoked with.
    pub fn run_contexts(&self) -> Vec<RecordedContext> {
        lock(&self.run_contexts).clone()
    }

    /// Returns the contexts `on_enable` and `on_disable` were invoked with.
    pub fn hook_contexts(&self) -> Vec<RecordedContext> {
        lock(&self.hook_contexts).clone()
    }

    /// Returns the raw payloads `run` was invoked with.
    pub fn seen_payloads(&self) -> Vec<Value> {
        lock(&self.run_contexts)
            .iter()
            .filter_map(|context| context.payload.clone())
            .collect()
    }

    /// Returns the webhook URLs the hooks were invoked with.
    pub fn hook_urls(&self) -> Vec<Url> {
        lock(&self.hook_contexts)
            .iter()
            .map(|context| context.webhook_url.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl PieceTrigger for MockPieceTrigger {
    fn name(&self) -> &str {
        &self.name
    }

    fn strategy(&self) -> TriggerStrategy {
        self.strategy
    }

    async fn run(&self, context: TriggerRunContext) -> Result<Vec<Value>> {
        self.calls.record("piece:run");
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| vec![context.payload.clone()]);
        lock(&self.run_contexts).push(RecordedContext {
            store: context.store,
            webhook_url: context.webhook_url,
            props_value: context.props_value,
            payload: Some(context.payload),
        });
        Ok(output)
    }

    async fn on_enable(&self, context: TriggerHookContext) -> Result<()> {
        self.calls.record("piece:on_enable");
        lock(&self.hook_contexts).push(context.into());
        Ok(())
    }

    async fn on_disable(&self, context: TriggerHookContext) -> Result<()> {
        self.calls.record("piece:on_disable");
        lock(&self.hook_contexts).push(context.into());
        Ok(())
    }
}

/// Backend URL provider that can simulate failed discovery.
#[derive(Debug, Clone)]
pub struct MockBackendUrl {
    url: Option<Url>,
}

impl MockBackendUrl {
    /// Always returns `url`.
    pub fn new(url: Url) -> Self {
        Self { url: Some(url) }
    }

    /// Always fails with a backend URL unavailable error.
    pub fn unavailable() -> Self {
        Self { url: None }
    }
}

#[async_trait::async_trait]
impl BackendUrlProvider for MockBackendUrl {
    async fn backend_url(&self) -> Result<Url> {
        self.url.clone().ok_or_else(|| {
            Error::backend_url_unavailable().with_message("public address discovery failed")
        })
    }
}
