#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

use std::fmt;
use std::sync::Arc;

use pieceflow_core::{
    BackendUrlProvider, ContextStoreFactory, PieceRegistry, RecurringJobQueue, TriggerHookExecutor,
};

mod config;
mod dispatcher;
mod lifecycle;
mod resolver;
mod webhook_url;

pub use config::{DEFAULT_POLLING_CRON, TriggerConfig};
pub use dispatcher::{ExecuteTrigger, TriggerDispatcher};
pub use lifecycle::{LifecycleParams, TriggerLifecycleManager};
pub use resolver::StrategyResolver;
pub use webhook_url::{WebhookUrlBuilder, webhook_url};

/// Tracing target for piece trigger resolution.
pub const TRACING_TARGET_RESOLVER: &str = "pieceflow_trigger::resolver";

/// Tracing target for inbound event dispatch.
pub const TRACING_TARGET_DISPATCH: &str = "pieceflow_trigger::dispatch";

/// Tracing target for enable/disable transitions.
pub const TRACING_TARGET_LIFECYCLE: &str = "pieceflow_trigger::lifecycle";

/// External collaborators the trigger core talks to.
///
/// Every field is a shared handle, so cloning is cheap.
#[derive(Clone)]
pub struct TriggerServices {
    /// Piece capability lookup.
    pub registry: Arc<dyn PieceRegistry>,
    /// Source of the backend's externally reachable base URL.
    pub backend: Arc<dyn BackendUrlProvider>,
    /// Creates stores scoped to a collection.
    pub context_stores: Arc<dyn ContextStoreFactory>,
    /// Durable recurring job store.
    pub job_queue: Arc<dyn RecurringJobQueue>,
    /// Remote execution engine.
    pub hook_executor: Arc<dyn TriggerHookExecutor>,
}

impl TriggerServices {
    /// Bundles the given collaborators.
    pub fn new(
        registry: Arc<dyn PieceRegistry>,
        backend: Arc<dyn BackendUrlProvider>,
        context_stores: Arc<dyn ContextStoreFactory>,
        job_queue: Arc<dyn RecurringJobQueue>,
        hook_executor: Arc<dyn TriggerHookExecutor>,
    ) -> Self {
        Self {
            registry,
            backend,
            context_stores,
            job_queue,
            hook_executor,
        }
    }

    /// Returns a resolver over the piece registry.
    pub fn resolver(&self) -> StrategyResolver {
        StrategyResolver::new(self.registry.clone())
    }

    /// Returns a webhook URL builder over the backend URL provider.
    pub fn webhook_urls(&self) -> WebhookUrlBuilder {
        WebhookUrlBuilder::new(self.backend.clone())
    }
}

impl fmt::Debug for TriggerServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerServices").finish_non_exhaustive()
    }
}
