//! Trigger enable/disable transitions.
//!
//! | Trigger  | Strategy | enable                | disable                                  |
//! |----------|----------|-----------------------|------------------------------------------|
//! | Schedule |          | add recurring job     | remove recurring job                     |
//! | Piece    | Webhook  | engine `ON_ENABLE`    | engine `ON_DISABLE`, then `on_disable`   |
//! | Piece    | Polling  | add polling job       | remove recurring job                     |
//! | Empty    |          | nothing               | nothing                                  |

use std::sync::Arc;

use pieceflow_core::{
    CollectionId, CollectionVersion, Error, FlowJobData, FlowVersion, PieceTrigger, PieceTriggerSettings,
    ProjectId, RecurringJob, RecurringJobQueue, Result, RunEnvironment, Trigger,
    TriggerHookContext, TriggerHookExecutor, TriggerHookRequest, TriggerHookType, TriggerStrategy,
    TriggerType,
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    StrategyResolver, TRACING_TARGET_LIFECYCLE, TriggerConfig, TriggerServices, WebhookUrlBuilder,
};

/// Identifies the flow version whose trigger changes state.
///
/// `collection_id` scopes the context store and the recurring job data. It
/// must name the same collection as `collection_version`; [`Self::validate`]
/// enforces this and both lifecycle operations call it first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleParams {
    pub collection_id: CollectionId,
    pub collection_version: CollectionVersion,
    pub flow_version: FlowVersion,
    pub project_id: ProjectId,
}

impl LifecycleParams {
    /// Creates lifecycle parameters; the collection id is taken from the
    /// collection version.
    pub fn new(
        collection_version: CollectionVersion,
        flow_version: FlowVersion,
        project_id: impl Into<ProjectId>,
    ) -> Self {
        Self {
            collection_id: collection_version.collection_id.clone(),
            collection_version,
            flow_version,
            project_id: project_id.into(),
        }
    }

    /// Fails with a configuration error when the two collection ids differ.
    pub fn validate(&self) -> Result<()> {
        if self.collection_id != self.collection_version.collection_id {
            return Err(Error::configuration().with_message(format!(
                "collection id '{}' does not match collection version '{}' of collection '{}'",
                self.collection_id,
                self.collection_version.id,
                self.collection_version.collection_id
            )));
        }
        Ok(())
    }
}

/// Applies a trigger's desired state to the job queue and remote engine.
///
/// Holds no mutable state. Concurrent calls for the same flow version must be
/// serialized by the caller.
#[derive(Debug, Clone)]
pub struct TriggerLifecycleManager {
    resolver: StrategyResolver,
    webhook_urls: WebhookUrlBuilder,
    services: TriggerServices,
    config: TriggerConfig,
}

impl TriggerLifecycleManager {
    /// Creates a manager over the given collaborators.
    pub fn new(services: TriggerServices, config: TriggerConfig) -> Self {
        Self {
            resolver: services.resolver(),
            webhook_urls: services.webhook_urls(),
            services,
            config,
        }
    }

    /// Returns the configuration in use.
    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    /// Activates the trigger of `params.flow_version`.
    ///
    /// Params and piece references are checked before anything else happens,
    /// so mismatched collection ids or an unknown piece or trigger leave the
    /// queue and engine untouched.
    #[tracing::instrument(
        skip_all,
        target = TRACING_TARGET_LIFECYCLE,
        fields(
            flow_version_id = %params.flow_version.id,
            trigger_type = %params.flow_version.trigger.trigger_type()
        )
    )]
    pub async fn enable(&self, params: &LifecycleParams) -> Result<()> {
        params.validate()?;
        match &params.flow_version.trigger {
            Trigger::Schedule(settings) => {
                self.add_job(params, &settings.cron_expression, TriggerType::Schedule)
                    .await
            }
            Trigger::Piece(settings) => {
                let trigger = self.resolver.resolve_settings(settings)?;
                match trigger.strategy() {
                    TriggerStrategy::Webhook => {
                        let webhook_url = self.build_webhook_url(params).await?;
                        self.execute_hook(TriggerHookType::OnEnable, params, webhook_url)
                            .await
                    }
                    TriggerStrategy::Polling => {
                        self.add_job(params, self.config.polling_cron(), TriggerType::Piece)
                            .await
                    }
                }
            }
            Trigger::Empty => {
                tracing::debug!(
                    target: TRACING_TARGET_LIFECYCLE,
                    "Empty trigger has nothing to enable"
                );
                Ok(())
            }
        }
    }

    /// Deactivates the trigger of `params.flow_version`.
    ///
    /// Webhook triggers always run both the engine's `ON_DISABLE` hook and the
    /// piece's own `on_disable`, even if the trigger was never enabled.
    #[tracing::instrument(
        skip_all,
        target = TRACING_TARGET_LIFECYCLE,
        fields(
            flow_version_id = %params.flow_version.id,
            trigger_type = %params.flow_version.trigger.trigger_type()
        )
    )]
    pub async fn disable(&self, params: &LifecycleParams) -> Result<()> {
        params.validate()?;
        match &params.flow_version.trigger {
            Trigger::Schedule(_) => self.remove_job(params, TriggerType::Schedule).await,
            Trigger::Piece(settings) => {
                let trigger = self.resolver.resolve_settings(settings)?;
                match trigger.strategy() {
                    TriggerStrategy::Webhook => {
                        self.disable_webhook(params, settings, trigger.as_ref())
                            .await
                    }
                    TriggerStrategy::Polling => self.remove_job(params, TriggerType::Piece).await,
                }
            }
            Trigger::Empty => {
                tracing::debug!(
                    target: TRACING_TARGET_LIFECYCLE,
                    "Empty trigger has nothing to disable"
                );
                Ok(())
            }
        }
    }

    async fn disable_webhook(
        &self,
        params: &LifecycleParams,
        settings: &PieceTriggerSettings,
        trigger: &dyn PieceTrigger,
    ) -> Result<()> {
        let webhook_url = self.build_webhook_url(params).await?;
        self.execute_hook(TriggerHookType::OnDisable, params, webhook_url.clone())
            .await?;

        let context = TriggerHookContext {
            store: self
                .services
                .context_stores
                .create_context_store(&params.collection_id),
            webhook_url,
            props_value: settings.input.clone(),
        };
        trigger.on_disable(context).await?;

        tracing::info!(
            target: TRACING_TARGET_LIFECYCLE,
            piece = %settings.piece_name,
            trigger = %settings.trigger_name,
            "Disabled webhook trigger"
        );
        Ok(())
    }

    async fn build_webhook_url(&self, params: &LifecycleParams) -> Result<Url> {
        self.webhook_urls
            .build_webhook_url(&params.flow_version.flow_id)
            .await
    }

    async fn execute_hook(
        &self,
        hook_type: TriggerHookType,
        params: &LifecycleParams,
        webhook_url: Url,
    ) -> Result<()> {
        let request = TriggerHookRequest {
            hook_type,
            flow_version: params.flow_version.clone(),
            webhook_url,
            collection_version: params.collection_version.clone(),
            project_id: params.project_id.clone(),
        };
        self.hook_executor().execute_trigger_hook(&request).await?;

        tracing::info!(
            target: TRACING_TARGET_LIFECYCLE,
            hook_type = %hook_type,
            webhook_url = %request.webhook_url,
            "Executed remote trigger hook"
        );
        Ok(())
    }

    async fn add_job(
        &self,
        params: &LifecycleParams,
        cron_expression: &str,
        trigger_type: TriggerType,
    ) -> Result<()> {
        let job = RecurringJob {
            key: params.flow_version.id.clone(),
            data: FlowJobData {
                environment: RunEnvironment::Production,
                collection_id: params.collection_id.clone(),
                collection_version_id: params.collection_version.id.clone(),
                flow_version: params.flow_version.clone(),
                trigger_type,
            },
            cron_expression: cron_expression.to_owned(),
        };
        self.job_queue().add(job).await?;

        tracing::info!(
            target: TRACING_TARGET_LIFECYCLE,
            trigger_type = %trigger_type,
            cron_expression,
            "Created recurring job"
        );
        Ok(())
    }

    async fn remove_job(&self, params: &LifecycleParams, trigger_type: TriggerType) -> Result<()> {
        self.job_queue().remove(&params.flow_version.id).await?;

        tracing::info!(
            target: TRACING_TARGET_LIFECYCLE,
            trigger_type = %trigger_type,
            "Deleted recurring job"
        );
        Ok(())
    }

    fn job_queue(&self) -> &Arc<dyn RecurringJobQueue> {
        &self.services.job_queue
    }

    fn hook_executor(&self) -> &Arc<dyn TriggerHookExecutor> {
        &self.services.hook_executor
    }
}
