//! Inbound event dispatch.

use std::fmt;
use std::sync::Arc;

use pieceflow_core::{
    CollectionId, ContextStoreFactory, FlowVersion, Result, Trigger, TriggerRunContext,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{StrategyResolver, TRACING_TARGET_DISPATCH, TriggerServices, WebhookUrlBuilder};

/// One inbound event for a flow version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteTrigger {
    /// Collection the flow belongs to; scopes the piece's context store.
    pub collection_id: CollectionId,
    /// The flow version whose trigger receives the event.
    pub flow_version: FlowVersion,
    /// Raw event as received.
    pub payload: Value,
}

impl ExecuteTrigger {
    /// Creates a dispatch request.
    pub fn new(collection_id: impl Into<CollectionId>, flow_version: FlowVersion, payload: Value) -> Self {
        Self {
            collection_id: collection_id.into(),
            flow_version,
            payload,
        }
    }
}

/// Turns raw events into flow-run payload batches.
#[derive(Clone)]
pub struct TriggerDispatcher {
    resolver: StrategyResolver,
    webhook_urls: WebhookUrlBuilder,
    context_stores: Arc<dyn ContextStoreFactory>,
}

impl fmt::Debug for TriggerDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerDispatcher")
            .field("resolver", &self.resolver)
            .field("webhook_urls", &self.webhook_urls)
            .finish_non_exhaustive()
    }
}

impl TriggerDispatcher {
    /// Creates a dispatcher over the given collaborators.
    pub fn new(services: &TriggerServices) -> Self {
        Self {
            resolver: services.resolver(),
            webhook_urls: services.webhook_urls(),
            context_stores: services.context_stores.clone(),
        }
    }

    /// Converts one raw event into zero or more flow-run payloads.
    ///
    /// Piece triggers return exactly what the piece's `run` returns. Schedule
    /// and empty triggers pass the payload through unchanged. Errors from
    /// resolution or from the piece are returned as is.
    #[tracing::instrument(
        skip_all,
        target = TRACING_TARGET_DISPATCH,
        fields(flow_version_id = %request.flow_version.id)
    )]
    pub async fn execute_trigger(&self, request: ExecuteTrigger) -> Result<Vec<Value>> {
        let ExecuteTrigger {
            collection_id,
            flow_version,
            payload,
        } = request;

        let payloads = match flow_version.trigger {
            Trigger::Piece(settings) => {
                let trigger = self.resolver.resolve_settings(&settings)?;
                let webhook_url = self
                    .webhook_urls
                    .build_webhook_url(&flow_version.flow_id)
                    .await?;

                let context = TriggerRunContext {
                    store: self.context_stores.create_context_store(&collection_id),
                    webhook_url,
                    props_value: settings.input,
                    payload,
                };
                trigger.run(context).await?
            }
            Trigger::Schedule(_) | Trigger::Empty => vec![payload],
        };

        tracing::debug!(
            target: TRACING_TARGET_DISPATCH,
            count = payloads.len(),
            "Dispatched trigger event"
        );

        Ok(payloads)
    }
}

#[cfg(test)]
mod tests {
    use pieceflow_core::mock::{
        MockBackendUrl, MockContextStoreFactory, MockHookExecutor, MockJobQueue, MockPieceTrigger,
    };
    use pieceflow_core::{
        ErrorKind, InMemoryPieceRegistry, PieceDefinition, PieceTriggerSettings, TriggerStrategy,
    };
    use serde_json::json;
    use url::Url;

    use super::*;

    struct Fixture {
        dispatcher: TriggerDispatcher,
        trigger: MockPieceTrigger,
        context_stores: MockContextStoreFactory,
    }

    fn fixture(trigger: MockPieceTrigger) -> Fixture {
        let piece = PieceDefinition::new("github").with_trigger(Arc::new(trigger.clone()));
        let context_stores = MockContextStoreFactory::new();
        let services = TriggerServices::new(
            Arc::new(InMemoryPieceRegistry::new().with_piece(Arc::new(piece))),
            Arc::new(MockBackendUrl::new(
                Url::parse("https://api.example.com").unwrap(),
            )),
            Arc::new(context_stores.clone()),
            Arc::new(MockJobQueue::new()),
            Arc::new(MockHookExecutor::new()),
        );

        Fixture {
            dispatcher: TriggerDispatcher::new(&services),
            trigger,
            context_stores,
        }
    }

    fn flow_version(trigger: Trigger) -> FlowVersion {
        FlowVersion::new("fv1", "f1", trigger)
    }

    #[tokio::test]
    async fn test_schedule_passes_payload_through() {
        let fixture = fixture(MockPieceTrigger::new("new-star", TriggerStrategy::Webhook));
        let payload = json!({ "tick": 1 });

        let request = ExecuteTrigger::new(
            "c1",
            flow_version(Trigger::schedule("0 */5 * * * *")),
            payload.clone(),
        );
        let payloads = fixture.dispatcher.execute_trigger(request).await.unwrap();

        assert_eq!(payloads, vec![payload]);
        assert!(fixture.trigger.seen_payloads().is_empty());
    }

    #[tokio::test]
    async fn test_empty_passes_payload_through() {
        let fixture = fixture(MockPieceTrigger::new("new-star", TriggerStrategy::Webhook));

        let request = ExecuteTrigger::new("c1", flow_version(Trigger::Empty), json!("raw"));
        let payloads = fixture.dispatcher.execute_trigger(request).await.unwrap();

        assert_eq!(payloads, vec![json!("raw")]);
    }

    #[tokio::test]
    async fn test_piece_returns_run_output() {
        let output = vec![json!({ "id": 1 }), json!({ "id": 2 }), json!({ "id": 3 })];
        let fixture = fixture(
            MockPieceTrigger::new("new-star", TriggerStrategy::Webhook).with_output(output.clone()),
        );
        let payload = json!({ "stars": [1, 2, 3] });

        let request = ExecuteTrigger::new(
            "c1",
            flow_version(Trigger::piece("github", "new-star")),
            payload.clone(),
        );
        let payloads = fixture.dispatcher.execute_trigger(request).await.unwrap();

        assert_eq!(payloads, output);
        assert_eq!(fixture.trigger.seen_payloads(), vec![payload]);
    }

    #[tokio::test]
    async fn test_piece_may_return_nothing() {
        let fixture = fixture(
            MockPieceTrigger::new("new-star", TriggerStrategy::Polling).with_output(Vec::new()),
        );

        let request = ExecuteTrigger::new(
            "c1",
            flow_version(Trigger::piece("github", "new-star")),
            json!({}),
        );
        let payloads = fixture.dispatcher.execute_trigger(request).await.unwrap();

        assert!(payloads.is_empty());
    }

    #[tokio::test]
    async fn test_piece_runs_with_input_url_and_scoped_store() {
        let fixture = fixture(MockPieceTrigger::new("new-star", TriggerStrategy::Webhook));
        let collection_id = CollectionId::from("c42");

        let trigger = Trigger::Piece(
            PieceTriggerSettings::new("github", "new-star").with_input("repo", json!("acme/app")),
        );
        let request = ExecuteTrigger::new(collection_id.clone(), flow_version(trigger), json!(1));
        fixture.dispatcher.execute_trigger(request).await.unwrap();

        let contexts = fixture.trigger.run_contexts();
        assert_eq!(contexts.len(), 1);
        let context = &contexts[0];
        assert_eq!(context.props_value.get("repo"), Some(&json!("acme/app")));
        assert_eq!(
            context.webhook_url.as_str(),
            "https://api.example.com/v1/webhooks?flowId=f1"
        );
        assert_eq!(context.payload, Some(json!(1)));

        // The piece writes into the store of its own collection only.
        context.store.put("cursor", json!(7)).await.unwrap();
        let scoped = fixture.context_stores.store(&collection_id).unwrap();
        assert_eq!(scoped.values().get("cursor"), Some(&json!(7)));
        assert!(fixture.context_stores.store(&CollectionId::from("c1")).is_none());
    }

    #[tokio::test]
    async fn test_unknown_piece_fails() {
        let fixture = fixture(MockPieceTrigger::new("new-star", TriggerStrategy::Webhook));

        let request = ExecuteTrigger::new(
            "c1",
            flow_version(Trigger::piece("gitlab", "new-star")),
            json!({}),
        );
        let error = fixture.dispatcher.execute_trigger(request).await.unwrap_err();

        assert_eq!(error.kind, ErrorKind::PieceNotFound);
        assert!(fixture.trigger.seen_payloads().is_empty());
    }

    #[test]
    fn test_request_from_json() {
        let request: ExecuteTrigger = serde_json::from_value(json!({
            "collectionId": "c1",
            "flowVersion": {
                "id": "fv1",
                "flowId": "f1",
                "trigger": { "type": "EMPTY" }
            },
            "payload": { "hello": "world" }
        }))
        .unwrap();

        assert_eq!(request.collection_id.as_str(), "c1");
        assert_eq!(request.flow_version.trigger, Trigger::Empty);
    }
}
