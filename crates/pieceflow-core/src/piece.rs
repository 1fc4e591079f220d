//! Piece capability lookup.
//!
//! Pieces are pluggable integrations. The trigger core never loads them; it
//! only asks a [`PieceRegistry`] for a trigger implementation by name and
//! talks to it through [`PieceTrigger`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display};
use url::Url;

use crate::Result;
use crate::store::ContextStore;

/// How a piece trigger receives events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerStrategy {
    /// The source system pushes events to the backend's webhook URL.
    Webhook,
    /// The scheduler re-invokes the flow and the piece pulls events.
    Polling,
}

/// Arguments handed to a piece trigger's enable/disable hooks.
#[derive(Clone)]
pub struct TriggerHookContext {
    /// Key-value store scoped to the trigger instance.
    pub store: Arc<dyn ContextStore>,
    /// Callback URL the source system should push events to.
    pub webhook_url: Url,
    /// User-configured trigger properties.
    pub props_value: Map<String, Value>,
}

impl fmt::Debug for TriggerHookContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerHookContext")
            .field("webhook_url", &self.webhook_url.as_str())
            .field("props_value", &self.props_value)
            .finish_non_exhaustive()
    }
}

/// Arguments handed to a piece trigger's `run`.
#[derive(Clone)]
pub struct TriggerRunContext {
    /// Key-value store scoped to the trigger instance.
    pub store: Arc<dyn ContextStore>,
    /// Callback URL of the flow.
    pub webhook_url: Url,
    /// User-configured trigger properties.
    pub props_value: Map<String, Value>,
    /// Raw inbound event.
    pub payload: Value,
}

impl fmt::Debug for TriggerRunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerRunContext")
            .field("webhook_url", &self.webhook_url.as_str())
            .field("props_value", &self.props_value)
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}

/// A trigger implementation supplied by a piece.
#[async_trait::async_trait]
pub trait PieceTrigger: Send + Sync {
    /// Trigger name, unique within its piece.
    fn name(&self) -> &str;

    /// How this trigger receives events.
    fn strategy(&self) -> TriggerStrategy;

    /// Extracts flow-run payloads from one raw event.
    ///
    /// May return zero, one or many payloads.
    async fn run(&self, context: TriggerRunContext) -> Result<Vec<Value>>;

    /// Called when the trigger is enabled. Webhook triggers subscribe here.
    async fn on_enable(&self, _context: TriggerHookContext) -> Result<()> {
        Ok(())
    }

    /// Called when the trigger is disabled. Webhook triggers unsubscribe here.
    async fn on_disable(&self, _context: TriggerHookContext) -> Result<()> {
        Ok(())
    }
}

/// A pluggable integration exposing triggers by name.
pub trait Piece: Send + Sync {
    /// Piece name, unique within the registry.
    fn name(&self) -> &str;

    /// Looks up a trigger on this piece.
    fn trigger(&self, trigger_name: &str) -> Option<Arc<dyn PieceTrigger>>;
}

/// Capability lookup mapping piece names to implementations.
pub trait PieceRegistry: Send + Sync {
    /// Looks up a piece by name.
    fn find_piece(&self, piece_name: &str) -> Option<Arc<dyn Piece>>;
}

/// A piece assembled from trigger implementations.
#[derive(Clone, Default)]
pub struct PieceDefinition {
    name: String,
    triggers: HashMap<String, Arc<dyn PieceTrigger>>,
}

impl PieceDefinition {
    /// Creates a piece without triggers.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            triggers: HashMap::new(),
        }
    }

    /// Adds a trigger, keyed by its own name.
    pub fn with_trigger(mut self, trigger: Arc<dyn PieceTrigger>) -> Self {
        self.triggers.insert(trigger.name().to_owned(), trigger);
        self
    }
}

impl fmt::Debug for PieceDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut triggers: Vec<&str> = self.triggers.keys().map(String::as_str).collect();
        triggers.sort_unstable();
        f.debug_struct("PieceDefinition")
            .field("name", &self.name)
            .field("triggers", &triggers)
            .finish()
    }
}

impl Piece for PieceDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn trigger(&self, trigger_name: &str) -> Option<Arc<dyn PieceTrigger>> {
        self.triggers.get(trigger_name).cloned()
    }
}

/// In-memory piece registry.
#[derive(Clone, Default)]
pub struct InMemoryPieceRegistry {
    pieces: HashMap<String, Arc<dyn Piece>>,
}

impl InMemoryPieceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a piece, replacing any piece with the same name.
    pub fn register(&mut self, piece: Arc<dyn Piece>) {
        self.pieces.insert(piece.name().to_owned(), piece);
    }

    /// Registers a piece and returns the registry.
    pub fn with_piece(mut self, piece: Arc<dyn Piece>) -> Self {
        self.register(piece);
        self
    }

    /// Returns the number of registered pieces.
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    /// Returns `true` if no piece is registered.
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }
}

impl fmt::Debug for InMemoryPieceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pieces: Vec<&str> = self.pieces.keys().map(String::as_str).collect();
        pieces.sort_unstable();
        f.debug_struct("InMemoryPieceRegistry")
            .field("pieces", &pieces)
            .finish()
    }
}

impl PieceRegistry for InMemoryPieceRegistry {
    fn find_piece(&self, piece_name: &str) -> Option<Arc<dyn Piece>> {
        self.pieces.get(piece_name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTrigger;

    #[async_trait::async_trait]
    impl PieceTrigger for EchoTrigger {
        fn name(&self) -> &str {
            "echo"
        }

        fn strategy(&self) -> TriggerStrategy {
            TriggerStrategy::Webhook
        }

        async fn run(&self, context: TriggerRunContext) -> Result<Vec<Value>> {
            Ok(vec![context.payload])
        }
    }

    #[test]
    fn test_registry_lookup() {
        let piece = PieceDefinition::new("http").with_trigger(Arc::new(EchoTrigger));
        let registry = InMemoryPieceRegistry::new().with_piece(Arc::new(piece));

        let found = registry.find_piece("http").expect("piece registered");
        assert_eq!(found.name(), "http");
        assert!(found.trigger("echo").is_some());
        assert!(found.trigger("missing").is_none());
        assert!(registry.find_piece("slack").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_strategy_strings() {
        assert_eq!(TriggerStrategy::Webhook.to_string(), "WEBHOOK");
        assert_eq!(TriggerStrategy::Polling.as_ref(), "POLLING");
    }
}
