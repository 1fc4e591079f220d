//! Piece trigger resolution.

use std::fmt;
use std::sync::Arc;

use pieceflow_core::{Error, PieceRegistry, PieceTrigger, PieceTriggerSettings, Result};

use crate::TRACING_TARGET_RESOLVER;

/// Resolves piece trigger references to implementations.
///
/// Resolution is a pure lookup with no side effects. Unknown pieces and
/// triggers are terminal errors.
#[derive(Clone)]
pub struct StrategyResolver {
    registry: Arc<dyn PieceRegistry>,
}

impl fmt::Debug for StrategyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyResolver").finish_non_exhaustive()
    }
}

impl StrategyResolver {
    /// Creates a resolver over `registry`.
    pub fn new(registry: Arc<dyn PieceRegistry>) -> Self {
        Self { registry }
    }

    /// Resolves the trigger referenced by piece trigger settings.
    pub fn resolve_settings(&self, settings: &PieceTriggerSettings) -> Result<Arc<dyn PieceTrigger>> {
        self.resolve(&settings.piece_name, &settings.trigger_name)
    }

    /// Resolves `trigger_name` on the piece named `piece_name`.
    ///
    /// # Errors
    ///
    /// Fails with `PieceNotFound` if the piece is not registered and with
    /// `TriggerNotFound` if the piece has no such trigger.
    pub fn resolve(&self, piece_name: &str, trigger_name: &str) -> Result<Arc<dyn PieceTrigger>> {
        if piece_name.is_empty() {
            return Err(Error::piece_not_found(piece_name));
        }

        let piece = self
            .registry
            .find_piece(piece_name)
            .ok_or_else(|| Error::piece_not_found(piece_name))?;

        if trigger_name.is_empty() {
            return Err(Error::trigger_not_found(piece_name, trigger_name));
        }

        let trigger = piece
            .trigger(trigger_name)
            .ok_or_else(|| Error::trigger_not_found(piece_name, trigger_name))?;

        tracing::debug!(
            target: TRACING_TARGET_RESOLVER,
            piece = piece_name,
            trigger = trigger_name,
            strategy = %trigger.strategy(),
            "Resolved piece trigger"
        );

        Ok(trigger)
    }
}

#[cfg(test)]
mod tests {
    use pieceflow_core::mock::MockPieceTrigger;
    use pieceflow_core::{ErrorKind, InMemoryPieceRegistry, PieceDefinition, TriggerStrategy};

    use super::*;

    fn resolver() -> StrategyResolver {
        let piece = PieceDefinition::new("slack").with_trigger(Arc::new(MockPieceTrigger::new(
            "new-message",
            TriggerStrategy::Polling,
        )));
        let registry = InMemoryPieceRegistry::new().with_piece(Arc::new(piece));
        StrategyResolver::new(Arc::new(registry))
    }

    #[test]
    fn test_resolve_known_trigger() {
        let trigger = resolver().resolve("slack", "new-message").unwrap();
        assert_eq!(trigger.name(), "new-message");
        assert_eq!(trigger.strategy(), TriggerStrategy::Polling);
    }

    #[test]
    fn test_unknown_piece() {
        let error = resolver().resolve("discord", "new-message").err().unwrap();
        assert_eq!(error.kind, ErrorKind::PieceNotFound);
    }

    #[test]
    fn test_unknown_trigger() {
        let error = resolver().resolve("slack", "new-reaction").err().unwrap();
        assert_eq!(error.kind, ErrorKind::TriggerNotFound);
    }

    #[test]
    fn test_empty_names() {
        let resolver = resolver();
        assert_eq!(
            resolver.resolve("", "new-message").err().unwrap().kind,
            ErrorKind::PieceNotFound
        );
        assert_eq!(
            resolver.resolve("slack", "").err().unwrap().kind,
            ErrorKind::TriggerNotFound
        );
    }

    #[test]
    fn test_resolve_settings() {
        let settings = PieceTriggerSettings::new("slack", "new-message");
        assert!(resolver().resolve_settings(&settings).is_ok());
    }
}
