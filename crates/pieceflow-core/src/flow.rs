//! Flow versions and their triggers.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString};

use crate::ids::{CollectionId, CollectionVersionId, FlowId, FlowVersionId, UserId};

/// One immutable snapshot of a flow.
///
/// Edits produce a new version; the trigger core only ever reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowVersion {
    /// Identity of this version.
    pub id: FlowVersionId,
    /// Identity of the flow this version belongs to.
    pub flow_id: FlowId,
    /// Human-readable name shown in the builder.
    #[serde(default)]
    pub display_name: String,
    /// The single event source that starts runs of this version.
    pub trigger: Trigger,
    /// The user who last edited this version, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<UserId>,
}

impl FlowVersion {
    /// Creates a new flow version with the given trigger.
    pub fn new(id: impl Into<FlowVersionId>, flow_id: impl Into<FlowId>, trigger: Trigger) -> Self {
        Self {
            id: id.into(),
            flow_id: flow_id.into(),
            display_name: String::new(),
            trigger,
            updated_by: None,
        }
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Sets the last editor.
    pub fn with_updated_by(mut self, user_id: impl Into<UserId>) -> Self {
        self.updated_by = Some(user_id.into());
        self
    }
}

/// The event source of a flow version.
///
/// Serialized as `{"type": "PIECE" | "SCHEDULE" | "EMPTY", "settings": {...}}`.
/// Settings stored on an `EMPTY` trigger are accepted and dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "settings", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trigger {
    /// Fired by an integration piece, by webhook or by polling.
    Piece(PieceTriggerSettings),
    /// Fired by a cron schedule.
    Schedule(ScheduleTriggerSettings),
    /// Passthrough trigger with no registration side effects.
    Empty,
}

impl Trigger {
    /// Creates a piece trigger without configured input.
    pub fn piece(piece_name: impl Into<String>, trigger_name: impl Into<String>) -> Self {
        Self::Piece(PieceTriggerSettings::new(piece_name, trigger_name))
    }

    /// Creates a schedule trigger for the given cron expression.
    pub fn schedule(cron_expression: impl Into<String>) -> Self {
        Self::Schedule(ScheduleTriggerSettings {
            cron_expression: cron_expression.into(),
        })
    }

    /// Returns the tag of this trigger.
    pub fn trigger_type(&self) -> TriggerType {
        match self {
            Self::Piece(_) => TriggerType::Piece,
            Self::Schedule(_) => TriggerType::Schedule,
            Self::Empty => TriggerType::Empty,
        }
    }
}

/// Wire form of [`Trigger`] that tolerates any `settings` on `EMPTY`.
#[derive(Deserialize)]
#[serde(tag = "type", content = "settings", rename_all = "SCREAMING_SNAKE_CASE")]
enum TriggerRepr {
    Piece(PieceTriggerSettings),
    Schedule(ScheduleTriggerSettings),
    Empty(Option<Value>),
}

impl<'de> Deserialize<'de> for Trigger {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match TriggerRepr::deserialize(deserializer)? {
            TriggerRepr::Piece(settings) => Self::Piece(settings),
            TriggerRepr::Schedule(settings) => Self::Schedule(settings),
            TriggerRepr::Empty(_) => Self::Empty,
        })
    }
}

/// Settings of a piece trigger.
///
/// The trigger strategy is not stored here; it is defined by the piece
/// implementation the names resolve to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceTriggerSettings {
    /// Name of the piece in the registry.
    pub piece_name: String,
    /// Name of the trigger on that piece.
    pub trigger_name: String,
    /// User-configured trigger properties.
    #[serde(default)]
    pub input: Map<String, Value>,
}

impl PieceTriggerSettings {
    /// Creates settings with empty input.
    pub fn new(piece_name: impl Into<String>, trigger_name: impl Into<String>) -> Self {
        Self {
            piece_name: piece_name.into(),
            trigger_name: trigger_name.into(),
            input: Map::new(),
        }
    }

    /// Sets one input property.
    pub fn with_input(mut self, key: impl Into<String>, value: Value) -> Self {
        self.input.insert(key.into(), value);
        self
    }
}

/// Settings of a schedule trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleTriggerSettings {
    /// Cron expression the flow runs on.
    pub cron_expression: String,
}

/// Tag of a [`Trigger`], as carried in recurring job payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    Piece,
    Schedule,
    Empty,
}

/// Environment a flow run executes in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RunEnvironment {
    #[default]
    Production,
    Testing,
}

/// A published version of a collection, forwarded opaquely to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionVersion {
    /// Identity of this collection version.
    pub id: CollectionVersionId,
    /// Identity of the collection.
    pub collection_id: CollectionId,
    /// Human-readable name.
    #[serde(default)]
    pub display_name: String,
}

impl CollectionVersion {
    /// Creates a collection version with an empty display name.
    pub fn new(id: impl Into<CollectionVersionId>, collection_id: impl Into<CollectionId>) -> Self {
        Self {
            id: id.into(),
            collection_id: collection_id.into(),
            display_name: String::new(),
        }
    }
}
