#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;

pub mod backend;
pub mod engine;
pub mod flow;
pub mod ids;
pub mod piece;
pub mod queue;
pub mod store;

#[cfg(feature = "test-utils")]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;

pub use backend::{BackendUrlProvider, StaticBackendUrl};
pub use engine::{TriggerHookExecutor, TriggerHookRequest, TriggerHookType};
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use flow::{
    CollectionVersion, FlowVersion, PieceTriggerSettings, RunEnvironment, ScheduleTriggerSettings,
    Trigger, TriggerType,
};
pub use ids::{CollectionId, CollectionVersionId, FlowId, FlowVersionId, ProjectId, UserId};
pub use piece::{
    InMemoryPieceRegistry, Piece, PieceDefinition, PieceRegistry, PieceTrigger,
    TriggerHookContext, TriggerRunContext, TriggerStrategy,
};
pub use queue::{FlowJobData, RecurringJob, RecurringJobQueue};
pub use store::{ContextStore, ContextStoreFactory};
