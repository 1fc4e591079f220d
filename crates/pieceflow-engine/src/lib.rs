#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod backend;
mod client;
mod config;
mod error;

pub use backend::{BackendUrlConfig, DEFAULT_BACKEND_PORT, DEFAULT_IP_DISCOVERY_URL, PublicIpBackendUrl};
pub use client::{EngineClient, TRIGGER_HOOKS_PATH};
pub use config::{DEFAULT_TIMEOUT_SECS, EngineConfig};
pub use error::{Error, Result};

/// Tracing target for engine client operations.
pub const TRACING_TARGET: &str = "pieceflow_engine::client";

/// Tracing target for backend URL discovery.
pub const TRACING_TARGET_BACKEND: &str = "pieceflow_engine::backend";
