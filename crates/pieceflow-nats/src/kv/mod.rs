//! NATS Key-Value store operations.
//!
//! This module provides type-safe abstractions over NATS KV:
//! - `KvStore<K, V, B>`: Generic type-safe key-value operations
//! - `KvKey`: Trait for key types
//! - `KvBucket`: Trait for bucket configuration
//!
//! # Example
//!
//! ```ignore
//! let jobs: KvStore<JobKey, RecurringJob, RecurringJobsBucket> =
//!     KvStore::open(&jetstream).await?;
//!
//! jobs.put(&key, &job).await?;
//! let job = jobs.get(&key).await?;
//! ```

mod kv_bucket;
mod kv_key;
mod kv_store;

pub use kv_bucket::{KvBucket, RecurringJobsBucket, TriggerContextBucket};
pub use kv_key::{ContextKey, JobKey, KvKey, is_valid_key};
pub use kv_store::KvStore;
