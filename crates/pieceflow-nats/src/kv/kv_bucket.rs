//! Key-value bucket configuration traits.

use std::time::Duration;

/// Marker trait for KV bucket configuration.
pub trait KvBucket: Clone + Send + Sync + 'static {
    /// Bucket name used in NATS KV.
    const NAME: &'static str;

    /// Human-readable description for the bucket.
    const DESCRIPTION: &'static str;

    /// Default TTL for entries in this bucket.
    /// Returns `None` for buckets where entries should not expire.
    const TTL: Option<Duration>;

    /// Number of historical revisions kept per key.
    const HISTORY: i64 = 1;
}

/// Bucket holding one recurring job registration per flow version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RecurringJobsBucket;

impl KvBucket for RecurringJobsBucket {
    const NAME: &'static str = "recurring_jobs";
    const DESCRIPTION: &'static str = "Recurring flow jobs keyed by flow version";
    const TTL: Option<Duration> = None;
}

/// Bucket holding piece trigger state, partitioned by collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TriggerContextBucket;

impl KvBucket for TriggerContextBucket {
    const NAME: &'static str = "trigger_context";
    const DESCRIPTION: &'static str = "Piece trigger context scoped by collection";
    const TTL: Option<Duration> = None;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recurring_jobs_bucket() {
        assert_eq!(RecurringJobsBucket::NAME, "recurring_jobs");
        assert_eq!(RecurringJobsBucket::TTL, None);
        assert_eq!(RecurringJobsBucket::HISTORY, 1);
    }

    #[test]
    fn test_trigger_context_bucket() {
        assert_eq!(TriggerContextBucket::NAME, "trigger_context");
        assert_eq!(TriggerContextBucket::TTL, None);
    }
}
