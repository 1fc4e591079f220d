//! Trigger lifecycle configuration.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default cadence of polling jobs: every fifteen minutes.
pub const DEFAULT_POLLING_CRON: &str = "* 15 * * * *";

/// Configuration for trigger registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct TriggerConfig {
    /// Cron expression polling triggers are re-invoked on
    #[cfg_attr(
        feature = "config",
        arg(long = "polling-cron", env = "TRIGGER_POLLING_CRON")
    )]
    #[serde(default)]
    pub polling_cron: Option<String>,
}

impl TriggerConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the polling cron expression, using the default if not set.
    #[inline]
    #[must_use]
    pub fn polling_cron(&self) -> &str {
        self.polling_cron.as_deref().unwrap_or(DEFAULT_POLLING_CRON)
    }

    /// Set the polling cron expression.
    #[must_use]
    pub fn with_polling_cron(mut self, cron_expression: impl Into<String>) -> Self {
        self.polling_cron = Some(cron_expression.into());
        self
    }

    /// Validate the configuration and return any issues.
    pub fn validate(&self) -> Result<(), String> {
        let fields = self.polling_cron().split_whitespace().count();
        if !(5..=7).contains(&fields) {
            return Err(format!(
                "Polling cron expression must have 5 to 7 fields, got {fields}: '{}'",
                self.polling_cron()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TriggerConfig::new();
        assert_eq!(config.polling_cron(), "* 15 * * * *");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = TriggerConfig::new().with_polling_cron("0 */5 * * * *");
        assert_eq!(config.polling_cron(), "0 */5 * * * *");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert!(TriggerConfig::new().with_polling_cron("").validate().is_err());
        assert!(TriggerConfig::new().with_polling_cron("* *").validate().is_err());
        assert!(TriggerConfig::new().with_polling_cron("*/5 * * * *").validate().is_ok());
    }

    #[test]
    fn test_deserialize_missing_fields() {
        let config: TriggerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.polling_cron(), DEFAULT_POLLING_CRON);
    }
}
