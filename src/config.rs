//! Engine-level tunables.
//!
//! This is deliberately narrow: broker/store DSNs, CLI parsing, and service
//! bootstrap remain external concerns. What lives here are the handful of
//! knobs the execution engine itself consults.

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable was present but failed to parse.
    #[error("invalid configuration value for {key}: {value}")]
    InvalidValue {
        /// Name of the offending environment variable.
        key: String,
        /// Raw value that failed to parse.
        value: String,
    },
}

/// Engine-level configuration, loaded from environment variables with
/// typed defaults.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Prefix used when a `RemoteStep`'s request needs a reply topic
    /// derived from the saga id.
    pub reply_topic_prefix: String,
    /// Whether a failed step-rollback during a saga-level compensation
    /// walk logs the step's raw snapshot at `warn` level for debugging.
    pub rollback_log_sample_on_failure: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reply_topic_prefix: "saga-reply".to_string(),
            rollback_log_sample_on_failure: true,
        }
    }
}

impl EngineConfig {
    /// Loads configuration from the process environment, falling back to
    /// defaults for any variable that is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("SAGA_REPLY_TOPIC_PREFIX") {
            config.reply_topic_prefix = value;
        }

        if let Ok(value) = std::env::var("SAGA_ROLLBACK_LOG_SAMPLE_ON_FAILURE") {
            config.rollback_log_sample_on_failure = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: "SAGA_ROLLBACK_LOG_SAMPLE_ON_FAILURE".to_string(),
                value,
            })?;
        }

        Ok(config)
    }

    /// Derives the reply topic for `saga_id` under the configured prefix.
    pub fn reply_topic(&self, saga_id: uuid::Uuid) -> String {
        format!("{}-{}", self.reply_topic_prefix, saga_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reply_topic_prefix() {
        let config = EngineConfig::default();
        assert_eq!(config.reply_topic_prefix, "saga-reply");
    }
}
