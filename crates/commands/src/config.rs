//! Command handler tuning.

use std::time::Duration;

use domain::{InputPolicy, TransitionPolicy};

/// Policies and retry limits applied by [`OrderService`](crate::OrderService).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandConfig {
    /// How malformed numeric input is treated.
    pub input_policy: InputPolicy,

    /// Which status changes are accepted.
    pub transition_policy: TransitionPolicy,

    /// Publish attempts per command. 1 means a single best-effort attempt.
    pub publish_max_attempts: u32,

    /// Pause between publish attempts.
    pub publish_retry_delay: Duration,

    /// Read-modify-write attempts for a status update before giving up with `Conflict`.
    pub update_max_attempts: u32,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            input_policy: InputPolicy::Strict,
            transition_policy: TransitionPolicy::Any,
            publish_max_attempts: 1,
            publish_retry_delay: Duration::from_millis(50),
            update_max_attempts: 3,
        }
    }
}

impl CommandConfig {
    pub fn with_input_policy(mut self, policy: InputPolicy) -> Self {
        self.input_policy = policy;
        self
    }

    pub fn with_transition_policy(mut self, policy: TransitionPolicy) -> Self {
        self.transition_policy = policy;
        self
    }

    pub fn with_publish_retries(mut self, max_attempts: u32, delay: Duration) -> Self {
        self.publish_max_attempts = max_attempts.max(1);
        self.publish_retry_delay = delay;
        self
    }

    pub fn with_update_max_attempts(mut self, max_attempts: u32) -> Self {
        self.update_max_attempts = max_attempts.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_preserve_single_publish_attempt() {
        let config = CommandConfig::default();
        assert_eq!(config.publish_max_attempts, 1);
        assert_eq!(config.update_max_attempts, 3);
        assert_eq!(config.input_policy, InputPolicy::Strict);
        assert_eq!(config.transition_policy, TransitionPolicy::Any);
    }

    #[test]
    fn attempt_counts_never_drop_below_one() {
        let config = CommandConfig::default()
            .with_publish_retries(0, Duration::ZERO)
            .with_update_max_attempts(0);
        assert_eq!(config.publish_max_attempts, 1);
        assert_eq!(config.update_max_attempts, 1);
    }
}
