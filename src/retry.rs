use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LLMError, PipelineError};

/// Bounded retries around a single stage call. `max` counts retries, not
/// attempts, so the default of zero issues exactly one request per stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default)]
    pub max: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_ms: Option<u64>,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(max: u32) -> Self {
        Self {
            max,
            backoff_ms: None,
        }
    }

    pub fn with_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.backoff_ms = Some(backoff_ms);
        self
    }

    pub fn attempts(&self) -> u32 {
        self.max.saturating_add(1)
    }

    /// Linear backoff: the n-th retry waits `n * backoff_ms`.
    pub fn delay(&self, retry: u32) -> Option<Duration> {
        self.backoff_ms
            .filter(|ms| *ms > 0)
            .map(|ms| Duration::from_millis(ms.saturating_mul(u64::from(retry))))
    }

    pub fn should_retry(&self, attempt: u32, error: &PipelineError) -> bool {
        attempt < self.attempts() && is_transient(error)
    }
}

fn is_transient(error: &PipelineError) -> bool {
    match error {
        PipelineError::Timeout { .. } => true,
        PipelineError::Backend { source, .. } => {
            matches!(source, LLMError::Http(_) | LLMError::Provider(_))
        }
        PipelineError::NoStages | PipelineError::Template { .. } => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_failure() -> PipelineError {
        PipelineError::Backend {
            stage: "plan".to_string(),
            source: LLMError::Provider("connection refused".to_string()),
        }
    }

    #[test]
    fn default_policy_never_retries() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts(), 1);
        assert!(!policy.should_retry(1, &provider_failure()));
    }

    #[test]
    fn retries_transient_failures_up_to_max() {
        let policy = RetryPolicy::new(2);
        assert!(policy.should_retry(1, &provider_failure()));
        assert!(policy.should_retry(2, &provider_failure()));
        assert!(!policy.should_retry(3, &provider_failure()));
    }

    #[test]
    fn malformed_responses_are_not_retried() {
        let error = PipelineError::Backend {
            stage: "plan".to_string(),
            source: LLMError::InvalidResponse("response did not contain any choices"),
        };
        assert!(!RetryPolicy::new(5).should_retry(1, &error));
    }

    #[test]
    fn backoff_grows_linearly() {
        let policy = RetryPolicy::new(3).with_backoff_ms(250);
        assert_eq!(policy.delay(1), Some(Duration::from_millis(250)));
        assert_eq!(policy.delay(3), Some(Duration::from_millis(750)));
        assert_eq!(RetryPolicy::new(3).delay(1), None);
    }

    #[test]
    fn parses_from_yaml() {
        let policy: RetryPolicy = serde_yaml::from_str("max: 2\nbackoff_ms: 500\n").unwrap();
        assert_eq!(policy, RetryPolicy::new(2).with_backoff_ms(500));
    }
}
