//! Bounded retry with exponential backoff around backend calls.
//!
//! Each chunk call walks an explicit state machine so the retry ceiling is
//! enforced structurally: `max_retries + 1` attempts total, then the call
//! fails for good and the chunk is reported unanalyzed.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use deckaudit_common::config::AuditConfig;

use crate::backend::EngineError;

/// Where one backend call currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallState {
    Pending,
    Retrying { attempt: u32, delay: Duration },
    Succeeded,
    FailedTransient,
    FailedFatal,
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(cfg: &AuditConfig) -> Self {
        Self {
            max_retries: cfg.max_retries,
            base_delay: Duration::from_millis(cfg.retry_base_delay_ms),
            max_delay: Duration::from_millis(cfg.retry_max_delay_ms),
        }
    }

    /// Backoff before retry `attempt` (1-based): base * 2^(attempt-1),
    /// capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        let delay = self.base_delay.saturating_mul(factor.min(u32::MAX as u64) as u32);
        delay.min(self.max_delay)
    }
}

/// Drive one backend call through the retry state machine. `op` is invoked
/// at most `max_retries + 1` times; fatal errors and cancellation short-
/// circuit immediately.
pub async fn run_with_retry<F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<String, EngineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String, EngineError>>,
{
    let mut state = CallState::Pending;
    let mut attempt = 0u32;

    loop {
        if let CallState::Retrying { attempt, delay } = &state {
            debug!(call = label, attempt, ?delay, "backing off before retry");
            tokio::time::sleep(*delay).await;
        }

        attempt += 1;
        match op().await {
            Ok(text) => {
                state = CallState::Succeeded;
                debug!(call = label, attempt, ?state, "backend call succeeded");
                return Ok(text);
            }
            Err(e) if !e.is_transient() => {
                state = CallState::FailedFatal;
                warn!(call = label, attempt, ?state, error = %e, "backend call failed fatally");
                return Err(e);
            }
            Err(e) if attempt > policy.max_retries => {
                state = CallState::FailedTransient;
                warn!(
                    call = label,
                    attempts = attempt,
                    ?state,
                    error = %e,
                    "retry budget exhausted"
                );
                return Err(e);
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                warn!(call = label, attempt, error = %e, "transient backend error, will retry");
                state = CallState::Retrying { attempt, delay };
            }
        }
    }
}
